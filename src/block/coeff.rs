//! Significance scan and comparisons on integer coefficient blocks.

use super::Block8x8;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use super::simd_avx;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::common::dispatch::simd_token;

/// Bit `i` set when `data[i] != 0`.
pub(crate) fn nonzero_mask_i16_scalar(data: &[i16; 64]) -> u64 {
    data.iter()
        .enumerate()
        .fold(0u64, |mask, (i, &v)| mask | (u64::from(v != 0) << i))
}

pub(crate) fn equals_i16_scalar(data: &[i16; 64], value: i16) -> bool {
    data.iter().all(|&v| v == value)
}

impl Block8x8 {
    /// Highest scan position holding a non-zero coefficient, or -1 if the
    /// block is all zero.
    ///
    /// The block is expected in scan order, as produced by
    /// [`quantize`](crate::quantize). The entropy coder uses the result to
    /// drop the trailing run of zeros.
    pub fn last_significant_index(&self) -> i32 {
        let mask = self.nonzero_mask();
        if mask == 0 {
            -1
        } else {
            63 - mask.leading_zeros() as i32
        }
    }

    /// Number of non-zero coefficients.
    pub fn count_nonzero(&self) -> u32 {
        self.nonzero_mask().count_ones()
    }

    fn nonzero_mask(&self) -> u64 {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            return simd_avx::nonzero_mask_i16_avx2(token, &self.data);
        }
        nonzero_mask_i16_scalar(&self.data)
    }

    /// True if every coefficient equals `value`.
    pub fn equals_scalar(&self, value: i16) -> bool {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            return simd_avx::equals_i16_avx2(token, &self.data, value);
        }
        equals_i16_scalar(&self.data, value)
    }
}
