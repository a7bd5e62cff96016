//! Quantization tables and 8x8 coefficient quantization.
//!
//! [`quantize`] fuses the zig-zag reorder, the division by the table step and
//! the rounding into one pass. The SIMD path divides and rounds in natural
//! order with AVX2 and gathers into scan order afterwards; both paths apply
//! the same IEEE operations, so their output is bit-identical.

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use archmage::{arcane, X64V3Token};
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use core::arch::x86_64::*;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use safe_unaligned_simd::x86_64 as simd_mem;

use crate::block::{lane_max, lane_min, Block8x8, Block8x8F};
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::common::dispatch::simd_token;
use crate::common::zigzag::{apply_inverse_zigzag, ZIGZAG};
use crate::error::BlockError;

/// JPEG Annex K luminance quantization table, natural order.
#[rustfmt::skip]
pub const STD_LUMA_QUANT: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// JPEG Annex K chrominance quantization table, natural order.
#[rustfmt::skip]
pub const STD_CHROMA_QUANT: [u16; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

/// 64 quantizer steps in natural order.
///
/// Every step is finite and strictly positive; the constructors reject
/// anything else, so division by a step is always defined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantTable {
    steps: [f32; 64],
}

impl QuantTable {
    /// Validates and wraps natural-order steps.
    pub fn new(steps: [f32; 64]) -> Result<Self, BlockError> {
        for (index, &value) in steps.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(BlockError::NonPositiveQuantStep { index, value });
            }
        }
        Ok(Self { steps })
    }

    /// Validates a span of exactly 64 natural-order steps.
    pub fn from_slice(steps: &[f32]) -> Result<Self, BlockError> {
        let steps = <[f32; 64]>::try_from(steps).map_err(|_| BlockError::LengthMismatch {
            expected: 64,
            actual: steps.len(),
        })?;
        Self::new(steps)
    }

    /// Integer table in natural order, e.g. [`STD_LUMA_QUANT`].
    pub fn from_u16(steps: &[u16; 64]) -> Result<Self, BlockError> {
        Self::new(steps.map(f32::from))
    }

    /// Integer table in scan order, the layout of a JPEG DQT segment.
    pub fn from_u16_scan_order(steps: &[u16; 64]) -> Result<Self, BlockError> {
        let mut natural = [0u16; 64];
        for (&step, &zig) in steps.iter().zip(ZIGZAG.iter()) {
            natural[usize::from(zig)] = step;
        }
        Self::from_u16(&natural)
    }

    /// Same step at every position.
    pub fn uniform(step: f32) -> Result<Self, BlockError> {
        Self::new([step; 64])
    }

    /// Steps in natural order.
    #[inline]
    pub fn steps(&self) -> &[f32; 64] {
        &self.steps
    }
}

pub(crate) fn quantize_scalar(block: &[f32; 64], table: &[f32; 64], dest: &mut [i16; 64]) {
    for (d, &zig) in dest.iter_mut().zip(ZIGZAG.iter()) {
        let zig = usize::from(zig);
        let q = block[zig] / table[zig];
        let q = q + if q > 0.0 { 0.5 } else { -0.5 };
        *d = lane_min(lane_max(q, -32768.0), 32767.0) as i16;
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[arcane]
fn quantize_avx2(_token: X64V3Token, block: &[f32; 64], table: &[f32; 64], dest: &mut [i16; 64]) {
    let zero = _mm256_setzero_ps();
    let half = _mm256_set1_ps(0.5);
    let neg_half = _mm256_set1_ps(-0.5);
    let lo = _mm256_set1_ps(-32768.0);
    let hi = _mm256_set1_ps(32767.0);

    let mut natural = [0i32; 64];
    for r in 0..8 {
        let x = simd_mem::_mm256_loadu_ps(<&[f32; 8]>::try_from(&block[r * 8..r * 8 + 8]).unwrap());
        let q = simd_mem::_mm256_loadu_ps(<&[f32; 8]>::try_from(&table[r * 8..r * 8 + 8]).unwrap());
        let d = _mm256_div_ps(x, q);
        let positive = _mm256_cmp_ps(d, zero, _CMP_GT_OQ);
        let d = _mm256_add_ps(d, _mm256_blendv_ps(neg_half, half, positive));
        let d = _mm256_min_ps(_mm256_max_ps(d, lo), hi);
        simd_mem::_mm256_storeu_si256(
            <&mut [i32; 8]>::try_from(&mut natural[r * 8..r * 8 + 8]).unwrap(),
            _mm256_cvttps_epi32(d),
        );
    }

    // values are already inside the i16 range
    for (d, &zig) in dest.iter_mut().zip(ZIGZAG.iter()) {
        *d = natural[usize::from(zig)] as i16;
    }
}

pub(crate) fn dequantize_scalar(coeffs: &[i16; 64], table: &[f32; 64], dest: &mut [f32; 64]) {
    for ((d, &c), &q) in dest.iter_mut().zip(coeffs.iter()).zip(table.iter()) {
        *d = f32::from(c) * q;
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[arcane]
fn dequantize_avx2(_token: X64V3Token, coeffs: &[i16; 64], table: &[f32; 64], dest: &mut [f32; 64]) {
    for r in 0..8 {
        let c = simd_mem::_mm_loadu_si128(<&[i16; 8]>::try_from(&coeffs[r * 8..r * 8 + 8]).unwrap());
        let c = _mm256_cvtepi32_ps(_mm256_cvtepi16_epi32(c));
        let q = simd_mem::_mm256_loadu_ps(<&[f32; 8]>::try_from(&table[r * 8..r * 8 + 8]).unwrap());
        simd_mem::_mm256_storeu_ps(
            <&mut [f32; 8]>::try_from(&mut dest[r * 8..r * 8 + 8]).unwrap(),
            _mm256_mul_ps(c, q),
        );
    }
}

/// Quantizes a natural-order float block into a scan-order integer block.
///
/// For scan position `i` with `zig = ZIGZAG[i]`, computes
/// `block[zig] / table[zig]`, adds 0.5 when the quotient is positive and
/// subtracts 0.5 otherwise, then truncates, saturating at the `i16` range.
pub fn quantize_into(block: &Block8x8F, dest: &mut Block8x8, table: &QuantTable) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        quantize_avx2(token, block.as_array(), &table.steps, dest.as_mut_array());
        return;
    }
    quantize_scalar(block.as_array(), &table.steps, dest.as_mut_array());
}

/// [`quantize_into`] a new block.
pub fn quantize(block: &Block8x8F, table: &QuantTable) -> Block8x8 {
    let mut dest = Block8x8::default();
    quantize_into(block, &mut dest, table);
    dest
}

/// Multiplies each natural-order coefficient by its step.
pub fn dequantize(coeffs: &Block8x8, table: &QuantTable) -> Block8x8F {
    let mut dest = Block8x8F::default();
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        dequantize_avx2(token, coeffs.as_array(), &table.steps, dest.as_mut_array());
        return dest;
    }
    dequantize_scalar(coeffs.as_array(), &table.steps, dest.as_mut_array());
    dest
}

/// Inverse of [`quantize`]: takes a scan-order block, restores natural order
/// and multiplies by the steps.
pub fn dequantize_zigzag(coeffs: &Block8x8, table: &QuantTable) -> Block8x8F {
    dequantize(&apply_inverse_zigzag(coeffs), table)
}
