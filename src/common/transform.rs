//! 4x4 integer transforms (VP8 style).
//!
//! The inverse transform adds its output onto an existing prediction and
//! clamps to `[0, 255]`. It uses only integer multiplies by two 16-bit fixed
//! point constants, adds and shifts, so its output is exactly reproducible.

use crate::block::Block4x4;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::common::dispatch::simd_token;
use crate::error::{check_region, BlockError};

/// 16 bit fixed point version of cos(PI/8) * sqrt(2) - 1
pub(crate) const CONST1: i32 = 20091;
/// 16 bit fixed point version of sin(PI/8) * sqrt(2)
pub(crate) const CONST2: i32 = 35468;

/// Byte stride of the scratch buffers WebP codecs transform into.
pub const BPS: usize = 32;

// Products wrap at 32 bits; the SIMD path multiplies with `pmulld`, which
// wraps the same way, so the two agree even for out-of-range coefficients.
#[inline(always)]
fn mul1(a: i32) -> i32 {
    (a.wrapping_mul(CONST1) >> 16) + a
}

#[inline(always)]
fn mul2(a: i32) -> i32 {
    a.wrapping_mul(CONST2) >> 16
}

#[inline(always)]
fn clip_8b(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Scalar inverse transform of one 4x4 block added onto `dst`.
pub(crate) fn transform_one_scalar(src: &[i16; 16], dst: &mut [u8], stride: usize) {
    // Perform one length check up front to avoid subsequent bounds checks in this function
    assert!(dst.len() >= 3 * stride + 4);

    // vertical pass; column i lands in tmp[4 * i..4 * i + 4]
    let mut tmp = [0i32; 16];
    for i in 0..4 {
        let in0 = i32::from(src[i]);
        let in1 = i32::from(src[4 + i]);
        let in2 = i32::from(src[8 + i]);
        let in3 = i32::from(src[12 + i]);
        let a = in0 + in2;
        let b = in0 - in2;
        let c = mul2(in1) - mul1(in3);
        let d = mul1(in1) + mul2(in3);
        tmp[4 * i] = a + d;
        tmp[4 * i + 1] = b + c;
        tmp[4 * i + 2] = b - c;
        tmp[4 * i + 3] = a - d;
    }

    // horizontal pass; row i reads tmp[i], tmp[4 + i], tmp[8 + i], tmp[12 + i]
    for i in 0..4 {
        let dc = tmp[i] + 4;
        let a = dc + tmp[8 + i];
        let b = dc - tmp[8 + i];
        let c = mul2(tmp[4 + i]) - mul1(tmp[12 + i]);
        let d = mul1(tmp[4 + i]) + mul2(tmp[12 + i]);
        let row = &mut dst[i * stride..i * stride + 4];
        row[0] = clip_8b(i32::from(row[0]) + ((a + d) >> 3));
        row[1] = clip_8b(i32::from(row[1]) + ((b + c) >> 3));
        row[2] = clip_8b(i32::from(row[2]) + ((b - c) >> 3));
        row[3] = clip_8b(i32::from(row[3]) + ((a - d) >> 3));
    }
}

/// Inverse transforms `src` and adds it onto the 4x4 region at the start of
/// `dst`, clamping to `[0, 255]`.
///
/// # Panics
///
/// If `dst` is shorter than `3 * stride + 4`.
#[inline]
pub fn transform_one(src: &[i16; 16], dst: &mut [u8], stride: usize) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        super::transform_simd_intrinsics::transform_one_sse41(token, src, dst, stride);
        return;
    }
    transform_one_scalar(src, dst, stride);
}

/// [`transform_one`] on two horizontally adjacent blocks: `src[..16]` at
/// column 0 and `src[16..]` at column 4.
///
/// # Panics
///
/// If `dst` is shorter than `3 * stride + 8`.
pub fn transform_two(src: &[i16; 32], dst: &mut [u8], stride: usize) {
    assert!(dst.len() >= 3 * stride + 8);
    let (first, second) = split_pair(src);
    transform_one(first, dst, stride);
    transform_one(second, &mut dst[4..], stride);
}

fn split_pair(src: &[i16; 32]) -> (&[i16; 16], &[i16; 16]) {
    let (first, second) = src.split_at(16);
    // split_at(16) on 32 elements yields two 16-element halves
    (
        <&[i16; 16]>::try_from(first).unwrap(),
        <&[i16; 16]>::try_from(second).unwrap(),
    )
}

/// Checked [`transform_one`].
pub fn try_transform_one(src: &[i16; 16], dst: &mut [u8], stride: usize) -> Result<(), BlockError> {
    check_region(dst.len(), 4, 4, stride)?;
    transform_one(src, dst, stride);
    Ok(())
}

/// Checked [`transform_two`].
pub fn try_transform_two(src: &[i16; 32], dst: &mut [u8], stride: usize) -> Result<(), BlockError> {
    check_region(dst.len(), 4, 8, stride)?;
    transform_two(src, dst, stride);
    Ok(())
}

/// Fast path for a block whose only non-zero coefficient is DC.
///
/// Adds `(dc + 4) >> 3` to every sample, which is exactly what
/// [`transform_one`] produces when all AC coefficients are zero.
pub fn transform_dc_only(dc: i16, dst: &mut [u8], stride: usize) {
    assert!(dst.len() >= 3 * stride + 4);
    let delta = (i32::from(dc) + 4) >> 3;
    for y in 0..4 {
        for v in &mut dst[y * stride..y * stride + 4] {
            *v = clip_8b(i32::from(*v) + delta);
        }
    }
}

/// Forward transform of the residual `src - pred` over a 4x4 region.
///
/// Both regions share `stride`. The result feeds quantization and, after
/// dequantization, [`transform_one`] reconstructs the residual to within
/// one unit.
///
/// # Panics
///
/// If either region is shorter than `3 * stride + 4`.
pub fn forward_transform(src: &[u8], pred: &[u8], stride: usize) -> Block4x4 {
    assert!(src.len() >= 3 * stride + 4 && pred.len() >= 3 * stride + 4);
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        return super::transform_simd_intrinsics::forward_transform_sse41(token, src, pred, stride);
    }
    forward_transform_scalar(src, pred, stride)
}

/// Scalar [`forward_transform`].
pub(crate) fn forward_transform_scalar(src: &[u8], pred: &[u8], stride: usize) -> Block4x4 {
    let mut block = [0i32; 16];
    for y in 0..4 {
        for x in 0..4 {
            block[y * 4 + x] =
                i32::from(src[y * stride + x]) - i32::from(pred[y * stride + x]);
        }
    }

    // horizontal
    for i in 0..4 {
        let a = (block[i * 4] + block[i * 4 + 3]) * 8;
        let b = (block[i * 4 + 1] + block[i * 4 + 2]) * 8;
        let c = (block[i * 4 + 1] - block[i * 4 + 2]) * 8;
        let d = (block[i * 4] - block[i * 4 + 3]) * 8;

        block[i * 4] = a + b;
        block[i * 4 + 2] = a - b;
        block[i * 4 + 1] = (c * 2217 + d * 5352 + 14500) >> 12;
        block[i * 4 + 3] = (d * 2217 - c * 5352 + 7500) >> 12;
    }

    // vertical
    let mut out = Block4x4::default();
    for i in 0..4 {
        let a = block[i] + block[i + 12];
        let b = block[i + 4] + block[i + 8];
        let c = block[i + 4] - block[i + 8];
        let d = block[i] - block[i + 12];

        out[i] = ((a + b + 7) >> 4) as i16;
        out[i + 8] = ((a - b + 7) >> 4) as i16;
        out[i + 4] = (((c * 2217 + d * 5352 + 12000) >> 16) + i32::from(d != 0)) as i16;
        out[i + 12] = ((d * 2217 - c * 5352 + 51000) >> 16) as i16;
    }
    out
}

/// Checked [`forward_transform`].
pub fn try_forward_transform(src: &[u8], pred: &[u8], stride: usize) -> Result<Block4x4, BlockError> {
    check_region(src.len(), 4, 4, stride)?;
    check_region(pred.len(), 4, 4, stride)?;
    Ok(forward_transform(src, pred, stride))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_inverse_roundtrip() {
        const BLOCK: [u8; 16] = [
            38, 6, 210, 107, 42, 125, 185, 151, 241, 224, 125, 233, 227, 8, 57, 96,
        ];
        let pred = [0u8; 16];

        let coeffs = forward_transform(&BLOCK, &pred, 4);

        let mut reconstructed = pred;
        transform_one(coeffs.as_array(), &mut reconstructed, 4);

        assert_eq!(BLOCK, reconstructed);
    }

    #[test]
    fn test_dc_only_matches_full_transform() {
        for dc in [-2048i16, -100, -5, -4, -3, 0, 3, 4, 5, 100, 2047] {
            let mut full = [0u8; BPS * 4];
            for (i, v) in full.iter_mut().enumerate() {
                *v = (i * 7 % 256) as u8;
            }
            let mut fast = full;
            let mut coeffs = [0i16; 16];
            coeffs[0] = dc;
            transform_one_scalar(&coeffs, &mut full, BPS);
            transform_dc_only(dc, &mut fast, BPS);
            assert_eq!(full, fast, "dc {dc}");
        }
    }

    #[test]
    fn test_transform_leaves_outside_untouched() {
        let mut dst = [77u8; BPS * 4];
        transform_one(&[64; 16], &mut dst, BPS);
        for y in 0..4 {
            assert!(dst[y * BPS + 4..(y + 1) * BPS].iter().all(|&v| v == 77));
        }
    }

    #[test]
    fn test_checked_variants() {
        let mut dst = [0u8; 3 * BPS + 3];
        assert_eq!(
            try_transform_one(&[0; 16], &mut dst, BPS),
            Err(BlockError::RegionTooSmall {
                required: 3 * BPS + 4,
                actual: 3 * BPS + 3
            })
        );
        let mut dst = [0u8; 3 * BPS + 4];
        assert!(try_transform_one(&[0; 16], &mut dst, BPS).is_ok());
        assert!(try_transform_two(&[0; 32], &mut dst, BPS).is_err());
        assert!(try_forward_transform(&dst, &dst[1..], BPS).is_err());
    }

    #[test]
    fn test_checked_variants_overflowing_stride() {
        let mut dst = [0u8; 64];
        let stride = usize::MAX / 3 + 1;
        let too_small = Err(BlockError::RegionTooSmall {
            required: usize::MAX,
            actual: 64,
        });
        assert_eq!(try_transform_one(&[0; 16], &mut dst, stride), too_small);
        assert_eq!(try_transform_two(&[0; 32], &mut dst, stride), too_small);
        assert_eq!(
            try_forward_transform(&dst, &dst, stride),
            Err(BlockError::RegionTooSmall {
                required: usize::MAX,
                actual: 64
            })
        );
    }

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    #[test]
    fn test_transform_one_simd_matches_scalar() {
        use archmage::{SimdToken, X64V3Token};
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(0xb10c);
        for iter in 0..2000 {
            let mut src = [0i16; 16];
            // mix realistic dequantized ranges with the full i16 range
            let range = if iter % 4 == 0 { i16::MAX } else { 2048 };
            for v in src.iter_mut() {
                *v = rng.gen_range(-range..=range);
            }
            let mut pred = [0u8; BPS * 4];
            rng.fill(&mut pred[..]);
            let mut simd = pred;
            let mut scalar = pred;
            super::super::transform_simd_intrinsics::transform_one_sse41(
                token, &src, &mut simd, BPS,
            );
            transform_one_scalar(&src, &mut scalar, BPS);
            assert_eq!(simd, scalar, "iteration {iter}, src {src:?}");
        }
    }

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    #[test]
    fn test_forward_transform_simd_matches_scalar() {
        use archmage::{SimdToken, X64V3Token};
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(0xf0d);
        for iter in 0..2000 {
            let mut src = [0u8; BPS * 4];
            let mut pred = [0u8; BPS * 4];
            rng.fill(&mut src[..]);
            rng.fill(&mut pred[..]);
            assert_eq!(
                super::super::transform_simd_intrinsics::forward_transform_sse41(
                    token, &src, &pred, BPS
                ),
                forward_transform_scalar(&src, &pred, BPS),
                "iteration {iter}"
            );
        }
        // extreme residuals in both directions
        for (s, p) in [(255u8, 0u8), (0, 255)] {
            let src = [s; 16];
            let pred = [p; 16];
            assert_eq!(
                super::super::transform_simd_intrinsics::forward_transform_sse41(
                    token, &src, &pred, 4
                ),
                forward_transform_scalar(&src, &pred, 4)
            );
        }
    }
}
