//! AVX2 kernels for 8x8 blocks.
//!
//! Uses archmage for safe SIMD intrinsics with token-based CPU feature verification.
//! Every kernel mirrors a scalar kernel in `float_ops` or `coeff` lane for lane.

use archmage::{arcane, X64V3Token};
use core::arch::x86_64::*;
use safe_unaligned_simd::x86_64 as simd_mem;

use super::float_ops::ScalarOp;

#[inline(always)]
fn row(data: &[f32; 64], r: usize) -> &[f32; 8] {
    <&[f32; 8]>::try_from(&data[r * 8..r * 8 + 8]).unwrap()
}

#[inline(always)]
fn row_mut(data: &mut [f32; 64], r: usize) -> &mut [f32; 8] {
    <&mut [f32; 8]>::try_from(&mut data[r * 8..r * 8 + 8]).unwrap()
}

/// Left (`half == 0`) or right (`half == 1`) four elements of row `r`.
#[inline(always)]
fn quarter(data: &[f32; 64], r: usize, half: usize) -> &[f32; 4] {
    let start = r * 8 + half * 4;
    <&[f32; 4]>::try_from(&data[start..start + 4]).unwrap()
}

#[inline(always)]
fn row_i16(data: &[i16; 64], r: usize) -> &[i16; 8] {
    <&[i16; 8]>::try_from(&data[r * 8..r * 8 + 8]).unwrap()
}

#[arcane]
pub(crate) fn scalar_op_avx2(_token: X64V3Token, data: &mut [f32; 64], op: ScalarOp, value: f32) {
    let v = _mm256_set1_ps(value);
    for r in 0..8 {
        let x = simd_mem::_mm256_loadu_ps(row(data, r));
        let y = match op {
            ScalarOp::Add => _mm256_add_ps(x, v),
            ScalarOp::Sub => _mm256_sub_ps(x, v),
            ScalarOp::Mul => _mm256_mul_ps(x, v),
            ScalarOp::Div => _mm256_div_ps(x, v),
        };
        simd_mem::_mm256_storeu_ps(row_mut(data, r), y);
    }
}

#[arcane]
pub(crate) fn multiply_block_avx2(_token: X64V3Token, data: &mut [f32; 64], other: &[f32; 64]) {
    for r in 0..8 {
        let x = simd_mem::_mm256_loadu_ps(row(data, r));
        let o = simd_mem::_mm256_loadu_ps(row(other, r));
        simd_mem::_mm256_storeu_ps(row_mut(data, r), _mm256_mul_ps(x, o));
    }
}

#[arcane]
pub(crate) fn add_block_avx2(_token: X64V3Token, data: &mut [f32; 64], other: &[f32; 64]) {
    for r in 0..8 {
        let x = simd_mem::_mm256_loadu_ps(row(data, r));
        let o = simd_mem::_mm256_loadu_ps(row(other, r));
        simd_mem::_mm256_storeu_ps(row_mut(data, r), _mm256_add_ps(x, o));
    }
}

/// 8x8 transpose as two 4x4 transposes per 128-bit lane.
///
/// Register `r[h * 4 + k]` holds half `h` of row `k` in its low lane and half
/// `h` of row `k + 4` in its high lane. A 4x4 transpose of `r[h * 4..][..4]`
/// then yields output rows `h * 4..h * 4 + 4` directly.
#[arcane]
pub(crate) fn transpose_avx2(_token: X64V3Token, src: &[f32; 64], dst: &mut [f32; 64]) {
    let mut r = [_mm256_setzero_ps(); 8];
    for h in 0..2 {
        for k in 0..4 {
            let low = simd_mem::_mm_loadu_ps(quarter(src, k, h));
            let high = simd_mem::_mm_loadu_ps(quarter(src, k + 4, h));
            r[h * 4 + k] = _mm256_insertf128_ps(_mm256_castps128_ps256(low), high, 1);
        }
    }

    for h in 0..2 {
        let (r0, r1, r2, r3) = (r[h * 4], r[h * 4 + 1], r[h * 4 + 2], r[h * 4 + 3]);
        // t0 = [x00 x10 x01 x11], t1 = [x20 x30 x21 x31]
        let t0 = _mm256_unpacklo_ps(r0, r1);
        let t1 = _mm256_unpacklo_ps(r2, r3);
        // t2 = [x02 x12 x03 x13], t3 = [x22 x32 x23 x33]
        let t2 = _mm256_unpackhi_ps(r0, r1);
        let t3 = _mm256_unpackhi_ps(r2, r3);
        // v0 = [x01 x11 x20 x30], v1 = [x03 x13 x22 x32]
        let v0 = _mm256_shuffle_ps(t0, t1, 0x4E);
        let v1 = _mm256_shuffle_ps(t2, t3, 0x4E);

        let c0 = _mm256_blend_ps(t0, v0, 0xCC);
        let c1 = _mm256_blend_ps(t1, v0, 0x33);
        let c2 = _mm256_blend_ps(t2, v1, 0xCC);
        let c3 = _mm256_blend_ps(t3, v1, 0x33);

        simd_mem::_mm256_storeu_ps(row_mut(dst, h * 4), c0);
        simd_mem::_mm256_storeu_ps(row_mut(dst, h * 4 + 1), c1);
        simd_mem::_mm256_storeu_ps(row_mut(dst, h * 4 + 2), c2);
        simd_mem::_mm256_storeu_ps(row_mut(dst, h * 4 + 3), c3);
    }
}

#[arcane]
pub(crate) fn normalize_avx2(
    _token: X64V3Token,
    data: &mut [f32; 64],
    offset: f32,
    maximum: f32,
    round: bool,
) {
    let off = _mm256_set1_ps(offset);
    let max = _mm256_set1_ps(maximum);
    let zero = _mm256_setzero_ps();
    let half = _mm256_set1_ps(0.5);
    let one = _mm256_set1_ps(1.0);

    for r in 0..8 {
        let x = _mm256_add_ps(simd_mem::_mm256_loadu_ps(row(data, r)), off);
        let x = _mm256_min_ps(_mm256_max_ps(x, zero), max);
        let x = if round {
            // x >= 0: truncate, then step up when the fraction is at least one half
            let t = _mm256_round_ps(x, _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC);
            let frac = _mm256_sub_ps(x, t);
            let up = _mm256_and_ps(_mm256_cmp_ps(frac, half, _CMP_GE_OQ), one);
            _mm256_add_ps(t, up)
        } else {
            x
        };
        simd_mem::_mm256_storeu_ps(row_mut(data, r), x);
    }
}

#[arcane]
pub(crate) fn round_ties_even_avx2(_token: X64V3Token, data: &mut [f32; 64]) {
    for r in 0..8 {
        let x = simd_mem::_mm256_loadu_ps(row(data, r));
        let x = _mm256_round_ps(x, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC);
        simd_mem::_mm256_storeu_ps(row_mut(data, r), x);
    }
}

#[arcane]
pub(crate) fn round_to_i16_avx2(_token: X64V3Token, src: &[f32; 64], dst: &mut [i16; 64]) {
    let zero = _mm256_setzero_ps();
    let half = _mm256_set1_ps(0.5);
    let neg_half = _mm256_set1_ps(-0.5);
    let lo = _mm256_set1_ps(-32768.0);
    let hi = _mm256_set1_ps(32767.0);

    for r in 0..8 {
        let x = simd_mem::_mm256_loadu_ps(row(src, r));
        let negative = _mm256_cmp_ps(x, zero, _CMP_LT_OQ);
        let x = _mm256_add_ps(x, _mm256_blendv_ps(half, neg_half, negative));
        let x = _mm256_min_ps(_mm256_max_ps(x, lo), hi);
        let ints = _mm256_cvttps_epi32(x);
        let packed = _mm_packs_epi32(
            _mm256_castsi256_si128(ints),
            _mm256_extracti128_si256(ints, 1),
        );
        simd_mem::_mm_storeu_si128(
            <&mut [i16; 8]>::try_from(&mut dst[r * 8..r * 8 + 8]).unwrap(),
            packed,
        );
    }
}

#[arcane]
pub(crate) fn widen_i16_avx2(_token: X64V3Token, src: &[i16; 64], dst: &mut [f32; 64]) {
    for r in 0..8 {
        let v = simd_mem::_mm_loadu_si128(row_i16(src, r));
        let f = _mm256_cvtepi32_ps(_mm256_cvtepi16_epi32(v));
        simd_mem::_mm256_storeu_ps(row_mut(dst, r), f);
    }
}

#[arcane]
pub(crate) fn equals_i32_avx2(_token: X64V3Token, data: &[f32; 64], value: i32) -> bool {
    let target = _mm256_set1_epi32(value);
    let mut all = _mm256_set1_epi32(-1);
    for r in 0..8 {
        let ints = _mm256_cvttps_epi32(simd_mem::_mm256_loadu_ps(row(data, r)));
        all = _mm256_and_si256(all, _mm256_cmpeq_epi32(ints, target));
    }
    _mm256_movemask_epi8(all) == -1
}

#[arcane]
pub(crate) fn last_nonzero_avx2(_token: X64V3Token, data: &[f32; 64]) -> i32 {
    let zero = _mm256_setzero_si256();
    for r in (0..8).rev() {
        let ints = _mm256_cvttps_epi32(simd_mem::_mm256_loadu_ps(row(data, r)));
        let is_zero = _mm256_movemask_ps(_mm256_castsi256_ps(_mm256_cmpeq_epi32(ints, zero)));
        let nonzero = (!is_zero as u32) & 0xFF;
        if nonzero != 0 {
            return (r * 8) as i32 + 31 - nonzero.leading_zeros() as i32;
        }
    }
    -1
}

/// Bit `i` set when `data[i] != 0`.
#[arcane]
pub(crate) fn nonzero_mask_i16_avx2(_token: X64V3Token, data: &[i16; 64]) -> u64 {
    let zero = _mm_setzero_si128();
    let mut mask = 0u64;
    for pair in 0..4 {
        let a = simd_mem::_mm_loadu_si128(row_i16(data, pair * 2));
        let b = simd_mem::_mm_loadu_si128(row_i16(data, pair * 2 + 1));
        // 0xFF bytes where the coefficient is zero, in element order
        let zeros = _mm_packs_epi16(_mm_cmpeq_epi16(a, zero), _mm_cmpeq_epi16(b, zero));
        let zero_bits = _mm_movemask_epi8(zeros) as u32;
        mask |= u64::from(!zero_bits & 0xFFFF) << (pair * 16);
    }
    mask
}

#[arcane]
pub(crate) fn equals_i16_avx2(_token: X64V3Token, data: &[i16; 64], value: i16) -> bool {
    let target = _mm_set1_epi16(value);
    let mut all = _mm_set1_epi16(-1);
    for r in 0..8 {
        let v = simd_mem::_mm_loadu_si128(row_i16(data, r));
        all = _mm_and_si128(all, _mm_cmpeq_epi16(v, target));
    }
    _mm_movemask_epi8(all) == 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::super::coeff::{equals_i16_scalar, nonzero_mask_i16_scalar};
    use super::super::float_ops::*;
    use super::*;
    use archmage::SimdToken;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_block(rng: &mut StdRng, range: f32) -> [f32; 64] {
        let mut data = [0.0f32; 64];
        for v in data.iter_mut() {
            *v = rng.gen_range(-range..range);
        }
        data
    }

    /// Values that stress rounding: exact halves, near-halves and specials.
    fn edge_block(rng: &mut StdRng) -> [f32; 64] {
        const EDGES: [f32; 12] = [
            0.5,
            -0.5,
            1.5,
            -2.5,
            0.49999997,
            -0.0,
            127.5,
            32767.5,
            -32768.5,
            1e10,
            f32::NAN,
            f32::INFINITY,
        ];
        let mut data = random_block(rng, 300.0);
        for v in data.iter_mut() {
            if rng.gen_bool(0.5) {
                *v = EDGES[rng.gen_range(0..EDGES.len())];
            }
        }
        data
    }

    fn assert_bits_eq(a: &[f32; 64], b: &[f32; 64]) {
        for i in 0..64 {
            assert!(
                a[i].to_bits() == b[i].to_bits() || (a[i].is_nan() && b[i].is_nan()),
                "lane {i}: {} vs {}",
                a[i],
                b[i]
            );
        }
    }

    #[test]
    fn test_scalar_ops_simd_matches_scalar() {
        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(0x5ca1a);
        for _ in 0..200 {
            let data = random_block(&mut rng, 1000.0);
            let value = rng.gen_range(-50.0f32..50.0);
            for op in [ScalarOp::Add, ScalarOp::Sub, ScalarOp::Mul, ScalarOp::Div] {
                let mut simd = data;
                let mut scalar = data;
                scalar_op_avx2(token, &mut simd, op, value);
                scalar_op_scalar(&mut scalar, op, value);
                assert_bits_eq(&simd, &scalar);
            }
            let other = random_block(&mut rng, 10.0);
            let (mut simd, mut scalar) = (data, data);
            multiply_block_avx2(token, &mut simd, &other);
            multiply_block_scalar(&mut scalar, &other);
            assert_bits_eq(&simd, &scalar);
            let (mut simd, mut scalar) = (data, data);
            add_block_avx2(token, &mut simd, &other);
            add_block_scalar(&mut scalar, &other);
            assert_bits_eq(&simd, &scalar);
        }
    }

    #[test]
    fn test_transpose_simd_matches_scalar() {
        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut src = [0.0f32; 64];
        for (i, v) in src.iter_mut().enumerate() {
            *v = i as f32;
        }
        let mut simd = [0.0f32; 64];
        let mut scalar = [0.0f32; 64];
        transpose_avx2(token, &src, &mut simd);
        transpose_scalar(&src, &mut scalar);
        assert_eq!(simd, scalar);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let src = random_block(&mut rng, 1e6);
            transpose_avx2(token, &src, &mut simd);
            transpose_scalar(&src, &mut scalar);
            assert_bits_eq(&simd, &scalar);
        }
    }

    #[test]
    fn test_rounding_simd_matches_scalar() {
        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(0xdead_beef);
        for _ in 0..500 {
            let data = edge_block(&mut rng);

            for (maximum, round) in [(255.0, true), (255.0, false), (4095.0, true)] {
                let offset = (maximum / 2.0f32).ceil();
                let (mut simd, mut scalar) = (data, data);
                normalize_avx2(token, &mut simd, offset, maximum, round);
                normalize_scalar(&mut scalar, offset, maximum, round);
                assert_bits_eq(&simd, &scalar);
            }

            let (mut simd, mut scalar) = (data, data);
            round_ties_even_avx2(token, &mut simd);
            round_ties_even_scalar(&mut scalar);
            assert_bits_eq(&simd, &scalar);

            let mut simd_i = [0i16; 64];
            let mut scalar_i = [0i16; 64];
            round_to_i16_avx2(token, &data, &mut simd_i);
            round_to_i16_scalar(&data, &mut scalar_i);
            assert_eq!(simd_i, scalar_i);
        }
    }

    #[test]
    fn test_widen_simd_matches_scalar() {
        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut src = [0i16; 64];
        for v in src.iter_mut() {
            *v = rng.gen();
        }
        src[0] = i16::MIN;
        src[1] = i16::MAX;
        let mut simd = [0.0f32; 64];
        let mut scalar = [0.0f32; 64];
        widen_i16_avx2(token, &src, &mut simd);
        widen_i16_scalar(&src, &mut scalar);
        assert_eq!(simd, scalar);
    }

    #[test]
    fn test_compare_simd_matches_scalar() {
        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            // mostly-zero blocks with a few survivors, like quantized output
            let mut data = [0.0f32; 64];
            for _ in 0..rng.gen_range(0..4) {
                data[rng.gen_range(0..64)] = rng.gen_range(-3.0f32..3.0);
            }
            if rng.gen_bool(0.1) {
                data[rng.gen_range(0..64)] = f32::NAN;
            }
            assert_eq!(last_nonzero_avx2(token, &data), last_nonzero_scalar(&data));
            for value in [0, 1, -1, i32::MIN] {
                assert_eq!(
                    equals_i32_avx2(token, &data, value),
                    equals_i32_scalar(&data, value)
                );
            }
            let splat = [rng.gen_range(-2.0f32..2.0); 64];
            let value = truncate_to_i32(splat[0]);
            assert!(equals_i32_avx2(token, &splat, value));
            assert!(equals_i32_scalar(&splat, value));
        }
    }

    #[test]
    fn test_i16_simd_matches_scalar() {
        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..500 {
            let mut data = [0i16; 64];
            for _ in 0..rng.gen_range(0..5) {
                data[rng.gen_range(0..64)] = rng.gen_range(-40..40);
            }
            assert_eq!(
                nonzero_mask_i16_avx2(token, &data),
                nonzero_mask_i16_scalar(&data)
            );
            for value in [0i16, 1, -7] {
                assert_eq!(
                    equals_i16_avx2(token, &data, value),
                    equals_i16_scalar(&data, value)
                );
            }
        }
        assert!(equals_i16_avx2(token, &[-7; 64], -7));
    }
}
