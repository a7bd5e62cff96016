//! Block distortion kernels: sum of squared errors, quadrant means and the
//! weighted Hadamard distortion.
//!
//! Scalar kernels are always compiled; the SSE kernels take an
//! [`X64V3Token`] and are selected by the wrappers in
//! [`crate::encoder::cost`]. Both produce identical integers.

#![allow(clippy::needless_range_loop)]

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
use archmage::{arcane, rite, X64V3Token};
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
use core::arch::x86_64::*;
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
use safe_unaligned_simd::x86_64 as simd_mem;

//------------------------------------------------------------------------------
// Sum of squared errors

/// Scalar SSE over a 4x4 region.
pub(crate) fn sse4x4_scalar(a: &[u8], b: &[u8], stride: usize) -> u32 {
    sse_region_scalar(a, b, stride, 4, 4)
}

/// Scalar SSE over a 16x16 region.
pub(crate) fn sse16x16_scalar(a: &[u8], b: &[u8], stride: usize) -> u32 {
    sse_region_scalar(a, b, stride, 16, 16)
}

fn sse_region_scalar(a: &[u8], b: &[u8], stride: usize, width: usize, height: usize) -> u32 {
    let mut sum = 0u32;
    for y in 0..height {
        let a_row = &a[y * stride..y * stride + width];
        let b_row = &b[y * stride..y * stride + width];
        for (&pa, &pb) in a_row.iter().zip(b_row) {
            let diff = i32::from(pa) - i32::from(pb);
            sum += (diff * diff) as u32;
        }
    }
    sum
}

/// SSE2 SSE over a 4x4 region: the four rows are gathered into one register.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[arcane]
pub(crate) fn sse4x4_sse2(_token: X64V3Token, a: &[u8], b: &[u8], stride: usize) -> u32 {
    let zero = _mm_setzero_si128();

    let a_bytes = gather_4x4(_token, a, stride);
    let b_bytes = gather_4x4(_token, b, stride);

    // Widen to i16
    let a_lo = _mm_unpacklo_epi8(a_bytes, zero);
    let b_lo = _mm_unpacklo_epi8(b_bytes, zero);
    let a_hi = _mm_unpackhi_epi8(a_bytes, zero);
    let b_hi = _mm_unpackhi_epi8(b_bytes, zero);

    let d_lo = _mm_sub_epi16(a_lo, b_lo);
    let d_hi = _mm_sub_epi16(a_hi, b_hi);

    // Square and pair-sum to i32
    let sq_lo = _mm_madd_epi16(d_lo, d_lo);
    let sq_hi = _mm_madd_epi16(d_hi, d_hi);

    hsum_epi32(_token, _mm_add_epi32(sq_lo, sq_hi)) as u32
}

/// SSE2 SSE over a 16x16 region, one row per iteration.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[arcane]
pub(crate) fn sse16x16_sse2(_token: X64V3Token, a: &[u8], b: &[u8], stride: usize) -> u32 {
    let zero = _mm_setzero_si128();
    let mut total = _mm_setzero_si128();

    for y in 0..16 {
        let a_bytes =
            simd_mem::_mm_loadu_si128(<&[u8; 16]>::try_from(&a[y * stride..][..16]).unwrap());
        let b_bytes =
            simd_mem::_mm_loadu_si128(<&[u8; 16]>::try_from(&b[y * stride..][..16]).unwrap());

        let d_lo = _mm_sub_epi16(_mm_unpacklo_epi8(a_bytes, zero), _mm_unpacklo_epi8(b_bytes, zero));
        let d_hi = _mm_sub_epi16(_mm_unpackhi_epi8(a_bytes, zero), _mm_unpackhi_epi8(b_bytes, zero));

        total = _mm_add_epi32(total, _mm_madd_epi16(d_lo, d_lo));
        total = _mm_add_epi32(total, _mm_madd_epi16(d_hi, d_hi));
    }

    hsum_epi32(_token, total) as u32
}

//------------------------------------------------------------------------------
// Quadrant means

/// Scalar sums of the four 4x4 quadrants of a 16x4 region.
pub(crate) fn mean16x4_scalar(input: &[u8], stride: usize) -> [u32; 4] {
    let mut dc = [0u32; 4];
    for y in 0..4 {
        let row = &input[y * stride..y * stride + 16];
        for (q, quad) in row.chunks_exact(4).enumerate() {
            dc[q] += quad.iter().map(|&v| u32::from(v)).sum::<u32>();
        }
    }
    dc
}

/// SSE quadrant sums. Column sums stay in i16 lanes (at most 4 * 255), then
/// `madd` by one and a horizontal add fold each group of four columns.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[arcane]
pub(crate) fn mean16x4_ssse3(_token: X64V3Token, input: &[u8], stride: usize) -> [u32; 4] {
    let zero = _mm_setzero_si128();
    let mut cols_lo = _mm_setzero_si128();
    let mut cols_hi = _mm_setzero_si128();

    for y in 0..4 {
        let row =
            simd_mem::_mm_loadu_si128(<&[u8; 16]>::try_from(&input[y * stride..][..16]).unwrap());
        cols_lo = _mm_add_epi16(cols_lo, _mm_unpacklo_epi8(row, zero));
        cols_hi = _mm_add_epi16(cols_hi, _mm_unpackhi_epi8(row, zero));
    }

    let ones = _mm_set1_epi16(1);
    let pairs_lo = _mm_madd_epi16(cols_lo, ones);
    let pairs_hi = _mm_madd_epi16(cols_hi, ones);
    let quads = _mm_hadd_epi32(pairs_lo, pairs_hi);

    let mut out = [0i32; 4];
    simd_mem::_mm_storeu_si128(&mut out, quads);
    out.map(|v| v as u32)
}

//------------------------------------------------------------------------------
// Weighted Hadamard distortion

/// Weighted sum of the absolute 4x4 Walsh-Hadamard coefficients of a block.
///
/// `w[4 * v + h]` weighs the coefficient with vertical frequency `v` and
/// horizontal frequency `h`.
pub(crate) fn t_transform_scalar(input: &[u8], stride: usize, w: &[u16; 16]) -> i32 {
    let mut tmp = [0i32; 16];

    // horizontal pass
    for i in 0..4 {
        let row = &input[i * stride..i * stride + 4];
        let a0 = i32::from(row[0]) + i32::from(row[2]);
        let a1 = i32::from(row[1]) + i32::from(row[3]);
        let a2 = i32::from(row[1]) - i32::from(row[3]);
        let a3 = i32::from(row[0]) - i32::from(row[2]);
        tmp[i * 4] = a0 + a1;
        tmp[i * 4 + 1] = a3 + a2;
        tmp[i * 4 + 2] = a3 - a2;
        tmp[i * 4 + 3] = a0 - a1;
    }

    // vertical pass with weighting
    let mut sum = 0i32;
    for i in 0..4 {
        let a0 = tmp[i] + tmp[8 + i];
        let a1 = tmp[4 + i] + tmp[12 + i];
        let a2 = tmp[4 + i] - tmp[12 + i];
        let a3 = tmp[i] - tmp[8 + i];
        let b0 = a0 + a1;
        let b1 = a3 + a2;
        let b2 = a3 - a2;
        let b3 = a0 - a1;

        sum += i32::from(w[i]) * b0.abs();
        sum += i32::from(w[4 + i]) * b1.abs();
        sum += i32::from(w[8 + i]) * b2.abs();
        sum += i32::from(w[12 + i]) * b3.abs();
    }
    sum
}

/// Scalar `|T(b) - T(a)| >> 5`.
pub(crate) fn disto4x4_scalar(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> i32 {
    let sum_a = t_transform_scalar(a, stride, w);
    let sum_b = t_transform_scalar(b, stride, w);
    (sum_b - sum_a).abs() >> 5
}

/// SSE2 distortion transforming both blocks side by side in i16 lanes.
///
/// The vertical pass runs first, so coefficient `(v, h)` ends up at lane
/// position `4 * h + v`; the weights are transposed to match. Coefficients
/// and weights are widened to i32 lanes before weighting, so the full `u16`
/// weight range is exact.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[arcane]
pub(crate) fn disto4x4_sse2(
    _token: X64V3Token,
    a: &[u8],
    b: &[u8],
    stride: usize,
    w: &[u16; 16],
) -> i32 {
    let zero = _mm_setzero_si128();

    // [a_row b_row] per register, widened to i16
    let mut rows = [zero; 4];
    for (y, r) in rows.iter_mut().enumerate() {
        let ra = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&a[y * stride..][..4]).unwrap());
        let rb = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&b[y * stride..][..4]).unwrap());
        *r = _mm_unpacklo_epi8(_mm_unpacklo_epi32(ra, rb), zero);
    }

    // vertical pass, then transpose both 4x4 halves so columns become rows
    let (v0, v1, v2, v3) = hadamard_i16(_token, rows[0], rows[1], rows[2], rows[3]);
    let (t0, t1, t2, t3) = transpose_2x4x4_i16(_token, v0, v1, v2, v3);
    let (h0, h1, h2, h3) = hadamard_i16(_token, t0, t1, t2, t3);

    // A's coefficients sit in the low 64 bits of each register, B's in the high
    let a_01 = _mm_unpacklo_epi64(h0, h1);
    let a_23 = _mm_unpacklo_epi64(h2, h3);
    let b_01 = _mm_unpackhi_epi64(h0, h1);
    let b_23 = _mm_unpackhi_epi64(h2, h3);

    // bit patterns only; the weights are zero-extended below
    let mut wt = [0i16; 16];
    for (p, slot) in wt.iter_mut().enumerate() {
        *slot = w[(p % 4) * 4 + p / 4] as i16;
    }
    let w_0 = simd_mem::_mm_loadu_si128(<&[i16; 8]>::try_from(&wt[0..8]).unwrap());
    let w_8 = simd_mem::_mm_loadu_si128(<&[i16; 8]>::try_from(&wt[8..16]).unwrap());
    let weights = [
        _mm_cvtepu16_epi32(w_0),
        _mm_unpackhi_epi16(w_0, zero),
        _mm_cvtepu16_epi32(w_8),
        _mm_unpackhi_epi16(w_8, zero),
    ];

    let sum_a = weighted_abs_sum(_token, a_01, a_23, weights);
    let sum_b = weighted_abs_sum(_token, b_01, b_23, weights);

    (sum_b - sum_a).abs() >> 5
}

//------------------------------------------------------------------------------
// Shared helpers

/// Four 4-byte rows packed into one register in row order.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[rite]
fn gather_4x4(_token: X64V3Token, src: &[u8], stride: usize) -> __m128i {
    let r0 = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&src[0..4]).unwrap());
    let r1 = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&src[stride..][..4]).unwrap());
    let r2 = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&src[stride * 2..][..4]).unwrap());
    let r3 = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&src[stride * 3..][..4]).unwrap());
    _mm_unpacklo_epi64(_mm_unpacklo_epi32(r0, r1), _mm_unpacklo_epi32(r2, r3))
}

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[rite]
fn hsum_epi32(_token: X64V3Token, v: __m128i) -> i32 {
    let sum = _mm_add_epi32(v, _mm_shuffle_epi32(v, 0b10_11_00_01)); // swap pairs
    let sum = _mm_add_epi32(sum, _mm_shuffle_epi32(sum, 0b01_00_11_10)); // swap halves
    _mm_cvtsi128_si32(sum)
}

/// `sum(|c| * w)` over 16 i16 coefficients, accumulated in i32 lanes.
///
/// `|c|` is at most `16 * 255` and fits i16 after `abs`, so it zero-extends
/// safely; products and the total stay below `i32::MAX` for `u16` weights.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[rite]
fn weighted_abs_sum(
    _token: X64V3Token,
    c_01: __m128i,
    c_23: __m128i,
    weights: [__m128i; 4],
) -> i32 {
    let zero = _mm_setzero_si128();
    let c_01 = _mm_abs_epi16(c_01);
    let c_23 = _mm_abs_epi16(c_23);
    let lo = _mm_add_epi32(
        _mm_mullo_epi32(_mm_cvtepu16_epi32(c_01), weights[0]),
        _mm_mullo_epi32(_mm_unpackhi_epi16(c_01, zero), weights[1]),
    );
    let hi = _mm_add_epi32(
        _mm_mullo_epi32(_mm_cvtepu16_epi32(c_23), weights[2]),
        _mm_mullo_epi32(_mm_unpackhi_epi16(c_23, zero), weights[3]),
    );
    hsum_epi32(_token, _mm_add_epi32(lo, hi))
}

/// One 4-point Walsh-Hadamard butterfly across four registers.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[rite]
fn hadamard_i16(
    _token: X64V3Token,
    in0: __m128i,
    in1: __m128i,
    in2: __m128i,
    in3: __m128i,
) -> (__m128i, __m128i, __m128i, __m128i) {
    let a0 = _mm_add_epi16(in0, in2);
    let a1 = _mm_add_epi16(in1, in3);
    let a2 = _mm_sub_epi16(in1, in3);
    let a3 = _mm_sub_epi16(in0, in2);
    (
        _mm_add_epi16(a0, a1),
        _mm_add_epi16(a3, a2),
        _mm_sub_epi16(a3, a2),
        _mm_sub_epi16(a0, a1),
    )
}

/// Transposes the two 4x4 i16 matrices held in the low and high halves.
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
#[rite]
fn transpose_2x4x4_i16(
    _token: X64V3Token,
    v0: __m128i,
    v1: __m128i,
    v2: __m128i,
    v3: __m128i,
) -> (__m128i, __m128i, __m128i, __m128i) {
    let t0 = _mm_unpacklo_epi16(v0, v1);
    let t1 = _mm_unpacklo_epi16(v2, v3);
    let t2 = _mm_unpackhi_epi16(v0, v1);
    let t3 = _mm_unpackhi_epi16(v2, v3);
    let u0 = _mm_unpacklo_epi32(t0, t1);
    let u1 = _mm_unpacklo_epi32(t2, t3);
    let u2 = _mm_unpackhi_epi32(t0, t1);
    let u3 = _mm_unpackhi_epi32(t2, t3);
    (
        _mm_unpacklo_epi64(u0, u1),
        _mm_unpackhi_epi64(u0, u1),
        _mm_unpacklo_epi64(u2, u3),
        _mm_unpackhi_epi64(u2, u3),
    )
}
