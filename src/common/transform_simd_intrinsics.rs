//! SSE4.1 forward and inverse 4x4 transforms.
//!
//! Both work on i32 lanes. The inverse multiplies with `pmulld` so every
//! product wraps exactly like the scalar kernel's `wrapping_mul`. The i16 `pmulhw` formulation is faster but
//! diverges from the scalar result once intermediates leave the i16 range.

use core::arch::x86_64::*;

use archmage::{arcane, rite, X64V3Token};
use safe_unaligned_simd::x86_64 as simd_mem;

use super::transform::{CONST1, CONST2};
use crate::block::Block4x4;

/// Entry shim for the fused inverse transform + add + clamp.
#[arcane]
pub(crate) fn transform_one_sse41(_token: X64V3Token, src: &[i16; 16], dst: &mut [u8], stride: usize) {
    // Perform one length check up front, as the scalar kernel does
    assert!(dst.len() >= 3 * stride + 4);

    let in01 = simd_mem::_mm_loadu_si128(<&[i16; 8]>::try_from(&src[0..8]).unwrap());
    let in23 = simd_mem::_mm_loadu_si128(<&[i16; 8]>::try_from(&src[8..16]).unwrap());

    // lane i of row k holds src[4 * k + i]
    let row0 = _mm_cvtepi16_epi32(in01);
    let row1 = _mm_cvtepi16_epi32(_mm_unpackhi_epi64(in01, in01));
    let row2 = _mm_cvtepi16_epi32(in23);
    let row3 = _mm_cvtepi16_epi32(_mm_unpackhi_epi64(in23, in23));

    // Vertical pass, one column per lane. Output k of column i is tmp[4 * i + k].
    let (t0, t1, t2, t3) = butterfly(_token, row0, row1, row2, row3);

    // The horizontal pass for row j reads tmp[j], tmp[4 + j], tmp[8 + j] and
    // tmp[12 + j], i.e. lane k of t_j; transposing puts row j in lane j.
    let (u0, u1, u2, u3) = transpose_4x4(_token, t0, t1, t2, t3);
    let u0 = _mm_add_epi32(u0, _mm_set1_epi32(4));
    let (c0, c1, c2, c3) = butterfly(_token, u0, u1, u2, u3);

    // c_k lane j is column k of output row j; transpose back to rows
    let (r0, r1, r2, r3) = transpose_4x4(
        _token,
        _mm_srai_epi32(c0, 3),
        _mm_srai_epi32(c1, 3),
        _mm_srai_epi32(c2, 3),
        _mm_srai_epi32(c3, 3),
    );

    let r0 = _mm_add_epi32(r0, load_row(_token, dst, 0));
    let r1 = _mm_add_epi32(r1, load_row(_token, dst, stride));
    let r2 = _mm_add_epi32(r2, load_row(_token, dst, stride * 2));
    let r3 = _mm_add_epi32(r3, load_row(_token, dst, stride * 3));

    // Saturating packs clamp to [0, 255]
    let packed = _mm_packus_epi16(_mm_packs_epi32(r0, r1), _mm_packs_epi32(r2, r3));
    let mut out = [0u8; 16];
    simd_mem::_mm_storeu_si128(&mut out, packed);
    for (y, row) in out.chunks_exact(4).enumerate() {
        dst[y * stride..y * stride + 4].copy_from_slice(row);
    }
}

/// Forward transform of `src - pred`, bit-identical to the scalar kernel.
#[arcane]
pub(crate) fn forward_transform_sse41(
    _token: X64V3Token,
    src: &[u8],
    pred: &[u8],
    stride: usize,
) -> Block4x4 {
    assert!(src.len() >= 3 * stride + 4 && pred.len() >= 3 * stride + 4);

    // residual row y in register y, column x in lane x
    let r0 = _mm_sub_epi32(load_row(_token, src, 0), load_row(_token, pred, 0));
    let r1 = _mm_sub_epi32(load_row(_token, src, stride), load_row(_token, pred, stride));
    let r2 = _mm_sub_epi32(
        load_row(_token, src, stride * 2),
        load_row(_token, pred, stride * 2),
    );
    let r3 = _mm_sub_epi32(
        load_row(_token, src, stride * 3),
        load_row(_token, pred, stride * 3),
    );

    // horizontal pass runs along rows, so put row y in lane y
    let (x0, x1, x2, x3) = transpose_4x4(_token, r0, r1, r2, r3);
    let a = _mm_slli_epi32(_mm_add_epi32(x0, x3), 3);
    let b = _mm_slli_epi32(_mm_add_epi32(x1, x2), 3);
    let c = _mm_slli_epi32(_mm_sub_epi32(x1, x2), 3);
    let d = _mm_slli_epi32(_mm_sub_epi32(x0, x3), 3);
    let h0 = _mm_add_epi32(a, b);
    let h2 = _mm_sub_epi32(a, b);
    let h1 = rotate(_token, c, d, 14500, 12);
    let h3 = rotate(_token, d, _mm_sub_epi32(_mm_setzero_si128(), c), 7500, 12);

    // back to one row per register for the vertical pass
    let (v0, v1, v2, v3) = transpose_4x4(_token, h0, h1, h2, h3);
    let a = _mm_add_epi32(v0, v3);
    let b = _mm_add_epi32(v1, v2);
    let c = _mm_sub_epi32(v1, v2);
    let d = _mm_sub_epi32(v0, v3);
    let seven = _mm_set1_epi32(7);
    let o0 = _mm_srai_epi32(_mm_add_epi32(_mm_add_epi32(a, b), seven), 4);
    let o2 = _mm_srai_epi32(_mm_add_epi32(_mm_sub_epi32(a, b), seven), 4);
    // + (d != 0): cmpeq yields -1 where d == 0
    let d_nonzero = _mm_add_epi32(
        _mm_set1_epi32(1),
        _mm_cmpeq_epi32(d, _mm_setzero_si128()),
    );
    let o1 = _mm_add_epi32(rotate(_token, c, d, 12000, 16), d_nonzero);
    let o3 = rotate(_token, d, _mm_sub_epi32(_mm_setzero_si128(), c), 51000, 16);

    // |coefficients| stay well inside i16 for u8 inputs, so packs never saturates
    let mut out = [0i16; 16];
    simd_mem::_mm_storeu_si128(
        <&mut [i16; 8]>::try_from(&mut out[0..8]).unwrap(),
        _mm_packs_epi32(o0, o1),
    );
    simd_mem::_mm_storeu_si128(
        <&mut [i16; 8]>::try_from(&mut out[8..16]).unwrap(),
        _mm_packs_epi32(o2, o3),
    );
    Block4x4::from_array(out)
}

/// `(x * 2217 + y * 5352 + bias) >> shift`.
#[rite]
fn rotate(_token: X64V3Token, x: __m128i, y: __m128i, bias: i32, shift: i32) -> __m128i {
    let sum = _mm_add_epi32(
        _mm_mullo_epi32(x, _mm_set1_epi32(2217)),
        _mm_mullo_epi32(y, _mm_set1_epi32(5352)),
    );
    let sum = _mm_add_epi32(sum, _mm_set1_epi32(bias));
    _mm_sra_epi32(sum, _mm_cvtsi32_si128(shift))
}

/// Four bytes at `offset` widened to i32 lanes.
#[rite]
fn load_row(_token: X64V3Token, buf: &[u8], offset: usize) -> __m128i {
    let bytes = simd_mem::_mm_loadu_si32(<&[u8; 4]>::try_from(&buf[offset..offset + 4]).unwrap());
    _mm_cvtepu8_epi32(bytes)
}

/// `(x * CONST1 >> 16) + x`, wrapping at 32 bits.
#[rite]
fn mul1(_token: X64V3Token, x: __m128i) -> __m128i {
    _mm_add_epi32(_mm_srai_epi32(_mm_mullo_epi32(x, _mm_set1_epi32(CONST1)), 16), x)
}

/// `x * CONST2 >> 16`, wrapping at 32 bits.
#[rite]
fn mul2(_token: X64V3Token, x: __m128i) -> __m128i {
    _mm_srai_epi32(_mm_mullo_epi32(x, _mm_set1_epi32(CONST2)), 16)
}

/// One 1-D pass: returns `(a + d, b + c, b - c, a - d)` lane-wise.
#[rite]
fn butterfly(
    _token: X64V3Token,
    in0: __m128i,
    in1: __m128i,
    in2: __m128i,
    in3: __m128i,
) -> (__m128i, __m128i, __m128i, __m128i) {
    let a = _mm_add_epi32(in0, in2);
    let b = _mm_sub_epi32(in0, in2);
    let c = _mm_sub_epi32(mul2(_token, in1), mul1(_token, in3));
    let d = _mm_add_epi32(mul1(_token, in1), mul2(_token, in3));
    (
        _mm_add_epi32(a, d),
        _mm_add_epi32(b, c),
        _mm_sub_epi32(b, c),
        _mm_sub_epi32(a, d),
    )
}

#[rite]
fn transpose_4x4(
    _token: X64V3Token,
    v0: __m128i,
    v1: __m128i,
    v2: __m128i,
    v3: __m128i,
) -> (__m128i, __m128i, __m128i, __m128i) {
    let t0 = _mm_unpacklo_epi32(v0, v1);
    let t1 = _mm_unpacklo_epi32(v2, v3);
    let t2 = _mm_unpackhi_epi32(v0, v1);
    let t3 = _mm_unpackhi_epi32(v2, v3);
    (
        _mm_unpacklo_epi64(t0, t1),
        _mm_unpackhi_epi64(t0, t1),
        _mm_unpacklo_epi64(t2, t3),
        _mm_unpackhi_epi64(t2, t3),
    )
}
