//! Known-answer buffers for the 4x4 transforms and distortion metrics.
//!
//! All buffers use the 32-byte work-buffer stride.

#![allow(dead_code)]

pub const TRANSFORM_TWO_SRC: [i16; 32] = [
    19, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 19, 23, 0, 0, -23, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0,
];

#[rustfmt::skip]
pub const TRANSFORM_TWO_DST: [u8; 128] = [
    103, 103, 103, 103, 103, 103, 103, 103, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 103, 103, 103, 103,
    103, 103, 103, 103, 103, 103, 103, 103, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 103, 103, 103, 103,
    103, 103, 103, 103, 103, 103, 103, 103, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 103, 103, 103, 103,
    103, 103, 103, 103, 103, 103, 103, 103, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 0, 0, 0, 0,
];

#[rustfmt::skip]
pub const TRANSFORM_TWO_EXPECTED: [u8; 128] = [
    105, 105, 105, 105, 105, 103, 100, 98, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 103, 103, 103, 103,
    105, 105, 105, 105, 108, 105, 102, 100, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 103, 103, 103, 103,
    105, 105, 105, 105, 111, 109, 106, 103, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 103, 103, 103, 103,
    105, 105, 105, 105, 113, 111, 108, 106, 0, 0, 0, 0, 169, 169, 169, 169,
    171, 171, 171, 171, 171, 171, 171, 171, 0, 0, 0, 0, 0, 0, 0, 0,
];

pub const TRANSFORM_ONE_SRC: [i16; 16] = [-176, 0, 0, 0, 29, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Eight rows of `128 x 8, 0 x 7, 129`, 16 bytes each.
pub fn transform_one_dst() -> [u8; 128] {
    let mut dst = [0u8; 128];
    for row in dst.chunks_exact_mut(16) {
        row[..8].fill(128);
        row[15] = 129;
    }
    dst
}

/// [`transform_one_dst`] with the first four bytes of rows 0, 2, 4 and 6
/// (the 32-byte stride rows) replaced by the reconstruction.
pub fn transform_one_expected() -> [u8; 128] {
    let mut dst = transform_one_dst();
    for (y, value) in [111u8, 108, 104, 101].into_iter().enumerate() {
        dst[y * 32..y * 32 + 4].fill(value);
    }
    dst
}

#[rustfmt::skip]
pub const SSE_A: [u8; 128] = [
    27, 27, 28, 29, 29, 28, 27, 27, 27, 28, 28, 29, 29, 28, 28, 27,
    129, 129, 129, 129, 129, 129, 129, 129, 128, 128, 128, 128, 128, 128, 128, 128,
    27, 27, 27, 27, 27, 27, 27, 27, 27, 28, 28, 29, 29, 28, 28, 27,
    129, 129, 129, 129, 129, 129, 129, 129, 128, 128, 128, 128, 128, 128, 128, 128,
    27, 27, 26, 26, 26, 26, 27, 27, 27, 28, 28, 29, 29, 28, 28, 27,
    129, 129, 129, 129, 129, 129, 129, 129, 128, 128, 128, 128, 128, 128, 128, 128,
    28, 27, 27, 26, 26, 27, 27, 28, 27, 28, 28, 29, 29, 28, 28, 27,
    129, 129, 129, 129, 129, 129, 129, 129, 128, 128, 128, 128, 128, 128, 128, 128,
];

#[rustfmt::skip]
pub const SSE_B: [u8; 128] = [
    26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204,
    26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204,
    26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204,
    26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204, 204,
];

#[rustfmt::skip]
pub const MEAN_INPUT: [u8; 128] = [
    154, 145, 102, 115, 127, 129, 126, 125, 126, 120, 133, 152, 157, 153, 119, 94,
    104, 116, 111, 113, 113, 109, 105, 124, 173, 175, 177, 170, 175, 172, 166, 164,
    151, 141, 99, 114, 125, 126, 135, 150, 133, 115, 127, 149, 141, 168, 100, 54,
    110, 117, 115, 116, 119, 115, 117, 130, 174, 174, 174, 157, 146, 171, 166, 158,
    117, 140, 96, 111, 119, 119, 136, 171, 188, 134, 121, 126, 136, 119, 59, 77,
    109, 115, 113, 120, 120, 117, 128, 115, 174, 173, 173, 161, 152, 148, 153, 162,
    105, 140, 96, 114, 115, 122, 141, 173, 190, 190, 142, 106, 151, 78, 66, 141,
    110, 117, 123, 136, 118, 124, 127, 114, 173, 175, 166, 155, 155, 159, 159, 158,
];

pub const MEAN_EXPECTED: [u32; 4] = [1940, 2139, 2252, 1813];

/// The first 112 bytes of [`SSE_A`].
pub fn disto_a() -> [u8; 112] {
    let mut a = [0u8; 112];
    a.copy_from_slice(&SSE_A[..112]);
    a
}

/// Alternating 16-byte runs of 28 and 204.
pub fn disto_b() -> [u8; 112] {
    let mut b = [0u8; 112];
    for (i, run) in b.chunks_exact_mut(16).enumerate() {
        run.fill(if i % 2 == 0 { 28 } else { 204 });
    }
    b
}

pub const DISTO_WEIGHTS: [u16; 16] = [38, 32, 20, 9, 32, 28, 17, 7, 20, 17, 10, 4, 9, 7, 4, 2];
