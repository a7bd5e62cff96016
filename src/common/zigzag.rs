//! Zig-zag scan order for 8x8 blocks.

use crate::block::{Block8x8, Block8x8F};

/// Natural-order index stored at each scan position: `ZIGZAG[scan] = natural`.
#[rustfmt::skip]
pub const ZIGZAG: [u8; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Scan position of each natural-order index: `INVERSE_ZIGZAG[natural] = scan`.
pub const INVERSE_ZIGZAG: [u8; 64] = invert(&ZIGZAG);

const fn invert(table: &[u8; 64]) -> [u8; 64] {
    let mut out = [0u8; 64];
    let mut i = 0;
    while i < 64 {
        out[table[i] as usize] = i as u8;
        i += 1;
    }
    out
}

/// Reorders a natural-order block into scan order: `dest[i] = src[ZIGZAG[i]]`.
pub fn apply_zigzag(src: &Block8x8) -> Block8x8 {
    let mut dest = Block8x8::default();
    for (d, &zig) in dest.as_mut_array().iter_mut().zip(ZIGZAG.iter()) {
        *d = src.as_array()[usize::from(zig)];
    }
    dest
}

/// Reorders a scan-order block back into natural order.
pub fn apply_inverse_zigzag(src: &Block8x8) -> Block8x8 {
    let mut dest = Block8x8::default();
    for (&s, &zig) in src.as_array().iter().zip(ZIGZAG.iter()) {
        dest.as_mut_array()[usize::from(zig)] = s;
    }
    dest
}

/// Float variant of [`apply_zigzag`].
pub fn apply_zigzag_f32(src: &Block8x8F) -> Block8x8F {
    let mut dest = Block8x8F::default();
    for (d, &zig) in dest.as_mut_array().iter_mut().zip(ZIGZAG.iter()) {
        *d = src.as_array()[usize::from(zig)];
    }
    dest
}

/// Float variant of [`apply_inverse_zigzag`].
pub fn apply_inverse_zigzag_f32(src: &Block8x8F) -> Block8x8F {
    let mut dest = Block8x8F::default();
    for (&s, &zig) in src.as_array().iter().zip(ZIGZAG.iter()) {
        dest.as_mut_array()[usize::from(zig)] = s;
    }
    dest
}
