//! Distortion metrics scored by rate-distortion search.
//!
//! ## Key functions
//!
//! - [`sse4x4`], [`sse8x8`], [`sse16x16`]: sum of squared differences
//! - [`mean16x4`]: per-quadrant sums of a 16x4 strip
//! - [`disto4x4`], [`disto8x8`], [`disto16x16`]: weighted Hadamard distortion
//!
//! Every function reads both regions at `stride` bytes per row and panics if
//! a region is too short. The `try_` variants report
//! [`BlockError::RegionTooSmall`] instead.

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::common::dispatch::simd_token;
use crate::common::simd_sse;
use crate::error::{check_region, BlockError};

/// Sum of squared differences over a 4x4 region.
#[inline]
pub fn sse4x4(a: &[u8], b: &[u8], stride: usize) -> u32 {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        return simd_sse::sse4x4_sse2(token, a, b, stride);
    }
    simd_sse::sse4x4_scalar(a, b, stride)
}

/// Sum of squared differences over an 8x8 region.
pub fn sse8x8(a: &[u8], b: &[u8], stride: usize) -> u32 {
    let mut sum = 0;
    for y in 0..2 {
        for x in 0..2 {
            let offset = y * 4 * stride + x * 4;
            sum += sse4x4(&a[offset..], &b[offset..], stride);
        }
    }
    sum
}

/// Sum of squared differences over a 16x16 region.
#[inline]
pub fn sse16x16(a: &[u8], b: &[u8], stride: usize) -> u32 {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        return simd_sse::sse16x16_sse2(token, a, b, stride);
    }
    simd_sse::sse16x16_scalar(a, b, stride)
}

/// Sums of the four 4x4 quadrants of a 16-wide, 4-tall region, left to right.
#[inline]
pub fn mean16x4(input: &[u8], stride: usize) -> [u32; 4] {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        return simd_sse::mean16x4_ssse3(token, input, stride);
    }
    simd_sse::mean16x4_scalar(input, stride)
}

/// Spectral distortion between two 4x4 blocks.
///
/// Returns `|T(b) - T(a)| >> 5`, where `T` is the sum of the absolute 4x4
/// Walsh-Hadamard coefficients, each multiplied by its weight. `w` is in
/// natural order: `w[4 * v + h]` weighs vertical frequency `v` and
/// horizontal frequency `h`. Any `u16` weight is accepted.
#[inline]
pub fn disto4x4(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> i32 {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(token) = simd_token() {
        return simd_sse::disto4x4_sse2(token, a, b, stride, w);
    }
    simd_sse::disto4x4_scalar(a, b, stride, w)
}

/// [`disto4x4`] summed over the four sub-blocks of an 8x8 region.
pub fn disto8x8(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> i32 {
    disto_grid(a, b, stride, w, 2)
}

/// [`disto4x4`] summed over the sixteen sub-blocks of a 16x16 region.
pub fn disto16x16(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> i32 {
    disto_grid(a, b, stride, w, 4)
}

fn disto_grid(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16], blocks: usize) -> i32 {
    let mut d = 0i32;
    for y in 0..blocks {
        for x in 0..blocks {
            let offset = y * 4 * stride + x * 4;
            d += disto4x4(&a[offset..], &b[offset..], stride, w);
        }
    }
    d
}

fn check_pair(a: &[u8], b: &[u8], rows: usize, width: usize, stride: usize) -> Result<(), BlockError> {
    check_region(a.len(), rows, width, stride)?;
    check_region(b.len(), rows, width, stride)
}

/// Checked [`sse4x4`].
pub fn try_sse4x4(a: &[u8], b: &[u8], stride: usize) -> Result<u32, BlockError> {
    check_pair(a, b, 4, 4, stride)?;
    Ok(sse4x4(a, b, stride))
}

/// Checked [`sse8x8`].
pub fn try_sse8x8(a: &[u8], b: &[u8], stride: usize) -> Result<u32, BlockError> {
    check_pair(a, b, 8, 8, stride)?;
    Ok(sse8x8(a, b, stride))
}

/// Checked [`sse16x16`].
pub fn try_sse16x16(a: &[u8], b: &[u8], stride: usize) -> Result<u32, BlockError> {
    check_pair(a, b, 16, 16, stride)?;
    Ok(sse16x16(a, b, stride))
}

/// Checked [`mean16x4`].
pub fn try_mean16x4(input: &[u8], stride: usize) -> Result<[u32; 4], BlockError> {
    check_region(input.len(), 4, 16, stride)?;
    Ok(mean16x4(input, stride))
}

/// Checked [`disto4x4`].
pub fn try_disto4x4(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> Result<i32, BlockError> {
    check_pair(a, b, 4, 4, stride)?;
    Ok(disto4x4(a, b, stride, w))
}

/// Checked [`disto8x8`].
pub fn try_disto8x8(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> Result<i32, BlockError> {
    check_pair(a, b, 8, 8, stride)?;
    Ok(disto8x8(a, b, stride, w))
}

/// Checked [`disto16x16`].
pub fn try_disto16x16(a: &[u8], b: &[u8], stride: usize, w: &[u16; 16]) -> Result<i32, BlockError> {
    check_pair(a, b, 16, 16, stride)?;
    Ok(disto16x16(a, b, stride, w))
}
