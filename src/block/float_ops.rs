//! Arithmetic, transpose and rounding on [`Block8x8F`].
//!
//! Each operation has a scalar kernel here and, with the `simd` feature, an
//! AVX2 kernel in `simd_avx`. Both perform the same IEEE single-precision
//! operations per element, so their outputs are bit-identical.

use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use super::{Block8x8, Block8x8F};
use crate::error::BlockError;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use super::simd_avx;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::common::dispatch::simd_token;

/// Broadcast operation applied with a single scalar operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ScalarOp {
    #[inline(always)]
    pub(crate) fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            ScalarOp::Add => a + b,
            ScalarOp::Sub => a - b,
            ScalarOp::Mul => a * b,
            ScalarOp::Div => a / b,
        }
    }
}

/// Float to integer conversion with truncation toward zero.
///
/// NaN and values outside the `i32` range map to `i32::MIN`, the result the
/// hardware truncating conversion produces for such lanes.
#[inline(always)]
pub(crate) fn truncate_to_i32(v: f32) -> i32 {
    if v >= -2_147_483_648.0 && v < 2_147_483_648.0 {
        v as i32
    } else {
        i32::MIN
    }
}

/// `maxps` lane rule: `a` if `a > b`, else `b`. A NaN in `a` yields `b`.
#[inline(always)]
pub(crate) fn lane_max(a: f32, b: f32) -> f32 {
    if a > b {
        a
    } else {
        b
    }
}

/// `minps` lane rule: `a` if `a < b`, else `b`.
#[inline(always)]
pub(crate) fn lane_min(a: f32, b: f32) -> f32 {
    if a < b {
        a
    } else {
        b
    }
}

// Scalar kernels

pub(crate) fn scalar_op_scalar(data: &mut [f32; 64], op: ScalarOp, value: f32) {
    for v in data.iter_mut() {
        *v = op.apply(*v, value);
    }
}

pub(crate) fn multiply_block_scalar(data: &mut [f32; 64], other: &[f32; 64]) {
    for (v, o) in data.iter_mut().zip(other.iter()) {
        *v *= *o;
    }
}

pub(crate) fn add_block_scalar(data: &mut [f32; 64], other: &[f32; 64]) {
    for (v, o) in data.iter_mut().zip(other.iter()) {
        *v += *o;
    }
}

pub(crate) fn transpose_scalar(src: &[f32; 64], dst: &mut [f32; 64]) {
    for y in 0..8 {
        for x in 0..8 {
            dst[x * 8 + y] = src[y * 8 + x];
        }
    }
}

pub(crate) fn normalize_scalar(data: &mut [f32; 64], offset: f32, maximum: f32, round: bool) {
    for v in data.iter_mut() {
        let clamped = lane_min(lane_max(*v + offset, 0.0), maximum);
        // half away from zero; the value is non-negative here
        *v = if round { clamped.round() } else { clamped };
    }
}

pub(crate) fn round_ties_even_scalar(data: &mut [f32; 64]) {
    for v in data.iter_mut() {
        *v = v.round_ties_even();
    }
}

pub(crate) fn round_to_i16_scalar(src: &[f32; 64], dst: &mut [i16; 64]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        let biased = if s < 0.0 { s - 0.5 } else { s + 0.5 };
        *d = lane_min(lane_max(biased, -32768.0), 32767.0) as i16;
    }
}

pub(crate) fn widen_i16_scalar(src: &[i16; 64], dst: &mut [f32; 64]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = f32::from(s);
    }
}

pub(crate) fn equals_i32_scalar(data: &[f32; 64], value: i32) -> bool {
    data.iter().all(|&v| truncate_to_i32(v) == value)
}

pub(crate) fn last_nonzero_scalar(data: &[f32; 64]) -> i32 {
    for i in (0..64).rev() {
        if truncate_to_i32(data[i]) != 0 {
            return i as i32;
        }
    }
    -1
}

impl Block8x8F {
    fn apply_scalar_op(&mut self, op: ScalarOp, value: f32) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::scalar_op_avx2(token, &mut self.data, op, value);
            return;
        }
        scalar_op_scalar(&mut self.data, op, value);
    }

    /// Multiplies every element by `value`.
    pub fn multiply_in_place(&mut self, value: f32) {
        self.apply_scalar_op(ScalarOp::Mul, value);
    }

    /// Divides every element by `value`.
    pub fn divide_in_place(&mut self, value: f32) {
        self.apply_scalar_op(ScalarOp::Div, value);
    }

    /// Adds `value` to every element.
    pub fn add_in_place(&mut self, value: f32) {
        self.apply_scalar_op(ScalarOp::Add, value);
    }

    /// Subtracts `value` from every element.
    pub fn subtract_in_place(&mut self, value: f32) {
        self.apply_scalar_op(ScalarOp::Sub, value);
    }

    /// Elementwise product with `other`.
    pub fn multiply_in_place_block(&mut self, other: &Block8x8F) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::multiply_block_avx2(token, &mut self.data, &other.data);
            return;
        }
        multiply_block_scalar(&mut self.data, &other.data);
    }

    /// Elementwise sum with `other`.
    pub fn add_in_place_block(&mut self, other: &Block8x8F) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::add_block_avx2(token, &mut self.data, &other.data);
            return;
        }
        add_block_scalar(&mut self.data, &other.data);
    }

    /// Writes the transpose of `self` into `dest`.
    pub fn transpose_into(&self, dest: &mut Block8x8F) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::transpose_avx2(token, &self.data, &mut dest.data);
            return;
        }
        transpose_scalar(&self.data, &mut dest.data);
    }

    /// Returns the transpose of `self`.
    pub fn transpose(&self) -> Block8x8F {
        let mut dest = Block8x8F::default();
        self.transpose_into(&mut dest);
        dest
    }

    /// Transposes in place.
    pub fn transpose_in_place(&mut self) {
        let src = *self;
        src.transpose_into(self);
    }

    fn normalize(&mut self, maximum: f32, round: bool) {
        let offset = (maximum / 2.0).ceil();
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::normalize_avx2(token, &mut self.data, offset, maximum, round);
            return;
        }
        normalize_scalar(&mut self.data, offset, maximum, round);
    }

    /// Level-shifts by `ceil(maximum / 2)` and clamps to `[0, maximum]`.
    pub fn normalize_colors_in_place(&mut self, maximum: f32) {
        self.normalize(maximum, false);
    }

    /// Level-shifts by `ceil(maximum / 2)`, clamps to `[0, maximum]` and rounds
    /// half away from zero.
    ///
    /// This turns a reconstructed sample block back into storable samples, e.g.
    /// `maximum = 255.0` for 8-bit output.
    pub fn normalize_colors_and_round_in_place(&mut self, maximum: f32) {
        self.normalize(maximum, true);
    }

    /// Rounds every element to the nearest integer, ties to even.
    pub fn round_in_place(&mut self) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::round_ties_even_avx2(token, &mut self.data);
            return;
        }
        round_ties_even_scalar(&mut self.data);
    }

    /// Rounds into an integer block: adds -0.5 to negative values and +0.5
    /// otherwise, then truncates, saturating at the `i16` range.
    pub fn round_into(&self, dest: &mut Block8x8) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::round_to_i16_avx2(token, &self.data, &mut dest.data);
            return;
        }
        round_to_i16_scalar(&self.data, &mut dest.data);
    }

    /// [`round_into`](Self::round_into) a new block.
    pub fn round_as_i16_block(&self) -> Block8x8 {
        let mut dest = Block8x8::default();
        self.round_into(&mut dest);
        dest
    }

    /// Converts an integer coefficient block to floats.
    pub fn from_block8x8(source: &Block8x8) -> Block8x8F {
        let mut block = Block8x8F::default();
        block.load_from_block8x8(source);
        block
    }

    /// Overwrites this block with the integer coefficients of `source`.
    pub fn load_from_block8x8(&mut self, source: &Block8x8) {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            simd_avx::widen_i16_avx2(token, &source.data, &mut self.data);
            return;
        }
        widen_i16_scalar(&source.data, &mut self.data);
    }

    /// Builds a block from exactly 64 integers.
    pub fn load_from_i32(source: &[i32]) -> Result<Block8x8F, BlockError> {
        if source.len() != 64 {
            return Err(BlockError::LengthMismatch {
                expected: 64,
                actual: source.len(),
            });
        }
        let mut block = Block8x8F::default();
        for (d, &s) in block.data.iter_mut().zip(source.iter()) {
            *d = s as f32;
        }
        Ok(block)
    }

    /// Exports as integers, truncating toward zero.
    pub fn store_i32(&self, dest: &mut [i32]) -> Result<(), BlockError> {
        if dest.len() != 64 {
            return Err(BlockError::LengthMismatch {
                expected: 64,
                actual: dest.len(),
            });
        }
        for (d, &s) in dest.iter_mut().zip(self.data.iter()) {
            *d = truncate_to_i32(s);
        }
        Ok(())
    }

    /// Exports as bytes, truncating toward zero and saturating to `0..=255`.
    pub fn store_u8(&self, dest: &mut [u8]) -> Result<(), BlockError> {
        if dest.len() != 64 {
            return Err(BlockError::LengthMismatch {
                expected: 64,
                actual: dest.len(),
            });
        }
        for (d, &s) in dest.iter_mut().zip(self.data.iter()) {
            *d = s as u8;
        }
        Ok(())
    }

    /// True if every element, truncated toward zero, equals `value`.
    pub fn equals_scalar(&self, value: i32) -> bool {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            return simd_avx::equals_i32_avx2(token, &self.data, value);
        }
        equals_i32_scalar(&self.data, value)
    }

    /// Highest flat index whose element truncates to a non-zero integer, or
    /// -1 when every element truncates to zero.
    pub fn last_nonzero_index(&self) -> i32 {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(token) = simd_token() {
            return simd_avx::last_nonzero_avx2(token, &self.data);
        }
        last_nonzero_scalar(&self.data)
    }
}

macro_rules! scalar_operator {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl $trait<f32> for Block8x8F {
            type Output = Block8x8F;

            #[inline]
            fn $method(mut self, value: f32) -> Block8x8F {
                self.apply_scalar_op($op, value);
                self
            }
        }

        impl $assign_trait<f32> for Block8x8F {
            #[inline]
            fn $assign_method(&mut self, value: f32) {
                self.apply_scalar_op($op, value);
            }
        }
    };
}

scalar_operator!(Mul, mul, MulAssign, mul_assign, ScalarOp::Mul);
scalar_operator!(Div, div, DivAssign, div_assign, ScalarOp::Div);
scalar_operator!(Add, add, AddAssign, add_assign, ScalarOp::Add);
scalar_operator!(Sub, sub, SubAssign, sub_assign, ScalarOp::Sub);

/// Elementwise product.
impl Mul<&Block8x8F> for Block8x8F {
    type Output = Block8x8F;

    fn mul(mut self, other: &Block8x8F) -> Block8x8F {
        self.multiply_in_place_block(other);
        self
    }
}

/// Elementwise sum.
impl Add<&Block8x8F> for Block8x8F {
    type Output = Block8x8F;

    fn add(mut self, other: &Block8x8F) -> Block8x8F {
        self.add_in_place_block(other);
        self
    }
}
