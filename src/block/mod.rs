//! Fixed-size coefficient and sample blocks.
//!
//! A [`Block`] is a flat row-major array with value semantics. Lane views used
//! by the vectorized kernels are produced by loads from the flat array; there is
//! no second, aliased representation of the same storage.

use core::fmt;
use core::ops::{Index, IndexMut};

use crate::error::BlockError;

mod coeff;
mod float_ops;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod simd_avx;

pub(crate) use float_ops::{lane_max, lane_min, truncate_to_i32};

/// Square block of `N` elements in row-major order (`N` is 16 or 64).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Block<T, const N: usize> {
    data: [T; N],
}

/// 8x8 block of 16-bit coefficients.
pub type Block8x8 = Block<i16, 64>;
/// 4x4 block of 16-bit coefficients.
pub type Block4x4 = Block<i16, 16>;
/// 8x8 block of 32-bit float samples or coefficients.
pub type Block8x8F = Block<f32, 64>;

impl<T: Copy + Default, const N: usize> Default for Block<T, N> {
    fn default() -> Self {
        Self {
            data: [T::default(); N],
        }
    }
}

impl<T, const N: usize> Block<T, N> {
    /// Number of elements.
    pub const LEN: usize = N;

    /// Row length (and row count).
    pub const WIDTH: usize = match N {
        16 => 4,
        64 => 8,
        _ => panic!("blocks are 4x4 or 8x8"),
    };

    /// Wraps an array without copying.
    #[inline]
    pub const fn from_array(data: [T; N]) -> Self {
        Self { data }
    }

    /// Unwraps the array.
    #[inline]
    pub fn into_array(self) -> [T; N] {
        self.data
    }

    /// Borrows the flat storage.
    #[inline]
    pub const fn as_array(&self) -> &[T; N] {
        &self.data
    }

    /// Mutably borrows the flat storage.
    #[inline]
    pub fn as_mut_array(&mut self) -> &mut [T; N] {
        &mut self.data
    }

    /// Flat index of `(x, y)`.
    #[inline(always)]
    fn flat(x: usize, y: usize) -> usize {
        y * Self::WIDTH + x
    }
}

impl<T: Copy, const N: usize> Block<T, N> {
    /// Block with every element set to `value`.
    #[inline]
    pub fn splat(value: T) -> Self {
        Self { data: [value; N] }
    }

    /// Builds a block from a span of exactly `N` elements.
    pub fn load(source: &[T]) -> Result<Self, BlockError> {
        let data = <[T; N]>::try_from(source).map_err(|_| BlockError::LengthMismatch {
            expected: N,
            actual: source.len(),
        })?;
        Ok(Self { data })
    }

    /// Overwrites this block from a span of exactly `N` elements.
    pub fn load_from(&mut self, source: &[T]) -> Result<(), BlockError> {
        *self = Self::load(source)?;
        Ok(())
    }

    /// Copies the block into a span of exactly `N` elements.
    pub fn store(&self, dest: &mut [T]) -> Result<(), BlockError> {
        if dest.len() != N {
            return Err(BlockError::LengthMismatch {
                expected: N,
                actual: dest.len(),
            });
        }
        dest.copy_from_slice(&self.data);
        Ok(())
    }

    /// Element at flat index `idx`, or `None` past the end.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<T> {
        self.data.get(idx).copied()
    }

    /// Element at column `x`, row `y`, or `None` outside the block.
    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> Option<T> {
        if x < Self::WIDTH && y < Self::WIDTH {
            Some(self.data[Self::flat(x, y)])
        } else {
            None
        }
    }

    /// Writes `value` at flat index `idx`.
    pub fn try_set(&mut self, idx: usize, value: T) -> Result<(), BlockError> {
        let slot = self
            .data
            .get_mut(idx)
            .ok_or(BlockError::IndexOutOfBounds { index: idx, len: N })?;
        *slot = value;
        Ok(())
    }

    /// Sets every element to `value`.
    #[inline]
    pub fn fill(&mut self, value: T) {
        self.data = [value; N];
    }

    /// Copies the elements into a new `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.to_vec()
    }
}

// In `unchecked` builds indexing trusts the caller; an out-of-range index is
// undefined behavior there. Every other build panics.
impl<T, const N: usize> Index<usize> for Block<T, N> {
    type Output = T;

    #[inline(always)]
    fn index(&self, idx: usize) -> &T {
        #[cfg(feature = "unchecked")]
        {
            debug_assert!(idx < N, "block index {idx} out of bounds for {N}");
            // SAFETY: `unchecked` shifts the bounds contract to the caller.
            unsafe { self.data.get_unchecked(idx) }
        }
        #[cfg(not(feature = "unchecked"))]
        {
            &self.data[idx]
        }
    }
}

impl<T, const N: usize> IndexMut<usize> for Block<T, N> {
    #[inline(always)]
    fn index_mut(&mut self, idx: usize) -> &mut T {
        #[cfg(feature = "unchecked")]
        {
            debug_assert!(idx < N, "block index {idx} out of bounds for {N}");
            // SAFETY: `unchecked` shifts the bounds contract to the caller.
            unsafe { self.data.get_unchecked_mut(idx) }
        }
        #[cfg(not(feature = "unchecked"))]
        {
            &mut self.data[idx]
        }
    }
}

/// `(x, y)` addressing: column `x`, row `y`.
impl<T, const N: usize> Index<(usize, usize)> for Block<T, N> {
    type Output = T;

    #[inline(always)]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        #[cfg(not(feature = "unchecked"))]
        assert!(
            x < Self::WIDTH && y < Self::WIDTH,
            "block position ({x}, {y}) out of bounds for width {}",
            Self::WIDTH
        );
        &self[Self::flat(x, y)]
    }
}

impl<T, const N: usize> IndexMut<(usize, usize)> for Block<T, N> {
    #[inline(always)]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        #[cfg(not(feature = "unchecked"))]
        assert!(
            x < Self::WIDTH && y < Self::WIDTH,
            "block position ({x}, {y}) out of bounds for width {}",
            Self::WIDTH
        );
        &mut self[Self::flat(x, y)]
    }
}

impl<T: fmt::Display, const N: usize> fmt::Display for Block<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for Block<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block{}x{} [", Self::WIDTH, Self::WIDTH)?;
        for row in self.data.chunks_exact(Self::WIDTH) {
            writeln!(f, "    {row:?}")?;
        }
        f.write_str("]")
    }
}

impl<T, const N: usize> From<[T; N]> for Block<T, N> {
    fn from(data: [T; N]) -> Self {
        Self { data }
    }
}
