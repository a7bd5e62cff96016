use thiserror::Error;

use crate::common::dispatch::Backend;

/// Precondition violations reported by the checked block operations.
///
/// Hot-path functions with fixed-size array arguments cannot fail and panic on
/// an undersized pixel region instead; their `try_` counterparts return
/// [`BlockError::RegionTooSmall`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum BlockError {
    /// A span handed to `load`/`store` does not hold exactly one block.
    #[error("Length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch {
        /// Element count of the block.
        expected: usize,
        /// Length of the supplied span.
        actual: usize,
    },

    /// Flat or 2-D index outside the block.
    #[error("Index {index} out of bounds for block of {len} elements")]
    IndexOutOfBounds {
        /// Requested flat index.
        index: usize,
        /// Element count of the block.
        len: usize,
    },

    /// A quantization table entry is zero, negative, NaN or infinite.
    #[error("Quantization step at position {index} must be finite and positive, got {value}")]
    NonPositiveQuantStep {
        /// Natural-order position of the entry.
        index: usize,
        /// Offending value.
        value: f32,
    },

    /// A strided pixel region is too short for the requested block.
    #[error("Pixel region too small: need {required} bytes, got {actual}")]
    RegionTooSmall {
        /// Minimum length in bytes.
        required: usize,
        /// Supplied length in bytes.
        actual: usize,
    },

    /// `configure` was called after the kernel backend had been selected.
    #[error("SIMD backend already selected as {current:?}")]
    BackendAlreadySelected {
        /// The backend in effect for the rest of the process.
        current: Backend,
    },
}

/// Returns `RegionTooSmall` unless `len` covers `rows` rows of `width` bytes at `stride`.
///
/// A region whose size overflows `usize` reports `required: usize::MAX`.
#[inline]
pub(crate) fn check_region(
    len: usize,
    rows: usize,
    width: usize,
    stride: usize,
) -> Result<(), BlockError> {
    let required = rows
        .saturating_sub(1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(width))
        .unwrap_or(usize::MAX);
    if len < required {
        return Err(BlockError::RegionTooSmall {
            required,
            actual: len,
        });
    }
    Ok(())
}
