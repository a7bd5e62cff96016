//! Block transform, quantization and distortion kernels for JPEG and WebP
//! style codecs
//!
//! This crate holds the per-block arithmetic of a lossy image codec. It does
//! not parse bitstreams, entropy code, or convert color; a codec driver feeds
//! it blocks and hands the results to its own entropy coder.
//!
//! # Features
//!
//! - `simd` (default): Runtime-dispatched x86-64-v3 kernels. Every kernel has
//!   a scalar twin that produces identical results.
//! - `unchecked`: Block indexing skips bounds checks in release builds. An
//!   out-of-range index is then undefined behavior; debug builds still
//!   assert. Only enable this when every index is known to be in range.
//!
//! # Blocks
//!
//! [`Block8x8F`] carries float samples or DCT coefficients, [`Block8x8`] and
//! [`Block4x4`] carry 16-bit coefficients. Blocks are plain row-major arrays
//! with value semantics.
//!
//! ```rust
//! use zenblock::{quantize, Block8x8F, QuantTable};
//!
//! let mut coeffs = Block8x8F::splat(40.0);
//! coeffs.transpose_in_place();
//! let table = QuantTable::uniform(16.0)?;
//! let quantized = quantize(&coeffs, &table);
//! assert_eq!(quantized[0], 3);
//! assert_eq!(quantized.last_significant_index(), 63);
//! # Ok::<(), zenblock::BlockError>(())
//! ```
//!
//! # 4x4 transforms and distortion
//!
//! ```rust
//! use zenblock::{forward_transform, sse4x4, transform_one, BPS};
//!
//! let source = [90u8; BPS * 4];
//! let prediction = [80u8; BPS * 4];
//! let coeffs = forward_transform(&source, &prediction, BPS);
//!
//! let mut reconstructed = prediction;
//! transform_one(coeffs.as_array(), &mut reconstructed, BPS);
//! assert_eq!(sse4x4(&source, &reconstructed, BPS), 0);
//! ```
//!
//! # Kernel selection
//!
//! The CPU is probed once per process. [`configure`] may pin the scalar
//! kernels before the first operation runs; [`backend`] reports the choice.
//!
//! # Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` unless `unchecked` is enabled.
//! When the `simd` feature is enabled, we rely on the [`archmage`] crate for
//! safe SIMD intrinsics. The `#[arcane]` proc macro generates unsafe blocks
//! internally (which bypass the `forbid` lint due to proc-macro span handling).
//! The soundness of our SIMD code depends on archmage's token-based safety
//! model being correct.
//!
//! [`archmage`]: https://docs.rs/archmage

// Forbid unsafe unless the "unchecked" feature enables it for performance
#![cfg_attr(not(feature = "unchecked"), forbid(unsafe_code))]
#![deny(missing_docs)]

pub mod block;
pub mod common;
pub mod encoder;
mod error;
pub mod pool;

pub use block::{Block, Block4x4, Block8x8, Block8x8F};
pub use error::BlockError;
pub use pool::{BlockPool, PooledBlock};

pub use common::dispatch::{backend, configure, Backend, SimdPolicy};
pub use common::transform::{
    forward_transform, transform_dc_only, transform_one, transform_two, try_forward_transform,
    try_transform_one, try_transform_two, BPS,
};
pub use common::zigzag::{
    apply_inverse_zigzag, apply_inverse_zigzag_f32, apply_zigzag, apply_zigzag_f32,
    INVERSE_ZIGZAG, ZIGZAG,
};

pub use encoder::cost::{
    disto16x16, disto4x4, disto8x8, mean16x4, sse16x16, sse4x4, sse8x8, try_disto16x16,
    try_disto4x4, try_disto8x8, try_mean16x4, try_sse16x16, try_sse4x4, try_sse8x8,
};
pub use encoder::quantize::{
    dequantize, dequantize_zigzag, quantize, quantize_into, QuantTable, STD_CHROMA_QUANT,
    STD_LUMA_QUANT,
};
