//! Kernels and tables shared between the encode and decode directions

pub mod dispatch;
/// 4x4 integer transforms
pub mod transform;
pub mod zigzag;

pub(crate) mod simd_sse;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod transform_simd_intrinsics;
