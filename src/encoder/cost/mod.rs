//! Cost estimation for rate-distortion decisions.
//!
//! The engine only scores candidates; comparing scores and picking a mode is
//! left to the caller's search.
//!
//! ## Module organization
//!
//! - [`distortion`]: squared-error, quadrant mean and Hadamard distortion metrics

pub mod distortion;

pub use distortion::{
    disto16x16, disto4x4, disto8x8, mean16x4, sse16x16, sse4x4, sse8x8, try_disto16x16,
    try_disto4x4, try_disto8x8, try_mean16x4, try_sse16x16, try_sse4x4, try_sse8x8,
};
