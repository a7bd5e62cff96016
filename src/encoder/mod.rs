//! Encode-side operators: quantization and rate-distortion scoring

pub mod cost;
/// Quantization tables and coefficient quantization
pub mod quantize;

pub use cost::{
    disto16x16, disto4x4, disto8x8, mean16x4, sse16x16, sse4x4, sse8x8, try_disto16x16,
    try_disto4x4, try_disto8x8, try_mean16x4, try_sse16x16, try_sse4x4, try_sse8x8,
};
pub use quantize::{dequantize, dequantize_zigzag, quantize, quantize_into, QuantTable};
