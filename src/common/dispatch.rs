//! Process-wide kernel selection.
//!
//! The CPU is probed once, on first use, and the resulting archmage token is
//! cached for the lifetime of the process. Every dispatched operation reads the
//! cached token and picks its SIMD or scalar kernel from it, so no operation
//! re-tests capability flags on its own.

use std::sync::OnceLock;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use archmage::{SimdToken, X64V3Token};

use crate::error::BlockError;

/// Type alias for the token carried into SIMD kernels.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) type SimdTokenType = Option<X64V3Token>;

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
pub(crate) type SimdTokenType = Option<()>;

static SIMD_TOKEN: OnceLock<SimdTokenType> = OnceLock::new();

/// Kernel family in effect for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Backend {
    /// AVX2 + FMA + BMI (x86-64-v3) kernels.
    X64V3,
    /// Portable scalar kernels.
    Scalar,
}

/// How the backend is chosen on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimdPolicy {
    /// Use the best kernels the CPU supports.
    #[default]
    Auto,
    /// Always use the scalar kernels.
    ScalarOnly,
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn detect() -> SimdTokenType {
    X64V3Token::summon()
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
fn detect() -> SimdTokenType {
    None
}

fn backend_of(token: &SimdTokenType) -> Backend {
    if token.is_some() {
        Backend::X64V3
    } else {
        Backend::Scalar
    }
}

fn probe(policy: SimdPolicy) -> SimdTokenType {
    let token = match policy {
        SimdPolicy::Auto => detect(),
        SimdPolicy::ScalarOnly => None,
    };
    log::debug!(
        "zenblock: using {:?} kernels (policy {:?})",
        backend_of(&token),
        policy
    );
    token
}

/// Cached token, probing with [`SimdPolicy::Auto`] on first call.
#[inline]
pub(crate) fn simd_token() -> SimdTokenType {
    *SIMD_TOKEN.get_or_init(|| probe(SimdPolicy::Auto))
}

/// Returns the backend every dispatched operation uses.
pub fn backend() -> Backend {
    backend_of(&simd_token())
}

/// Chooses the backend before any operation has run.
///
/// The selection is made once per process. Calling this after the backend is
/// fixed succeeds when the request is compatible with it (`Auto` always is,
/// `ScalarOnly` only if the scalar kernels are already in use) and fails with
/// [`BlockError::BackendAlreadySelected`] otherwise.
pub fn configure(policy: SimdPolicy) -> Result<Backend, BlockError> {
    let mut initialized_here = false;
    let token = *SIMD_TOKEN.get_or_init(|| {
        initialized_here = true;
        probe(policy)
    });
    let current = backend_of(&token);
    if initialized_here || policy == SimdPolicy::Auto || current == Backend::Scalar {
        return Ok(current);
    }
    Err(BlockError::BackendAlreadySelected { current })
}
