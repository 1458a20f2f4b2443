//! Numerical backend abstraction layer.
//!
//! This module provides trait-based interfaces for the two engines the
//! FCT solver coordinates, allowing the solver to be backend-agnostic.
//!
//! # Backends
//!
//! - **Native** (default): rustfft complex FFTs wrapped into FFTW-style
//!   REDFT10/REDFT01 plans, executed on a shared rayon pool; tridiagonal
//!   L·D·Lᵀ sweeps and nalgebra vector scaling.
//!
//! # Architecture
//!
//! ```text
//!            FctSolver
//!                │
//!                ▼
//! Backend Trait Layer (TransformEngine, BandedSolver)
//!       ┌────────┴────────┐
//!       ▼                 ▼
//!  R2R plans         Tridiagonal
//!  (rustfft +        factor/solve,
//!   rayon pool)      scaling
//! ```

pub mod alloc;
mod banded;
pub mod native;
mod r2r;
pub mod threading;
pub mod traits;

pub use alloc::{AlignedBuffer, BufferId, SIMD_ALIGN};
pub use native::{NativeBackend, NativePlan};
pub use threading::TransformThreads;
pub use traits::*;

use crate::config::SolverConfig;
use crate::error::Result;

/// Returns the default backend for `config`.
pub fn default_backend(config: &SolverConfig) -> Result<NativeBackend> {
    NativeBackend::new(config)
}
