//! Fast cosine transform direct solver for separable elliptic problems.
//!
//! A [`FctSolver`] diagonalises two axes of a structured 3D grid with a
//! DCT-II / DCT-III pair and solves the remaining axis as stacked
//! tridiagonal systems. It is built once per grid shape and applied
//! repeatedly as the preconditioner of an outer iterative method.
//!
//! Numerical work is delegated to the engines behind [`backend`]; the
//! default [`NativeBackend`] runs rustfft-based cosine plans on a shared
//! rayon pool.

pub mod backend;
pub mod config;
pub mod error;
pub mod grid;
pub mod scalar;
pub mod solver;

pub use backend::{
    AlignedBuffer, BandedSolver, BufferId, FctBackend, NativeBackend, NativePlan, PlanDescriptor,
    R2rKind, TransformEngine, TransformPlan, TransformThreads, default_backend,
};
pub use config::{PlannerMode, SolverConfig};
pub use error::{FctError, Result};
pub use grid::GridDims;
pub use scalar::FctScalar;
pub use solver::{CoefficientLoad, FctSolver, FctSolverF32, FctSolverF64};
