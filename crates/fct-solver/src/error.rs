//! Error types for fct-solver

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FctError>;

#[derive(Error, Debug)]
pub enum FctError {
    #[error("Invalid grid dimensions: {m} x {n} x {p} (every extent must be positive)")]
    InvalidDimensions { m: usize, n: usize, p: usize },

    #[error("Aligned allocation of {elements} elements ({bytes} bytes) failed")]
    Allocation { elements: usize, bytes: usize },

    #[error("Plan error: {0}")]
    Plan(String),

    #[error("Buffer length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Buffer is not the one this plan was created against")]
    UnboundBuffer,

    #[error("Tridiagonal coefficients have not been loaded")]
    CoefficientsNotLoaded,

    #[error("Zero or non-finite pivot at row {index} in tridiagonal factorization")]
    SingularPivot { index: usize },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
