//! Backend trait definitions for the transform and banded engines.
//!
//! These traits abstract over the concrete numerical libraries the solver
//! drives: a real-to-real transform engine (plan creation, bound and
//! new-array execution, plan destruction, worker threads, aligned memory)
//! and a banded linear-algebra engine (tridiagonal factor/solve, scaling).

use super::alloc::AlignedBuffer;
use crate::error::{FctError, Result};
use crate::grid::GridDims;
use crate::scalar::FctScalar;

/// Real-to-real transform kinds, named after their FFTW counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum R2rKind {
    /// DCT-II, `Y_k = 2 Σ x_j cos(π(j+½)k/n)`
    Redft10,
    /// DCT-III, `Y_k = x_0 + 2 Σ_{j≥1} x_j cos(πj(k+½)/n)`
    Redft01,
}

impl R2rKind {
    /// FFTW identifier for this kind.
    pub fn fftw_name(&self) -> &'static str {
        match self {
            R2rKind::Redft10 => "REDFT10",
            R2rKind::Redft01 => "REDFT01",
        }
    }

    /// The kind that undoes this one (up to a factor of 2n).
    pub fn inverse(&self) -> Self {
        match self {
            R2rKind::Redft10 => R2rKind::Redft01,
            R2rKind::Redft01 => R2rKind::Redft10,
        }
    }
}

/// Layout of a batched, multi-dimensional real-to-real transform.
///
/// `howmany` transforms of shape `dims` (row-major) are interleaved in one
/// buffer: element `flat` of batch `b` sits at `b * dist + flat * stride`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDescriptor {
    /// Transform extents, one per axis (rank = `dims.len()`)
    pub dims: Vec<usize>,
    /// Number of transforms executed per plan call
    pub howmany: usize,
    /// Distance between consecutive elements of one transform
    pub stride: usize,
    /// Distance between the first elements of consecutive transforms
    pub dist: usize,
    /// Transform kind along each axis
    pub kinds: Vec<R2rKind>,
}

impl PlanDescriptor {
    /// Rank-2 cosine transform over the M and N axes of `grid`, batched
    /// over the contiguous P axis.
    pub fn cosine_2d(grid: GridDims, kind: R2rKind) -> Self {
        Self {
            dims: vec![grid.m, grid.n],
            howmany: grid.p,
            stride: grid.p,
            dist: 1,
            kinds: vec![kind; 2],
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements in one transform.
    pub fn transform_size(&self) -> usize {
        self.dims.iter().product()
    }

    /// Number of elements touched by one plan execution.
    pub fn total_elements(&self) -> usize {
        self.howmany * self.transform_size()
    }

    /// Smallest buffer length that holds every element the plan touches.
    pub fn required_len(&self) -> usize {
        (self.howmany - 1) * self.dist + (self.transform_size() - 1) * self.stride + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.dims.is_empty() {
            return Err(FctError::Plan("rank must be at least 1".into()));
        }
        if self.kinds.len() != self.dims.len() {
            return Err(FctError::Plan(format!(
                "{} transform kinds given for rank {}",
                self.kinds.len(),
                self.dims.len()
            )));
        }
        if self.dims.contains(&0) {
            return Err(FctError::Plan(format!("zero extent in {:?}", self.dims)));
        }
        if self.howmany == 0 || self.stride == 0 {
            return Err(FctError::Plan(
                "howmany and stride must be positive".into(),
            ));
        }
        if self.howmany > 1 && self.dist == 0 {
            return Err(FctError::Plan("batched plan needs a positive dist".into()));
        }
        Ok(())
    }
}

/// An executable transform plan bound to one buffer.
///
/// Dropping the plan destroys it.
pub trait TransformPlan<T: FctScalar>: Send {
    fn descriptor(&self) -> &PlanDescriptor;

    /// Length of the buffer the plan was created against.
    fn len(&self) -> usize;

    /// Whether `buffer` is the buffer this plan was created against.
    fn is_bound_to(&self, buffer: &AlignedBuffer<T>) -> bool;

    /// Executes in place on the bound buffer.
    ///
    /// Returns [`FctError::UnboundBuffer`] for any other buffer.
    fn execute(&mut self, buffer: &mut AlignedBuffer<T>) -> Result<()>;

    /// Executes in place on an arbitrary buffer of the bound length.
    fn execute_new_array(&self, data: &mut [T]) -> Result<()>;
}

/// Trait for a real-to-real transform engine.
pub trait TransformEngine<T: FctScalar>: Send + Sync {
    type Plan: TransformPlan<T>;

    /// Allocates a buffer suitable for bound plan execution.
    fn allocate(&self, len: usize) -> Result<AlignedBuffer<T>> {
        AlignedBuffer::zeroed(len)
    }

    /// Creates a plan bound to `buffer`. May be expensive; plans are meant
    /// to be reused.
    fn create_plan(&self, desc: &PlanDescriptor, buffer: &AlignedBuffer<T>)
    -> Result<Self::Plan>;

    /// Number of worker threads plan execution may use.
    fn threads(&self) -> usize;

    /// Runs `op` inside the engine's worker pool.
    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send;
}

/// Trait for a banded linear-algebra engine.
///
/// The tridiagonal routines follow LAPACK `?pttrf` / `?pttrs`: the matrix
/// is symmetric with diagonal `d` and off-diagonal `e` (`e[i]` couples rows
/// `i` and `i + 1`), and is factored in place as L·D·Lᵀ.
pub trait BandedSolver<T: FctScalar>: Send + Sync {
    /// Factors the tridiagonal matrix in place. The system size is
    /// `d.len()`; `e` must hold at least `d.len() - 1` entries.
    fn factor_tridiagonal(&self, d: &mut [T], e: &mut [T]) -> Result<()>;

    /// Solves with a factorization from [`Self::factor_tridiagonal`],
    /// overwriting `b` with the solution.
    fn solve_tridiagonal(&self, d: &[T], e: &[T], b: &mut [T]) -> Result<()>;

    /// `x *= alpha`
    fn scale(&self, alpha: T, x: &mut [T]);
}

/// Combined backend providing both engines.
pub trait FctBackend<T: FctScalar>: TransformEngine<T> + BandedSolver<T> {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;
}
