//! Fast-cosine-transform preconditioner for separable elliptic problems.
//!
//! On an M×N×P grid whose operator separates as
//!
//! ```text
//! A = Lx ⊗ I ⊗ I + I ⊗ Ly ⊗ I + (per-mode tridiagonal along P)
//! ```
//!
//! with Neumann-type `Lx`, `Ly`, a 2D DCT-II over the M and N axes turns
//! the 3D solve into M·N independent tridiagonal solves along P. A DCT-III
//! brings the solution back to physical space.
//!
//! # Normalization
//!
//! The transforms are unnormalised (REDFT10 followed by REDFT01 multiplies
//! each axis by 2n). [`FctSolver::fct_forward`] scales by 1/4 and
//! [`FctSolver::fct_backward`] by 1/(M·N), so forward → backward is the
//! identity.
//!
//! # Example
//!
//! ```no_run
//! use fct_solver::FctSolverF64;
//!
//! # fn main() -> fct_solver::Result<()> {
//! let (m, n, p) = (8, 8, 16);
//! let len = m * n * p;
//! let mut solver = FctSolverF64::new(m, n, p)?;
//! solver.set_trid_solver_data(&vec![0.0; len], &vec![1.0; len], &vec![0.0; len])?;
//!
//! let mut rhs = vec![1.0; len];
//! solver.precond_solver(&mut rhs)?;
//! # Ok(())
//! # }
//! ```

use crate::backend::{
    AlignedBuffer, FctBackend, NativeBackend, PlanDescriptor, R2rKind, TransformPlan,
    default_backend,
};
use crate::config::SolverConfig;
use crate::error::{FctError, Result};
use crate::grid::GridDims;
use crate::scalar::{FctScalar, from_f64};
use log::{debug, error, trace, warn};
use rayon::prelude::*;

/// Outcome of [`FctSolver::set_trid_solver_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientLoad {
    /// First load on this solver
    Loaded,
    /// A previous factorization was discarded
    Replaced,
}

/// Solver-owned copy of the stacked tridiagonal systems.
struct TridiagonalCoefficients<T> {
    /// Sub-diagonal as supplied
    sub: Vec<T>,
    /// D of the L·D·Lᵀ factorization
    diag: Vec<T>,
    /// Multipliers of L (factored super-diagonal)
    upper: Vec<T>,
    /// No coupling between consecutive P-blocks
    decoupled: bool,
}

/// FCT direct solver for one grid shape.
///
/// Owns the residual buffer the transform plans are bound to, both plans,
/// and the factored tridiagonal coefficients.
pub struct FctSolver<T: FctScalar, B: FctBackend<T> = NativeBackend> {
    // Fields drop in order: backward plan, forward plan, buffers, and
    // finally the backend with its thread-state handle.
    backward: B::Plan,
    forward: B::Plan,
    resi: AlignedBuffer<T>,
    coefficients: Option<TridiagonalCoefficients<T>>,
    dims: GridDims,
    backend: B,
}

pub type FctSolverF32 = FctSolver<f32>;
pub type FctSolverF64 = FctSolver<f64>;

impl<T: FctScalar> FctSolver<T> {
    /// Creates a solver for an `m × n × p` grid with the default config.
    pub fn new(m: usize, n: usize, p: usize) -> Result<Self> {
        Self::with_config(GridDims::new(m, n, p)?, &SolverConfig::default())
    }

    pub fn with_config(dims: GridDims, config: &SolverConfig) -> Result<Self> {
        Self::with_backend(dims, default_backend(config)?)
    }
}

impl<T: FctScalar, B: FctBackend<T>> FctSolver<T, B> {
    /// Allocates the residual buffer and builds the forward (REDFT10) and
    /// backward (REDFT01) plans against it.
    pub fn with_backend(dims: GridDims, backend: B) -> Result<Self> {
        let resi = backend.allocate(dims.len())?;
        let forward =
            backend.create_plan(&PlanDescriptor::cosine_2d(dims, R2rKind::Redft10), &resi)?;
        let backward =
            backend.create_plan(&PlanDescriptor::cosine_2d(dims, R2rKind::Redft01), &resi)?;

        debug!(
            "FCT solver {} ({}) ready: backend {}, {} threads",
            dims,
            T::PRECISION,
            backend.name(),
            backend.threads()
        );

        Ok(Self {
            backward,
            forward,
            resi,
            coefficients: None,
            dims,
            backend,
        })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The solver-owned buffer the plans are bound to.
    pub fn residual(&self) -> &[T] {
        &self.resi
    }

    pub fn residual_mut(&mut self) -> &mut [T] {
        &mut self.resi
    }

    pub fn has_coefficients(&self) -> bool {
        self.coefficients.is_some()
    }

    /// The sub-diagonal from the last successful load, unmodified.
    pub fn sub_diagonal(&self) -> Option<&[T]> {
        self.coefficients.as_ref().map(|c| c.sub.as_slice())
    }

    fn forward_scale(&self) -> T {
        from_f64(0.25)
    }

    fn backward_scale(&self) -> T {
        from_f64(1.0 / self.dims.transform_len() as f64)
    }

    /// Forward transform of a caller buffer of length M·N·P, scaled by 1/4.
    pub fn fct_forward(&mut self, v: &mut [T]) -> Result<()> {
        self.dims.check_len(v.len())?;
        trace!("forward transform on caller buffer (new-array path)");
        self.forward.execute_new_array(v)?;
        self.backend.scale(self.forward_scale(), v);
        Ok(())
    }

    /// Backward transform of a caller buffer of length M·N·P, scaled by
    /// 1/(M·N).
    pub fn fct_backward(&mut self, v: &mut [T]) -> Result<()> {
        self.dims.check_len(v.len())?;
        trace!("backward transform on caller buffer (new-array path)");
        self.backward.execute_new_array(v)?;
        self.backend.scale(self.backward_scale(), v);
        Ok(())
    }

    /// [`Self::fct_forward`] on the residual buffer through the bound plan.
    pub fn fct_forward_residual(&mut self) -> Result<()> {
        trace!("forward transform on residual buffer (bound path)");
        let alpha = self.forward_scale();
        self.forward.execute(&mut self.resi)?;
        self.backend.scale(alpha, &mut self.resi);
        Ok(())
    }

    /// [`Self::fct_backward`] on the residual buffer through the bound plan.
    pub fn fct_backward_residual(&mut self) -> Result<()> {
        trace!("backward transform on residual buffer (bound path)");
        let alpha = self.backward_scale();
        self.backward.execute(&mut self.resi)?;
        self.backend.scale(alpha, &mut self.resi);
        Ok(())
    }

    /// Loads and factors the M·N stacked tridiagonal systems.
    ///
    /// All three slices have length M·N·P; entry `i` of `du` couples
    /// unknowns `i` and `i + 1` along P. The slices are copied, so the
    /// caller keeps ownership of its data. The system is treated as
    /// symmetric: only `d` and `du` enter the factorization, `dl` is kept
    /// as supplied.
    ///
    /// Loading twice is allowed; the previous factorization is discarded
    /// with a warning. If factorization fails the solver is left without
    /// coefficients.
    pub fn set_trid_solver_data(&mut self, dl: &[T], d: &[T], du: &[T]) -> Result<CoefficientLoad> {
        for len in [dl.len(), d.len(), du.len()] {
            self.dims.check_len(len)?;
        }

        let status = if self.coefficients.take().is_some() {
            warn!("tridiagonal coefficients were already loaded; previous factorization discarded");
            CoefficientLoad::Replaced
        } else {
            CoefficientLoad::Loaded
        };

        let n = d.len();
        if dl[..n - 1] != du[..n - 1] {
            warn!("sub- and super-diagonal differ; solving with the super-diagonal only");
        }

        let p = self.dims.line_len();
        let decoupled = (1..self.dims.transform_len()).all(|block| du[block * p - 1] == T::zero());

        let mut diag = d.to_vec();
        let mut upper = du.to_vec();
        factor_modes(&self.backend, p, &mut diag, &mut upper, decoupled)?;

        debug!(
            "factored {} tridiagonal systems of length {}{}",
            self.dims.transform_len(),
            p,
            if decoupled { "" } else { " (coupled chain)" }
        );

        self.coefficients = Some(TridiagonalCoefficients {
            sub: dl.to_vec(),
            diag,
            upper,
            decoupled,
        });
        Ok(status)
    }

    fn require_coefficients(&self) -> Result<&TridiagonalCoefficients<T>> {
        self.coefficients.as_ref().ok_or_else(|| {
            error!("tridiagonal coefficients have not been loaded; nothing to do");
            FctError::CoefficientsNotLoaded
        })
    }

    /// Applies the preconditioner to `rhs` in place: forward transform,
    /// per-mode tridiagonal solve, backward transform.
    ///
    /// Without loaded coefficients this returns
    /// [`FctError::CoefficientsNotLoaded`] and leaves `rhs` untouched.
    pub fn precond_solver(&mut self, rhs: &mut [T]) -> Result<()> {
        self.require_coefficients()?;
        self.dims.check_len(rhs.len())?;

        self.fct_forward(rhs)?;
        let coefficients = self.require_coefficients()?;
        solve_modes(&self.backend, coefficients, self.dims.line_len(), rhs)?;
        self.fct_backward(rhs)
    }

    /// [`Self::precond_solver`] on the residual buffer through the bound
    /// plans.
    pub fn precond_residual(&mut self) -> Result<()> {
        self.require_coefficients()?;

        self.fct_forward_residual()?;
        let p = self.dims.line_len();
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(FctError::CoefficientsNotLoaded)?;
        solve_modes(&self.backend, coefficients, p, self.resi.as_mut_slice())?;
        self.fct_backward_residual()
    }
}

impl<T: FctScalar, B: FctBackend<T>> Drop for FctSolver<T, B> {
    fn drop(&mut self) {
        debug!("releasing FCT solver {} ({})", self.dims, T::PRECISION);
    }
}

fn factor_modes<T: FctScalar, B: FctBackend<T>>(
    backend: &B,
    p: usize,
    diag: &mut [T],
    upper: &mut [T],
    decoupled: bool,
) -> Result<()> {
    if !decoupled {
        return backend.factor_tridiagonal(diag, upper);
    }

    backend.install(|| {
        diag.par_chunks_mut(p)
            .zip(upper.par_chunks_mut(p))
            .enumerate()
            .try_for_each(|(block, (d, e))| {
                backend.factor_tridiagonal(d, e).map_err(|err| match err {
                    FctError::SingularPivot { index } => FctError::SingularPivot {
                        index: block * p + index,
                    },
                    other => other,
                })
            })
    })
}

fn solve_modes<T: FctScalar, B: FctBackend<T>>(
    backend: &B,
    coefficients: &TridiagonalCoefficients<T>,
    p: usize,
    data: &mut [T],
) -> Result<()> {
    if !coefficients.decoupled {
        return backend.solve_tridiagonal(&coefficients.diag, &coefficients.upper, data);
    }

    backend.install(|| {
        data.par_chunks_mut(p)
            .zip(coefficients.diag.par_chunks(p))
            .zip(coefficients.upper.par_chunks(p))
            .try_for_each(|((rhs, d), e)| backend.solve_tridiagonal(d, e, rhs))
    })
}
