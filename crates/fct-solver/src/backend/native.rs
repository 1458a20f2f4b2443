//! Native backend using rustfft, rayon and nalgebra.
//!
//! This is the default backend. It supports:
//! - Batched multi-dimensional REDFT10/REDFT01 plans, executed in parallel
//!   on the process-wide worker pool
//! - Symmetric tridiagonal L·D·Lᵀ factor/solve
//! - Vector scaling through nalgebra views

use super::alloc::{AlignedBuffer, BufferId};
use super::banded;
use super::r2r::{CosineKernel, Planner};
use super::threading::TransformThreads;
use super::traits::*;
use crate::config::{PlannerMode, SolverConfig};
use crate::error::{FctError, Result};
use crate::scalar::FctScalar;
use log::debug;
use nalgebra::DVectorViewMut;
use rayon::ThreadPool;
use rayon::prelude::*;
use std::sync::Arc;

/// Native solver backend.
pub struct NativeBackend {
    threads: TransformThreads,
    planner: PlannerMode,
}

impl NativeBackend {
    /// Initialises the global transform thread state for this backend.
    pub fn new(config: &SolverConfig) -> Result<Self> {
        let threads = TransformThreads::acquire(config.resolved_threads())?;
        Ok(Self {
            threads,
            planner: config.planner,
        })
    }

    pub fn planner(&self) -> PlannerMode {
        self.planner
    }
}

/// Plan produced by [`NativeBackend`].
pub struct NativePlan<T: FctScalar> {
    descriptor: PlanDescriptor,
    kernels: Vec<CosineKernel<T>>,
    bound: BufferId,
    len: usize,
    // gather scratch reserved for bound execution
    lines: Vec<T>,
    pool: Arc<ThreadPool>,
}

impl<T: FctScalar> NativePlan<T> {
    fn run(&self, data: &mut [T], lines: &mut [T]) {
        let desc = &self.descriptor;
        let howmany = desc.howmany;

        self.pool.install(|| {
            for (axis, kernel) in self.kernels.iter().enumerate() {
                let n = kernel.len();
                let inner: usize = desc.dims[axis + 1..].iter().product();
                let step = desc.stride * inner;
                // line l = (o * inner + q) * howmany + b
                let origin = |l: usize| {
                    let b = l % howmany;
                    let rest = l / howmany;
                    let (o, q) = (rest / inner, rest % inner);
                    b * desc.dist + desc.stride * (o * n * inner + q)
                };

                let src: &[T] = data;
                lines.par_chunks_mut(n).enumerate().for_each_init(
                    || kernel.workspace(),
                    |ws, (l, line)| {
                        let base = origin(l);
                        for (j, v) in line.iter_mut().enumerate() {
                            *v = src[base + j * step];
                        }
                        kernel.process(line, ws);
                    },
                );

                for (l, line) in lines.chunks(n).enumerate() {
                    let base = origin(l);
                    for (j, &v) in line.iter().enumerate() {
                        data[base + j * step] = v;
                    }
                }
            }
        });
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.len {
            return Err(FctError::ShapeMismatch {
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }
}

impl<T: FctScalar> TransformPlan<T> for NativePlan<T> {
    fn descriptor(&self) -> &PlanDescriptor {
        &self.descriptor
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_bound_to(&self, buffer: &AlignedBuffer<T>) -> bool {
        buffer.id() == self.bound
    }

    fn execute(&mut self, buffer: &mut AlignedBuffer<T>) -> Result<()> {
        if !self.is_bound_to(buffer) {
            return Err(FctError::UnboundBuffer);
        }
        let mut lines = std::mem::take(&mut self.lines);
        self.run(buffer.as_mut_slice(), &mut lines);
        self.lines = lines;
        Ok(())
    }

    fn execute_new_array(&self, data: &mut [T]) -> Result<()> {
        self.check_len(data.len())?;
        let mut lines = vec![T::zero(); self.descriptor.total_elements()];
        self.run(data, &mut lines);
        Ok(())
    }
}

impl<T: FctScalar> Drop for NativePlan<T> {
    fn drop(&mut self) {
        debug!(
            "destroying {:?} plan over {:?}",
            self.descriptor.kinds, self.descriptor.dims
        );
    }
}

impl<T: FctScalar> TransformEngine<T> for NativeBackend {
    type Plan = NativePlan<T>;

    fn create_plan(
        &self,
        desc: &PlanDescriptor,
        buffer: &AlignedBuffer<T>,
    ) -> Result<NativePlan<T>> {
        desc.validate()?;
        if buffer.len() < desc.required_len() {
            return Err(FctError::Plan(format!(
                "buffer of {} elements cannot hold a plan spanning {}",
                buffer.len(),
                desc.required_len()
            )));
        }

        let mut planner = Planner::new(self.planner);
        let kernels = desc
            .dims
            .iter()
            .zip(&desc.kinds)
            .map(|(&n, &kind)| CosineKernel::new(kind, n, &mut planner))
            .collect();

        debug!(
            "created {:?} plan over {:?} x {} ({}, {} planner)",
            desc.kinds,
            desc.dims,
            desc.howmany,
            T::PRECISION,
            self.planner.name()
        );

        Ok(NativePlan {
            descriptor: desc.clone(),
            kernels,
            bound: buffer.id(),
            len: buffer.len(),
            lines: vec![T::zero(); desc.total_elements()],
            pool: Arc::clone(self.threads.pool()),
        })
    }

    fn threads(&self) -> usize {
        self.threads.threads()
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.threads.pool().install(op)
    }
}

impl<T: FctScalar> BandedSolver<T> for NativeBackend {
    fn factor_tridiagonal(&self, d: &mut [T], e: &mut [T]) -> Result<()> {
        banded::factor_ldlt(d, e)
    }

    fn solve_tridiagonal(&self, d: &[T], e: &[T], b: &mut [T]) -> Result<()> {
        banded::solve_ldlt(d, e, b)
    }

    fn scale(&self, alpha: T, x: &mut [T]) {
        let n = x.len();
        DVectorViewMut::from_slice(x, n).scale_mut(alpha);
    }
}

impl<T: FctScalar> FctBackend<T> for NativeBackend {
    fn name(&self) -> &str {
        "native-rustfft"
    }
}
