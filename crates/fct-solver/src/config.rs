//! Solver configuration.
//!
//! Controls how the transform engine is set up: how many worker threads
//! plan execution may fan out to, and which FFT kernels back the cosine
//! transforms.

use serde::{Deserialize, Serialize};

/// FFT kernel selection for the cosine transform plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerMode {
    /// rustfft planner with runtime SIMD detection (AVX, SSE, NEON)
    #[default]
    Auto,
    /// Portable scalar kernels only
    Scalar,
}

impl PlannerMode {
    /// Identifier used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PlannerMode::Auto => "auto",
            PlannerMode::Scalar => "scalar",
        }
    }
}

/// Configuration for [`crate::FctSolver`] construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Worker threads for plan execution (None = available hardware parallelism)
    pub threads: Option<usize>,
    /// FFT kernel selection
    pub planner: PlannerMode,
}

impl SolverConfig {
    /// Configuration that keeps all work on one thread.
    pub fn single_threaded() -> Self {
        Self {
            threads: Some(1),
            ..Default::default()
        }
    }

    /// Configuration that avoids SIMD kernels.
    pub fn portable() -> Self {
        Self {
            planner: PlannerMode::Scalar,
            ..Default::default()
        }
    }

    /// Concrete thread count. Zero or unknown counts resolve to at least one.
    pub fn resolved_threads(&self) -> usize {
        match self.threads {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}
