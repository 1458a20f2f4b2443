//! Structured 3D grid shape.

use crate::error::{FctError, Result};
use serde::{Deserialize, Serialize};

/// Extents of the solver grid.
///
/// `m` and `n` are the two cosine-transformed axes, `p` is the axis along
/// which tridiagonal systems are solved. The `p` axis is contiguous in
/// memory, so point `(i, j, k)` lives at `(i * n + j) * p + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDims {
    pub m: usize,
    pub n: usize,
    pub p: usize,
}

impl GridDims {
    pub fn new(m: usize, n: usize, p: usize) -> Result<Self> {
        if m == 0 || n == 0 || p == 0 {
            return Err(FctError::InvalidDimensions { m, n, p });
        }
        // M·N·P must be addressable
        if m.checked_mul(n).and_then(|mn| mn.checked_mul(p)).is_none() {
            return Err(FctError::InvalidDimensions { m, n, p });
        }
        Ok(Self { m, n, p })
    }

    /// Total number of unknowns, M·N·P.
    pub fn len(&self) -> usize {
        self.m * self.n * self.p
    }

    /// Always false for a grid built through [`GridDims::new`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of spectral mode pairs, M·N (one tridiagonal system each).
    pub fn transform_len(&self) -> usize {
        self.m * self.n
    }

    /// Length of a single tridiagonal system.
    pub fn line_len(&self) -> usize {
        self.p
    }

    /// Linear index of grid point `(i, j, k)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.n + j) * self.p + k
    }

    pub(crate) fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(FctError::ShapeMismatch {
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for GridDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.p)
    }
}
