//! Symmetric tridiagonal L·D·Lᵀ factorization and solve.

use crate::error::{FctError, Result};
use crate::scalar::FctScalar;
use nalgebra::ComplexField;

fn check_off_diagonal(n: usize, e_len: usize) -> Result<()> {
    let needed = n.saturating_sub(1);
    if e_len < needed {
        return Err(FctError::ShapeMismatch {
            expected: needed,
            actual: e_len,
        });
    }
    Ok(())
}

/// Factors `tridiag(e, d, e)` in place: `d` becomes D, `e` the unit-lower
/// multipliers of L.
pub(crate) fn factor_ldlt<T: FctScalar>(d: &mut [T], e: &mut [T]) -> Result<()> {
    let n = d.len();
    check_off_diagonal(n, e.len())?;

    for i in 0..n {
        let pivot = d[i];
        if pivot == T::zero() || !ComplexField::is_finite(&pivot) {
            return Err(FctError::SingularPivot { index: i });
        }
        if i + 1 < n {
            let coupling = e[i];
            e[i] = coupling / pivot;
            d[i + 1] -= e[i] * coupling;
        }
    }
    Ok(())
}

/// Solves L·D·Lᵀ x = b in place with factors from [`factor_ldlt`].
pub(crate) fn solve_ldlt<T: FctScalar>(d: &[T], e: &[T], b: &mut [T]) -> Result<()> {
    let n = d.len();
    check_off_diagonal(n, e.len())?;
    if b.len() != n {
        return Err(FctError::ShapeMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    for i in 1..n {
        let prev = b[i - 1];
        b[i] -= e[i - 1] * prev;
    }
    for i in 0..n {
        b[i] /= d[i];
    }
    for i in (0..n.saturating_sub(1)).rev() {
        let next = b[i + 1];
        b[i] -= e[i] * next;
    }
    Ok(())
}
