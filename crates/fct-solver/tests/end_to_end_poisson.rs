//! End-to-end tests for the FCT preconditioner.
//!
//! The separable Neumann Poisson operator is assembled explicitly with a
//! 7-point stencil; the preconditioner must invert it exactly.

use fct_solver::{FctSolver, FctSolverF32, FctSolverF64, GridDims, SolverConfig};
use std::f64::consts::PI;

/// Eigenvalue `k` of the cell-centred Neumann second difference on `n` cells.
fn neumann_eigenvalue(k: usize, n: usize) -> f64 {
    let s = (PI * k as f64 / (2.0 * n as f64)).sin();
    4.0 * s * s
}

/// Applies `-Δ` with Neumann walls in x, y and Dirichlet walls in z.
fn apply_operator(dims: GridDims, x: &[f64]) -> Vec<f64> {
    let (m, n, p) = (dims.m, dims.n, dims.p);
    let mut y = vec![0.0; dims.len()];
    for i in 0..m {
        for j in 0..n {
            for k in 0..p {
                let c = x[dims.index(i, j, k)];
                let xm = if i > 0 { x[dims.index(i - 1, j, k)] } else { c };
                let xp = if i + 1 < m { x[dims.index(i + 1, j, k)] } else { c };
                let ym = if j > 0 { x[dims.index(i, j - 1, k)] } else { c };
                let yp = if j + 1 < n { x[dims.index(i, j + 1, k)] } else { c };
                let zm = if k > 0 { x[dims.index(i, j, k - 1)] } else { 0.0 };
                let zp = if k + 1 < p { x[dims.index(i, j, k + 1)] } else { 0.0 };
                y[dims.index(i, j, k)] = 6.0 * c - xm - xp - ym - yp - zm - zp;
            }
        }
    }
    y
}

/// Per-mode tridiagonal coefficients of the operator above.
fn spectral_coefficients(dims: GridDims) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut d = vec![0.0; dims.len()];
    let mut off = vec![0.0; dims.len()];
    for i in 0..dims.m {
        for j in 0..dims.n {
            let shift = neumann_eigenvalue(i, dims.m) + neumann_eigenvalue(j, dims.n);
            for k in 0..dims.p {
                let idx = dims.index(i, j, k);
                d[idx] = 2.0 + shift;
                if k + 1 < dims.p {
                    off[idx] = -1.0;
                }
            }
        }
    }
    (off.clone(), d, off)
}

fn sample(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| ((i as f64) * 0.37).sin() + 0.1 * ((i * 5) % 7) as f64)
        .collect()
}

#[test]
fn poisson_preconditioner_inverts_operator() {
    let dims = GridDims::new(6, 5, 7).unwrap();
    let mut solver = FctSolverF64::with_config(dims, &SolverConfig::default()).unwrap();
    let (dl, d, du) = spectral_coefficients(dims);
    solver.set_trid_solver_data(&dl, &d, &du).unwrap();

    let x = sample(dims.len());
    let mut rhs = apply_operator(dims, &x);
    solver.precond_solver(&mut rhs).unwrap();

    for (idx, (got, want)) in rhs.iter().zip(&x).enumerate() {
        assert!(
            (got - want).abs() < 1e-10,
            "Mismatch at {}: {} vs {}",
            idx,
            got,
            want
        );
    }
}

#[test]
fn residual_path_matches_caller_path() {
    let dims = GridDims::new(4, 6, 5).unwrap();
    let mut solver = FctSolverF64::with_config(dims, &SolverConfig::default()).unwrap();
    let (dl, d, du) = spectral_coefficients(dims);
    solver.set_trid_solver_data(&dl, &d, &du).unwrap();

    let rhs = apply_operator(dims, &sample(dims.len()));
    let mut caller = rhs.clone();
    solver.precond_solver(&mut caller).unwrap();

    solver.residual_mut().copy_from_slice(&rhs);
    solver.precond_residual().unwrap();
    for (a, b) in solver.residual().iter().zip(&caller) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn identity_system_reproduces_transform_round_trip() {
    // Solving sub = 0, diag = 1, super = 0 is a no-op, so the preconditioner
    // reduces to forward followed by backward.
    let mut solver = FctSolverF64::new(4, 4, 4).unwrap();
    let len = 64;
    let zeros = vec![0.0; len];
    let ones = vec![1.0; len];
    solver.set_trid_solver_data(&zeros, &ones, &zeros).unwrap();

    let input = sample(len);
    let mut through_precond = input.clone();
    solver.precond_solver(&mut through_precond).unwrap();

    let mut through_transforms = input.clone();
    solver.fct_forward(&mut through_transforms).unwrap();
    solver.fct_backward(&mut through_transforms).unwrap();

    for i in 0..len {
        assert!((through_precond[i] - through_transforms[i]).abs() < 1e-13);
        assert!((through_precond[i] - input[i]).abs() < 1e-12);
    }
}

#[test]
fn single_precision_solver() {
    let dims = GridDims::new(4, 4, 6).unwrap();
    let mut solver = FctSolverF32::with_config(dims, &SolverConfig::portable()).unwrap();
    let (dl, d, du) = spectral_coefficients(dims);
    let to_f32 = |v: Vec<f64>| v.into_iter().map(|x| x as f32).collect::<Vec<f32>>();
    solver
        .set_trid_solver_data(&to_f32(dl), &to_f32(d), &to_f32(du))
        .unwrap();

    let x = sample(dims.len());
    let mut rhs = to_f32(apply_operator(dims, &x));
    solver.precond_solver(&mut rhs).unwrap();
    for (got, want) in rhs.iter().zip(&x) {
        assert!((*got as f64 - want).abs() < 1e-3, "{} vs {}", got, want);
    }
}

#[test]
fn solvers_of_different_shapes_run_concurrently() {
    let handles: Vec<_> = [(3, 4, 5), (8, 2, 3), (5, 5, 5)]
        .into_iter()
        .map(|(m, n, p)| {
            std::thread::spawn(move || {
                let dims = GridDims::new(m, n, p).unwrap();
                let mut solver: FctSolver<f64> =
                    FctSolver::with_config(dims, &SolverConfig::default()).unwrap();
                let (dl, d, du) = spectral_coefficients(dims);
                solver.set_trid_solver_data(&dl, &d, &du).unwrap();
                let x = sample(dims.len());
                let mut rhs = apply_operator(dims, &x);
                solver.precond_solver(&mut rhs).unwrap();
                rhs.iter()
                    .zip(&x)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0f64, f64::max)
            })
        })
        .collect();

    for handle in handles {
        let err = handle.join().expect("solver thread panicked");
        assert!(err < 1e-10, "max error {}", err);
    }
}
