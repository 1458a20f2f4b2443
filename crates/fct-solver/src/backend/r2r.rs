//! Real-to-real cosine kernels built on rustfft complex FFTs.
//!
//! Both kinds use the FFTW conventions and are unnormalised:
//!
//! ```text
//! REDFT10 (DCT-II):  Y_k = 2 Σ_{j<n} x_j cos(π (j + ½) k / n)
//! REDFT01 (DCT-III): Y_k = x_0 + 2 Σ_{1≤j<n} x_j cos(π j (k + ½) / n)
//! ```
//!
//! so REDFT01 ∘ REDFT10 = 2n · identity. Each transform costs one complex
//! FFT of length n over an even/odd reordering of the input (Makhoul).

use super::traits::R2rKind;
use crate::config::PlannerMode;
use crate::scalar::{FctScalar, from_f64};
use num_complex::Complex;
use rustfft::{Fft, FftDirection, FftPlanner, FftPlannerScalar};
use std::f64::consts::PI;
use std::sync::Arc;

/// FFT planner selected by [`PlannerMode`].
pub(crate) enum Planner<T: FctScalar> {
    Auto(FftPlanner<T>),
    Scalar(FftPlannerScalar<T>),
}

impl<T: FctScalar> Planner<T> {
    pub(crate) fn new(mode: PlannerMode) -> Self {
        match mode {
            PlannerMode::Auto => Planner::Auto(FftPlanner::new()),
            PlannerMode::Scalar => Planner::Scalar(FftPlannerScalar::new()),
        }
    }

    fn plan(&mut self, len: usize, direction: FftDirection) -> Arc<dyn Fft<T>> {
        match self {
            Planner::Auto(planner) => planner.plan_fft(len, direction),
            Planner::Scalar(planner) => planner.plan_fft(len, direction),
        }
    }
}

/// Per-thread scratch for [`CosineKernel::process`].
pub(crate) struct LineWorkspace<T> {
    buf: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

/// One-dimensional cosine transform of a fixed length and kind.
pub(crate) struct CosineKernel<T: FctScalar> {
    kind: R2rKind,
    len: usize,
    fft: Arc<dyn Fft<T>>,
    twiddles: Vec<Complex<T>>,
}

impl<T: FctScalar> CosineKernel<T> {
    pub(crate) fn new(kind: R2rKind, len: usize, planner: &mut Planner<T>) -> Self {
        // REDFT10 rotates by e^{-iπk/2n} after a forward FFT,
        // REDFT01 by e^{+iπk/2n} before an inverse FFT
        let (direction, sign) = match kind {
            R2rKind::Redft10 => (FftDirection::Forward, -1.0),
            R2rKind::Redft01 => (FftDirection::Inverse, 1.0),
        };
        let fft = planner.plan(len, direction);
        let twiddles = (0..len)
            .map(|k| {
                let angle = sign * PI * k as f64 / (2.0 * len as f64);
                Complex::new(from_f64(angle.cos()), from_f64(angle.sin()))
            })
            .collect();

        Self {
            kind,
            len,
            fft,
            twiddles,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn workspace(&self) -> LineWorkspace<T> {
        let zero = Complex::new(T::zero(), T::zero());
        LineWorkspace {
            buf: vec![zero; self.len],
            scratch: vec![zero; self.fft.get_inplace_scratch_len()],
        }
    }

    /// Transforms `line` (exactly `len` values) in place.
    pub(crate) fn process(&self, line: &mut [T], ws: &mut LineWorkspace<T>) {
        debug_assert_eq!(line.len(), self.len);
        match self.kind {
            R2rKind::Redft10 => self.redft10(line, ws),
            R2rKind::Redft01 => self.redft01(line, ws),
        }
    }

    fn redft10(&self, line: &mut [T], ws: &mut LineWorkspace<T>) {
        let n = self.len;
        let buf = &mut ws.buf;

        for j in 0..n.div_ceil(2) {
            buf[j] = Complex::new(line[2 * j], T::zero());
        }
        for j in 0..n / 2 {
            buf[n - 1 - j] = Complex::new(line[2 * j + 1], T::zero());
        }

        self.fft.process_with_scratch(buf, &mut ws.scratch);

        let two: T = from_f64(2.0);
        for k in 0..n {
            line[k] = two * (self.twiddles[k] * buf[k]).re;
        }
    }

    fn redft01(&self, line: &mut [T], ws: &mut LineWorkspace<T>) {
        let n = self.len;
        let buf = &mut ws.buf;

        buf[0] = Complex::new(line[0], T::zero());
        for k in 1..n {
            buf[k] = self.twiddles[k] * Complex::new(line[k], -line[n - k]);
        }

        self.fft.process_with_scratch(buf, &mut ws.scratch);

        for j in 0..n.div_ceil(2) {
            line[2 * j] = buf[j].re;
        }
        for j in 0..n / 2 {
            line[2 * j + 1] = buf[n - 1 - j].re;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_redft10(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                2.0 * x
                    .iter()
                    .enumerate()
                    .map(|(j, &v)| v * (PI * (j as f64 + 0.5) * k as f64 / n as f64).cos())
                    .sum::<f64>()
            })
            .collect()
    }

    fn naive_redft01(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                x[0] + 2.0
                    * (1..n)
                        .map(|j| x[j] * (PI * j as f64 * (k as f64 + 0.5) / n as f64).cos())
                        .sum::<f64>()
            })
            .collect()
    }

    fn sample(n: usize) -> Vec<f64> {
        (0..n).map(|i| ((i * 7 + 3) % 11) as f64 - 4.5).collect()
    }

    fn run(kind: R2rKind, mode: PlannerMode, x: &[f64]) -> Vec<f64> {
        let mut planner = Planner::<f64>::new(mode);
        let kernel = CosineKernel::new(kind, x.len(), &mut planner);
        let mut ws = kernel.workspace();
        let mut line = x.to_vec();
        kernel.process(&mut line, &mut ws);
        line
    }

    #[test]
    fn redft10_matches_definition() {
        for n in 1..=13 {
            let x = sample(n);
            let fast = run(R2rKind::Redft10, PlannerMode::Auto, &x);
            let reference = naive_redft10(&x);
            for k in 0..n {
                assert!(
                    (fast[k] - reference[k]).abs() < 1e-10,
                    "n={} k={}: {} vs {}",
                    n,
                    k,
                    fast[k],
                    reference[k]
                );
            }
        }
    }

    #[test]
    fn redft01_matches_definition() {
        for n in 1..=13 {
            let x = sample(n);
            let fast = run(R2rKind::Redft01, PlannerMode::Scalar, &x);
            let reference = naive_redft01(&x);
            for k in 0..n {
                assert!(
                    (fast[k] - reference[k]).abs() < 1e-10,
                    "n={} k={}: {} vs {}",
                    n,
                    k,
                    fast[k],
                    reference[k]
                );
            }
        }
    }

    #[test]
    fn redft01_inverts_redft10_up_to_2n() {
        for n in [1, 2, 5, 8, 17, 64] {
            let x = sample(n);
            let y = run(R2rKind::Redft10, PlannerMode::Auto, &x);
            let back = run(R2rKind::Redft01, PlannerMode::Auto, &y);
            for j in 0..n {
                assert!((back[j] / (2.0 * n as f64) - x[j]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn single_precision_kernel() {
        let mut planner = Planner::<f32>::new(PlannerMode::Auto);
        let kernel = CosineKernel::new(R2rKind::Redft10, 4, &mut planner);
        let mut ws = kernel.workspace();
        let mut line = [1.0f32, 1.0, 1.0, 1.0];
        kernel.process(&mut line, &mut ws);
        // A constant input only excites the zero mode: Y_0 = 2n
        assert!((line[0] - 8.0).abs() < 1e-5);
        for &v in &line[1..] {
            assert!(v.abs() < 1e-5);
        }
    }
}
