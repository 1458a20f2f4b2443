//! Floating-point scalar abstraction.
//!
//! The solver is instantiated for single and double precision only. The
//! bound combines what rustfft needs for its complex kernels with what
//! nalgebra needs for vector views and scaling.

use nalgebra::RealField;
use rustfft::FftNum;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Scalar type accepted by [`crate::FctSolver`].
pub trait FctScalar: FftNum + RealField + Copy + sealed::Sealed {
    /// Short precision tag used in diagnostics.
    const PRECISION: &'static str;
}

impl FctScalar for f32 {
    const PRECISION: &'static str = "f32";
}

impl FctScalar for f64 {
    const PRECISION: &'static str = "f64";
}

/// Converts an `f64` constant into the working precision.
#[inline]
pub(crate) fn from_f64<T: FctScalar>(value: f64) -> T {
    nalgebra::convert(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_convert_to_both_precisions() {
        let a: f32 = from_f64(0.25);
        let b: f64 = from_f64(0.25);
        assert_eq!(a, 0.25f32);
        assert_eq!(b, 0.25f64);
        assert_eq!(<f32 as FctScalar>::PRECISION, "f32");
        assert_eq!(<f64 as FctScalar>::PRECISION, "f64");
    }
}
