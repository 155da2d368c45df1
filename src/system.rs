//! State-space representation of linear time-invariant systems.
//!
//! ```text
//! ẋ = A x + B u      (continuous time)   or   x[k+1] = A x[k] + B u[k]
//! y = C x + D u                               y[k]   = C x[k] + D u[k]
//! ```
//!
//! [`StateSpace`] is used both for the full-order model handed to a reducer and
//! for the reduced model it returns; the two differ only in state dimension.
//! Construction validates the shapes once, after which the value is read-only.

use crate::error::{RomError, RomErrorKind};
use crate::operator::{is_finite, shifted_matrix};
use faer::{
    c64,
    prelude::*,
    traits::{ComplexField, RealField},
};

/// Whether a system evolves in continuous or discrete time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeDomain {
    Continuous,
    /// Discrete time with the given sample interval.
    Discrete { dt: f64 },
}

/// A linear time-invariant state-space model `(A, B, C, D, dt)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace<T: ComplexField> {
    a: Mat<T>,
    b: Mat<T>,
    c: Mat<T>,
    d: Mat<T>,
    dt: Option<f64>,
}

/// The full-order model supplied to a reduction.
pub type LinearSystem<T> = StateSpace<T>;

/// The model produced by a reduction.
pub type ReducedSystem<T> = StateSpace<T>;

fn check_shape<T: ComplexField>(
    name: &'static str,
    m: &Mat<T>,
    rows: usize,
    cols: usize,
) -> Result<(), RomError> {
    if m.nrows() != rows || m.ncols() != cols {
        return Err(RomErrorKind::DimensionMismatch {
            name,
            expected_rows: rows,
            expected_cols: cols,
            actual_rows: m.nrows(),
            actual_cols: m.ncols(),
        }
        .into());
    }
    Ok(())
}

impl<T: ComplexField> StateSpace<T> {
    /// Creates a system, checking that `A` is `n × n`, `B` is `n × m`, `C` is
    /// `p × n` and `D` is `p × m` with `n, m, p ≥ 1`. `dt = None` means continuous
    /// time.
    pub fn new(a: Mat<T>, b: Mat<T>, c: Mat<T>, d: Mat<T>, dt: Option<f64>) -> Result<Self, RomError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(RomErrorKind::NonSquareStateMatrix {
                rows: a.nrows(),
                cols: a.ncols(),
            }
            .into());
        }
        if n == 0 {
            return Err(RomErrorKind::NoStates.into());
        }
        let m = b.ncols();
        let p = c.nrows();
        if m == 0 {
            return Err(RomErrorKind::NoChannels("input").into());
        }
        if p == 0 {
            return Err(RomErrorKind::NoChannels("output").into());
        }
        check_shape("B", &b, n, m)?;
        check_shape("C", &c, p, n)?;
        check_shape("D", &d, p, m)?;
        Ok(Self { a, b, c, d, dt })
    }

    /// Creates a system with a zero feed-through matrix.
    pub fn without_feedthrough(a: Mat<T>, b: Mat<T>, c: Mat<T>, dt: Option<f64>) -> Result<Self, RomError> {
        let d = Mat::zeros(c.nrows(), b.ncols());
        Self::new(a, b, c, d, dt)
    }

    pub fn a(&self) -> MatRef<'_, T> {
        self.a.as_ref()
    }

    pub fn b(&self) -> MatRef<'_, T> {
        self.b.as_ref()
    }

    pub fn c(&self) -> MatRef<'_, T> {
        self.c.as_ref()
    }

    pub fn d(&self) -> MatRef<'_, T> {
        self.d.as_ref()
    }

    /// Sample interval, `None` for continuous-time systems.
    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    pub fn time_domain(&self) -> TimeDomain {
        match self.dt {
            None => TimeDomain::Continuous,
            Some(dt) => TimeDomain::Discrete { dt },
        }
    }

    /// Number of states `n`.
    pub fn states(&self) -> usize {
        self.a.nrows()
    }

    /// Number of inputs `m`.
    pub fn inputs(&self) -> usize {
        self.b.ncols()
    }

    /// Number of outputs `p`.
    pub fn outputs(&self) -> usize {
        self.c.nrows()
    }
}

impl<T: ComplexField> StateSpace<T>
where
    T::Real: RealField,
{
    /// Evaluates the transfer function `H(s) = C (sI − A)⁻¹ B + D`.
    ///
    /// For discrete-time systems `s` is the `z`-domain variable. Fails with a
    /// numerical degeneracy if `s` is an eigenvalue of `A`.
    pub fn transfer_function(&self, s: &T) -> Result<Mat<T>, RomError> {
        let x = shifted_matrix(self.a(), s).as_ref().partial_piv_lu().solve(self.b());
        if !is_finite(x.as_ref()) {
            return Err(RomErrorKind::SingularShift.into());
        }
        Ok(&self.c * &x + &self.d)
    }

    /// The first `count` Markov parameters `C Aᵏ B`, `k = 0, …, count − 1`.
    ///
    /// These are the coefficients matched by a partial realization.
    pub fn markov_parameters(&self, count: usize) -> Vec<Mat<T>> {
        let mut out = Vec::with_capacity(count);
        let mut ak_b = self.b.clone();
        for _ in 0..count {
            out.push(&self.c * &ak_b);
            ak_b = &self.a * &ak_b;
        }
        out
    }

    /// The first `count` moments `C (σI − A)^-(k+1) B` about a finite point σ.
    ///
    /// The Taylor expansion of the transfer function about σ is
    /// `H(s) = D + Σₖ (−1)ᵏ (s − σ)ᵏ mₖ`, so matching these matrices matches
    /// the Taylor coefficients.
    pub fn moments(&self, sigma: &T, count: usize) -> Result<Vec<Mat<T>>, RomError> {
        let lu = shifted_matrix(self.a(), sigma).as_ref().partial_piv_lu();
        let mut out = Vec::with_capacity(count);
        let mut x = self.b.clone();
        for _ in 0..count {
            x = lu.solve(x.as_ref());
            if !is_finite(x.as_ref()) {
                return Err(RomErrorKind::SingularShift.into());
            }
            out.push(&self.c * &x);
        }
        Ok(out)
    }
}

impl StateSpace<f64> {
    /// Lifts a real system to complex arithmetic, for reduction about complex
    /// interpolation points.
    pub fn to_complex(&self) -> StateSpace<c64> {
        let lift = |m: &Mat<f64>| Mat::from_fn(m.nrows(), m.ncols(), |i, j| c64::new(m[(i, j)], 0.0));
        StateSpace {
            a: lift(&self.a),
            b: lift(&self.b),
            c: lift(&self.c),
            d: lift(&self.d),
            dt: self.dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    fn first_order_lag() -> StateSpace<f64> {
        // H(s) = 2 / (s + 4) + 0.5
        StateSpace::new(mat![[-4.0]], mat![[1.0]], mat![[2.0]], mat![[0.5]], None).unwrap()
    }

    #[test]
    fn test_shape_validation() {
        let a = Mat::<f64>::zeros(3, 3);
        let err = StateSpace::new(
            a.clone(),
            Mat::zeros(2, 1),
            Mat::zeros(1, 3),
            Mat::zeros(1, 1),
            None,
        )
        .unwrap_err();
        assert!(err.is_dimension());
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: matrix B is 2x1, expected 3x1."
        );

        let err = StateSpace::new(
            Mat::<f64>::zeros(3, 2),
            Mat::zeros(3, 1),
            Mat::zeros(1, 3),
            Mat::zeros(1, 1),
            None,
        )
        .unwrap_err();
        assert!(err.is_dimension());

        let err = StateSpace::new(a, Mat::zeros(3, 0), Mat::zeros(1, 3), Mat::zeros(1, 0), None)
            .unwrap_err();
        assert!(err.is_dimension());

        let err = StateSpace::<f64>::without_feedthrough(
            Mat::zeros(0, 0),
            Mat::zeros(0, 1),
            Mat::zeros(1, 0),
            None,
        )
        .unwrap_err();
        assert_eq!(err, RomError::from(RomErrorKind::NoStates));
    }

    #[test]
    fn test_dimensions_and_time_domain() {
        let sys = StateSpace::<f64>::without_feedthrough(
            Mat::zeros(4, 4),
            Mat::zeros(4, 2),
            Mat::zeros(3, 4),
            Some(0.01),
        )
        .unwrap();
        assert_eq!((sys.states(), sys.inputs(), sys.outputs()), (4, 2, 3));
        assert_eq!(sys.time_domain(), TimeDomain::Discrete { dt: 0.01 });
        assert_eq!(sys.d(), Mat::<f64>::zeros(3, 2).as_ref());
        assert_eq!(first_order_lag().time_domain(), TimeDomain::Continuous);
    }

    #[test]
    fn test_transfer_function() {
        let sys = first_order_lag();
        let h0 = sys.transfer_function(&0.0).unwrap();
        assert!((h0[(0, 0)] - 1.0).abs() < 1e-15);
        let h1 = sys.transfer_function(&1.0).unwrap();
        assert!((h1[(0, 0)] - 0.9).abs() < 1e-15);
        assert!(sys.transfer_function(&-4.0).unwrap_err().is_numerical());
    }

    #[test]
    fn test_markov_parameters_and_moments() {
        let sys = first_order_lag();
        let markov = sys.markov_parameters(3);
        assert_eq!(markov[0][(0, 0)], 2.0);
        assert_eq!(markov[1][(0, 0)], -8.0);
        assert_eq!(markov[2][(0, 0)], 32.0);

        // m_k = 2 / 4^(k+1) about σ = 0.
        let moments = sys.moments(&0.0, 3).unwrap();
        assert!((moments[0][(0, 0)] - 0.5).abs() < 1e-15);
        assert!((moments[1][(0, 0)] - 0.125).abs() < 1e-15);
        assert!((moments[2][(0, 0)] - 0.03125).abs() < 1e-15);
    }

    #[test]
    fn test_to_complex() {
        let sys = first_order_lag().to_complex();
        let h = sys.transfer_function(&c64::new(0.0, 4.0)).unwrap();
        // 2 / (4 + 4j) + 0.5 = 0.75 - 0.25j
        assert!((h[(0, 0)] - c64::new(0.75, -0.25)).norm() < 1e-15);
    }
}
