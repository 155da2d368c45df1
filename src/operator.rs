//! Operators whose Krylov subspaces define the projection bases.
//!
//! Model reduction by moment matching never needs the operator of the Krylov
//! space as an explicit matrix. It needs its action on a vector, and, for
//! the output side of a two-sided projection, the action of its adjoint.
//! [`KrylovOperator`] formalizes this contract. Two operators are provided:
//!
//! - [`ShiftedResolvent`]: `(σI − A)⁻¹` for a finite interpolation point σ
//!   (Pade approximation). The shifted matrix is LU-factorized exactly once
//!   when the value is created; every subsequent application is a pair of
//!   triangular solves against the stored factors, in plain or adjoint mode.
//! - [`StateOperator`]: `A` itself, for interpolation about infinity
//!   (partial realization). Applied by direct multiplication.

use crate::algorithms::{Approximation, KrylovSide};
use crate::error::{RomError, RomErrorKind};
use faer::{
    Mat, MatRef,
    linalg::solvers::PartialPivLu,
    prelude::*,
    traits::{ComplexField, NegByRef, SubByRef},
};

/// An operator that generates a Krylov subspace.
pub trait KrylovOperator<T: ComplexField> {
    /// Dimension `n` of the (square) operator.
    fn dim(&self) -> usize;

    /// Which kind of moment matching this operator produces.
    fn approximation(&self) -> Approximation;

    /// Applies the operator (`KrylovSide::Input`) or its adjoint
    /// (`KrylovSide::Output`) to `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` does not have `dim()` rows.
    fn apply(&self, rhs: MatRef<'_, T>, side: KrylovSide) -> Mat<T>;
}

/// The factored shifted operator `(σI − A)`, applied as its inverse.
pub struct ShiftedResolvent<T: ComplexField> {
    lu: PartialPivLu<T>,
    dim: usize,
}

impl<T: ComplexField> ShiftedResolvent<T> {
    /// Forms `σI − A` and factors it once.
    pub fn factor(a: MatRef<'_, T>, sigma: &T) -> Result<Self, RomError> {
        if a.nrows() != a.ncols() {
            return Err(RomErrorKind::NonSquareStateMatrix {
                rows: a.nrows(),
                cols: a.ncols(),
            }
            .into());
        }
        let shifted = shifted_matrix(a, sigma);
        let lu = shifted.as_ref().partial_piv_lu();
        log::trace!("Factored shifted operator of dimension {}.", a.nrows());
        Ok(Self {
            lu,
            dim: a.nrows(),
        })
    }
}

impl<T: ComplexField> KrylovOperator<T> for ShiftedResolvent<T> {
    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn approximation(&self) -> Approximation {
        Approximation::Pade
    }

    fn apply(&self, rhs: MatRef<'_, T>, side: KrylovSide) -> Mat<T> {
        assert_eq!(
            self.dim,
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.dim,
            rhs.nrows(),
        );
        match side {
            KrylovSide::Input => self.lu.solve(rhs),
            KrylovSide::Output => self.lu.solve_adjoint(rhs),
        }
    }
}

/// The unshifted state matrix `A`, applied directly.
pub struct StateOperator<'a, T: ComplexField> {
    a: MatRef<'a, T>,
}

impl<'a, T: ComplexField> StateOperator<'a, T> {
    pub fn new(a: MatRef<'a, T>) -> Self {
        Self { a }
    }
}

impl<T: ComplexField> KrylovOperator<T> for StateOperator<'_, T> {
    #[inline]
    fn dim(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn approximation(&self) -> Approximation {
        Approximation::PartialRealisation
    }

    fn apply(&self, rhs: MatRef<'_, T>, side: KrylovSide) -> Mat<T> {
        assert_eq!(
            self.a.ncols(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.a.ncols(),
            rhs.nrows(),
        );
        match side {
            KrylovSide::Input => self.a * rhs,
            KrylovSide::Output => self.a.adjoint() * rhs,
        }
    }
}

/// Builds `σI − A` without touching `A`.
pub(crate) fn shifted_matrix<T: ComplexField>(a: MatRef<'_, T>, sigma: &T) -> Mat<T> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| {
        if i == j {
            sigma.sub_by_ref(&a[(i, j)])
        } else {
            a[(i, j)].neg_by_ref()
        }
    })
}

/// Returns `true` if every entry of `m` is finite.
///
/// A partial-pivoting LU of an exactly singular matrix divides by a zero
/// pivot, so a non-finite solve is how a singular shift shows up.
pub(crate) fn is_finite<T: ComplexField>(m: MatRef<'_, T>) -> bool {
    (0..m.ncols()).all(|j| (0..m.nrows()).all(|i| T::is_finite_impl(&m[(i, j)])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::{c64, mat};

    #[test]
    fn test_shifted_resolvent_inverts_shift() {
        let a: Mat<f64> = mat![[-2.0, 1.0, 0.0], [0.0, -3.0, 1.0], [0.5, 0.0, -4.0]];
        let x: Mat<f64> = mat![[1.0], [2.0], [3.0]];
        let sigma = 0.5;

        let op = ShiftedResolvent::factor(a.as_ref(), &sigma).unwrap();
        let y = op.apply(x.as_ref(), KrylovSide::Input);

        // (σI − A) y must reproduce x.
        let shifted = shifted_matrix(a.as_ref(), &sigma);
        assert!((&shifted * &y - &x).norm_l2() < 1e-12);
        assert_eq!(op.approximation(), Approximation::Pade);
    }

    #[test]
    fn test_shifted_resolvent_adjoint_solve() {
        let a = Mat::from_fn(3, 3, |i, j| {
            c64::new((i + 2 * j) as f64 * 0.1 - if i == j { 2.0 } else { 0.0 }, j as f64 * 0.3)
        });
        let x = Mat::from_fn(3, 1, |i, _| c64::new(1.0 + i as f64, -0.5));
        let sigma = c64::new(0.2, 1.5);

        let op = ShiftedResolvent::factor(a.as_ref(), &sigma).unwrap();
        let y = op.apply(x.as_ref(), KrylovSide::Output);

        let shifted = shifted_matrix(a.as_ref(), &sigma);
        assert!((shifted.adjoint() * &y - &x).norm_l2() < 1e-12);
    }

    #[test]
    fn test_state_operator_applies_a_and_adjoint() {
        let a: Mat<f64> = mat![[1.0, 2.0], [3.0, 4.0]];
        let x: Mat<f64> = mat![[1.0], [1.0]];
        let op = StateOperator::new(a.as_ref());

        assert_eq!(op.apply(x.as_ref(), KrylovSide::Input), &a * &x);
        assert_eq!(op.apply(x.as_ref(), KrylovSide::Output), a.transpose() * &x);
        assert_eq!(op.approximation(), Approximation::PartialRealisation);
        assert_eq!(op.dim(), 2);
    }

    #[test]
    fn test_singular_shift_is_not_finite() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 2.0]];
        let x: Mat<f64> = mat![[1.0], [1.0]];
        // σ = 1 is an eigenvalue of A.
        let op = ShiftedResolvent::factor(a.as_ref(), &1.0).unwrap();
        let y = op.apply(x.as_ref(), KrylovSide::Input);
        assert!(!is_finite(y.as_ref()));
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch: operator columns (2) do not match vector rows (3).")]
    fn test_dimension_mismatch_panic() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 1.0]];
        let x: Mat<f64> = mat![[1.0], [2.0], [3.0]];
        let op: &dyn KrylovOperator<f64> = &StateOperator::new(a.as_ref());
        op.apply(x.as_ref(), KrylovSide::Input);
    }
}
