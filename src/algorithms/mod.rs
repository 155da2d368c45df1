//! Building blocks shared by the Krylov reduction algorithms.
//!
//! This module holds the vocabulary types of the iteration ([`KrylovSide`],
//! [`Approximation`], [`InterpolationPoint`], [`KrylovBasis`]) together with the
//! Gram–Schmidt kernels used both by the Arnoldi builder in [`arnoldi`] and by
//! the reducers when they merge several Krylov blocks into one basis.

pub mod arnoldi;

use crate::error::{RomError, RomErrorKind};
use faer::{
    Mat, MatRef,
    prelude::*,
    traits::{ComplexField, RealField},
};

/// Multiple of machine epsilon below which a relative residual norm counts as zero.
pub const BREAKDOWN_FACTOR: f64 = 1e3;

/// Which projection basis a Krylov space is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrylovSide {
    /// Seeded from a column of `B`, operator applied as is.
    Input,
    /// Seeded from a column of `Cᴴ`, operator applied as its adjoint.
    Output,
}

/// The kind of moment matching a Krylov space produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approximation {
    /// Finite interpolation point σ, space `K_r((σI − A)⁻¹, (σI − A)⁻¹b)`.
    Pade,
    /// Interpolation about infinity, space `K_r(A, b)`.
    PartialRealisation,
}

/// A point about which the transfer function is interpolated.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPoint<T> {
    /// A finite complex (or real) frequency σ.
    Finite(T),
    /// `s → ∞`: match Markov parameters instead of Taylor coefficients.
    Infinity,
}

impl<T> InterpolationPoint<T> {
    pub fn is_infinite(&self) -> bool {
        matches!(self, InterpolationPoint::Infinity)
    }
}

impl<T> From<T> for InterpolationPoint<T> {
    fn from(sigma: T) -> Self {
        InterpolationPoint::Finite(sigma)
    }
}

/// An orthonormal Krylov basis and its Arnoldi recurrence.
///
/// The columns of `v` are orthonormal and span the order-`r` Krylov space.
/// `h` is the `r × r` upper Hessenberg matrix satisfying
/// `op(V) = V·H + f·e_rᴴ`, where `f` is the final residual whose norm is
/// kept in `residual_norm`.
#[derive(Debug, Clone)]
pub struct KrylovBasis<T: ComplexField> {
    pub v: Mat<T>,
    pub h: Mat<T>,
    pub residual_norm: T::Real,
}

impl<T: ComplexField> KrylovBasis<T> {
    /// Order of the basis (number of columns).
    pub fn order(&self) -> usize {
        self.v.ncols()
    }
}

/// The tolerance below which a residual, relative to the vector it was
/// orthogonalized from, is considered numerically zero.
pub(crate) fn breakdown_tolerance<R: RealField>() -> R {
    R::mul_real_impl(&R::epsilon_impl(), &R::from_f64_impl(BREAKDOWN_FACTOR))
}

/// `j`-th canonical unit vector of length `n`, as an `n × 1` matrix.
///
/// # Panics
///
/// Panics if `j >= n`.
pub fn unit_vector<T: ComplexField>(n: usize, j: usize) -> Mat<T> {
    assert!(j < n, "unit vector index {j} out of range for length {n}");
    Mat::from_fn(n, 1, |i, _| if i == j { T::one_impl() } else { T::zero_impl() })
}

/// One modified Gram–Schmidt sweep of `w` against the columns of `basis`.
///
/// `w` is overwritten with its component orthogonal to `basis`; the returned
/// column holds the projection coefficients `basisᴴ w` in sweep order.
pub(crate) fn gram_schmidt_pass<T: ComplexField>(basis: MatRef<'_, T>, w: &mut Mat<T>) -> Mat<T> {
    let k = basis.ncols();
    let mut coeffs = Mat::<T>::zeros(k, 1);
    for i in 0..k {
        let v_i = basis.get(.., i..i + 1);
        let h_i = v_i.adjoint() * w.as_ref();
        *w = &*w - v_i * h_i.as_ref();
        coeffs.as_mut().get_mut(i..i + 1, ..).copy_from(h_i.as_ref());
    }
    coeffs
}

/// Two Gram–Schmidt sweeps of `w` against `basis`, returning the accumulated
/// coefficients. A single sweep loses orthogonality when `w` is nearly in the
/// span of `basis`; the second sweep restores it to working precision.
pub(crate) fn orthogonalize_twice<T: ComplexField>(basis: MatRef<'_, T>, w: &mut Mat<T>) -> Mat<T> {
    let first = gram_schmidt_pass(basis, w);
    let correction = gram_schmidt_pass(basis, w);
    &first + &correction
}

/// Scales `w` to unit norm. `norm` must be the current norm of `w`.
pub(crate) fn normalized<T: ComplexField>(w: MatRef<'_, T>, norm: &T::Real) -> Mat<T>
where
    T::Real: RealField,
{
    w * Scale(T::from_real_impl(&T::Real::recip_impl(norm)))
}

/// Re-orthonormalizes the columns of `basis` in place, in column order.
///
/// Used when several independently built Krylov blocks are concatenated into
/// one projection basis. A column that becomes numerically zero after two
/// sweeps means the blocks are linearly dependent.
pub(crate) fn orthonormalize_columns<T: ComplexField>(basis: &mut Mat<T>) -> Result<(), RomError>
where
    T::Real: RealField,
{
    let tolerance = breakdown_tolerance::<T::Real>();
    for j in 0..basis.ncols() {
        let mut w = basis.as_ref().get(.., j..j + 1).to_owned();
        let w_norm = w.norm_l2();
        orthogonalize_twice(basis.as_ref().get(.., 0..j), &mut w);
        let norm = w.norm_l2();
        if norm <= T::Real::mul_real_impl(&tolerance, &w_norm) {
            return Err(RomErrorKind::DependentBasisBlock { column: j }.into());
        }
        let q = normalized(w.as_ref(), &norm);
        basis.col_mut(j).copy_from(q.col(0));
    }
    Ok(())
}

/// Frobenius norm of `I − Wᴴ V`: zero for an orthonormal (`W = V`) or
/// biorthogonal pair.
pub fn biorthogonality_loss<T: ComplexField>(w: MatRef<'_, T>, v: MatRef<'_, T>) -> T::Real {
    let k = v.ncols();
    (Mat::<T>::identity(k, k) - w.adjoint() * v).norm_l2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_unit_vector() {
        let e = unit_vector::<f64>(4, 2);
        assert_eq!(e, mat![[0.0], [0.0], [1.0], [0.0]]);
    }

    #[test]
    fn test_orthogonalize_twice_removes_span() {
        let basis: Mat<f64> = mat![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let mut w: Mat<f64> = mat![[2.0], [-3.0], [5.0]];
        let coeffs = orthogonalize_twice(basis.as_ref(), &mut w);
        assert_eq!(coeffs, mat![[2.0], [-3.0]]);
        assert_eq!(w, mat![[0.0], [0.0], [5.0]]);
    }

    #[test]
    fn test_orthonormalize_columns() {
        let mut basis: Mat<f64> = mat![[1.0, 1.0], [0.0, 1.0], [1.0, 0.0]];
        orthonormalize_columns(&mut basis).unwrap();
        assert!(biorthogonality_loss(basis.as_ref(), basis.as_ref()) < 1e-14);
    }

    #[test]
    fn test_orthonormalize_dependent_columns() {
        let mut basis: Mat<f64> = mat![[1.0, 2.0], [1.0, 2.0], [0.0, 0.0]];
        let err = orthonormalize_columns(&mut basis).unwrap_err();
        assert_eq!(err, RomError::from(RomErrorKind::DependentBasisBlock { column: 1 }));
    }
}
