//! Arnoldi construction of an orthonormal Krylov basis for moment matching.
//!
//! ** NOTE: We recommend using the reducers in [`crate::reduction`] or the
//! [`crate::driver::ReducedOrderModel`] instead. This module is intended for use
//! cases where the projection basis itself is needed.
//!
//! The basis is built following the Arnoldi variant used for model reduction by
//! Gugercin (2003): the operator is applied once per column, the candidate is
//! orthogonalized with two modified Gram–Schmidt sweeps, and the sweep
//! coefficients and residual norms are recorded in the Hessenberg matrix `H`.
//! The basis matrix is allocated at its final size up front, since `r` is known.

use super::{
    Approximation, KrylovBasis, KrylovSide, breakdown_tolerance, normalized, orthogonalize_twice,
};
use crate::error::{RomError, RomErrorKind};
use crate::operator::{KrylovOperator, is_finite};
use faer::{
    prelude::*,
    traits::{ComplexField, RealField},
};

/// Builds an order-`r` orthonormal Krylov basis.
///
/// For a Pade operator `(σI − A)⁻¹` the space is
/// $\mathcal{K}_r((\sigma I - A)^{-1}, (\sigma I - A)^{-1} b)$; for a partial
/// realization operator `A` it is $\mathcal{K}_r(A, b)$. With
/// `side = KrylovSide::Output` the adjoint operator is used instead, and `seed`
/// is expected to be a column of `Cᴴ`.
///
/// # Arguments
/// * `operator`: The operator generating the space. For Pade operators the
///   factorization is owned by the operator and reused for every column.
/// * `seed`: The starting vector, an `n × 1` matrix. Must not be zero.
/// * `r`: The order of the basis. Must satisfy `1 <= r <= n`.
/// * `side`: Whether the plain or the adjoint operator is applied.
///
/// # Returns
/// The [`KrylovBasis`] on success. Fails with a numerical degeneracy if the seed
/// is zero, the shifted operator is singular, or the residual vanishes before
/// `r` columns are produced.
pub fn construct_krylov<T, O>(
    operator: &O,
    seed: MatRef<'_, T>,
    r: usize,
    side: KrylovSide,
) -> Result<KrylovBasis<T>, RomError>
where
    T: ComplexField,
    T::Real: RealField,
    O: KrylovOperator<T> + ?Sized,
{
    let n = operator.dim();
    if seed.ncols() != 1 {
        return Err(RomErrorKind::SeedNotColumn { cols: seed.ncols() }.into());
    }
    if seed.nrows() != n {
        return Err(RomErrorKind::DimensionMismatch {
            name: "seed",
            expected_rows: n,
            expected_cols: 1,
            actual_rows: seed.nrows(),
            actual_cols: 1,
        }
        .into());
    }
    if r == 0 {
        return Err(RomErrorKind::ZeroOrder.into());
    }
    if r > n {
        return Err(RomErrorKind::OrderExceedsStates {
            order: r,
            states: n,
        }
        .into());
    }

    let zero = T::Real::zero_impl();
    if seed.norm_l2() <= zero {
        return Err(RomErrorKind::ZeroStartingVector.into());
    }

    let start = match operator.approximation() {
        Approximation::Pade => operator.apply(seed, side),
        Approximation::PartialRealisation => seed.to_owned(),
    };
    if !is_finite(start.as_ref()) {
        return Err(RomErrorKind::SingularShift.into());
    }
    let start_norm = start.norm_l2();
    if start_norm <= zero {
        return Err(RomErrorKind::ZeroStartingVector.into());
    }

    let mut v = Mat::<T>::zeros(n, r);
    let mut h = Mat::<T>::zeros(r, r);
    let tolerance = breakdown_tolerance::<T::Real>();

    let v_0 = normalized(start.as_ref(), &start_norm);
    v.col_mut(0).copy_from(v_0.col(0));

    let mut residual_norm = zero;
    for j in 0..r {
        let mut w = operator.apply(v.as_ref().get(.., j..j + 1), side);
        if !is_finite(w.as_ref()) {
            return Err(RomErrorKind::SingularShift.into());
        }
        let w_norm = w.norm_l2();

        // Two sweeps: the second one corrects the orthogonality lost by the
        // first, and its coefficients are folded into H.
        let coeffs = orthogonalize_twice(v.as_ref().get(.., 0..j + 1), &mut w);
        h.as_mut().get_mut(0..j + 1, j..j + 1).copy_from(coeffs.as_ref());

        let beta = w.norm_l2();
        if j + 1 == r {
            residual_norm = beta;
            break;
        }

        // A vanishing residual means the space is invariant and no further
        // independent direction exists.
        if beta <= T::Real::mul_real_impl(&tolerance, &w_norm) {
            return Err(RomErrorKind::Breakdown {
                column: j + 1,
                order: r,
            }
            .into());
        }

        h.as_mut()[(j + 1, j)] = T::from_real_impl(&beta);
        let v_next = normalized(w.as_ref(), &beta);
        v.col_mut(j + 1).copy_from(v_next.col(0));
        log::trace!("Arnoldi column {} of {} ({:?} side).", j + 1, r, side);
    }

    log::debug!(
        "Built order-{} Krylov basis ({:?}, {:?} side) for dimension {}.",
        r,
        operator.approximation(),
        side,
        n
    );

    Ok(KrylovBasis {
        v,
        h,
        residual_norm,
    })
}
