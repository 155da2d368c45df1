//! Projection-based reducers.
//!
//! Each reducer builds one or two Krylov bases with
//! [`construct_krylov`](crate::algorithms::arnoldi::construct_krylov) and projects the full
//! system onto them:
//!
//! - [`one_sided_arnoldi`]: Galerkin projection `Âr = VᴴAV`, `B̂r = VᴴB`, `Ĉr = CV`.
//! - [`two_sided_arnoldi`]: oblique projection with `WᴴV = I`,
//!   `Âr = WᴴAV`, `B̂r = WᴴB`, `Ĉr = CV`.
//! - [`dual_rational_arnoldi`]: the two-sided construction repeated at several
//!   interpolation points, with the blocks concatenated before biorthogonalizing.
//!
//! The feed-through matrix and sample interval are carried over unchanged.

mod dual_rational;
mod one_sided;
mod two_sided;

pub use dual_rational::dual_rational_arnoldi;
pub use one_sided::one_sided_arnoldi;
pub use two_sided::two_sided_arnoldi;

use crate::algorithms::{InterpolationPoint, KrylovSide, arnoldi::construct_krylov, orthonormalize_columns};
use crate::error::{RomError, RomErrorKind};
use crate::operator::{KrylovOperator, ShiftedResolvent, StateOperator};
use crate::system::StateSpace;
use faer::{
    prelude::*,
    traits::{ComplexField, RealField},
};

/// Reciprocal condition number of `WᴴV` below which biorthogonalization is refused.
pub const BIORTHOGONALITY_RCOND: f64 = 1e-13;

/// The bases a reduced model was projected onto.
#[derive(Debug, Clone)]
pub struct ProjectionBases<T: ComplexField> {
    /// Right (input-side) basis, `n × k`.
    pub v: Mat<T>,
    /// Left (output-side) basis after biorthogonalization, `n × k`. `None` for
    /// a Galerkin projection, where `V` plays both roles.
    pub w: Option<Mat<T>>,
    /// Hessenberg matrix of every Krylov block, in the order the blocks were built.
    pub hessenbergs: Vec<Mat<T>>,
}

/// A reduced model together with its projection bases.
#[derive(Debug, Clone)]
pub struct Reduction<T: ComplexField> {
    pub system: StateSpace<T>,
    pub bases: ProjectionBases<T>,
}

/// Creates the operator for one interpolation point: the factored `(σI − A)`
/// for a finite σ, `A` itself for infinity.
pub(crate) fn operator_for<'a, T>(
    a: MatRef<'a, T>,
    point: &InterpolationPoint<T>,
) -> Result<Box<dyn KrylovOperator<T> + 'a>, RomError>
where
    T: ComplexField,
{
    Ok(match point {
        InterpolationPoint::Finite(sigma) => Box::new(ShiftedResolvent::factor(a, sigma)?),
        InterpolationPoint::Infinity => Box::new(StateOperator::new(a)),
    })
}

/// Checks that `r` columns per block over `blocks` blocks fit in `n` states.
pub(crate) fn check_order(r: usize, blocks: usize, n: usize) -> Result<(), RomError> {
    if r == 0 {
        return Err(RomErrorKind::ZeroOrder.into());
    }
    let order = r * blocks;
    if order > n {
        return Err(RomErrorKind::OrderExceedsStates { order, states: n }.into());
    }
    Ok(())
}

/// Builds one Krylov block of order `r` per column of `seeds` with the same
/// operator, and concatenates them.
///
/// With more than one block the concatenation is re-orthonormalized, so the
/// result is always an orthonormal basis.
pub(crate) fn krylov_blocks<T>(
    operator: &dyn KrylovOperator<T>,
    seeds: MatRef<'_, T>,
    r: usize,
    side: KrylovSide,
) -> Result<(Mat<T>, Vec<Mat<T>>), RomError>
where
    T: ComplexField,
    T::Real: RealField,
{
    let blocks = seeds.ncols();
    let mut basis = Mat::<T>::zeros(seeds.nrows(), r * blocks);
    let mut hessenbergs = Vec::with_capacity(blocks);
    for k in 0..blocks {
        let block = construct_krylov(operator, seeds.get(.., k..k + 1), r, side)?;
        basis
            .as_mut()
            .get_mut(.., k * r..(k + 1) * r)
            .copy_from(block.v.as_ref());
        hessenbergs.push(block.h);
    }
    if blocks > 1 {
        orthonormalize_columns(&mut basis)?;
    }
    Ok((basis, hessenbergs))
}

/// Rescales `w` so that `WᴴV = I`, i.e. returns `W·(WᴴV)⁻ᴴ`.
///
/// Fails if `WᴴV` is singular or so ill-conditioned that the oblique
/// projector would be meaningless.
pub fn biorthogonalize<T>(w: MatRef<'_, T>, v: MatRef<'_, T>) -> Result<Mat<T>, RomError>
where
    T: ComplexField,
    T::Real: RealField,
{
    let m = w.adjoint() * v;
    let size = m.nrows();

    let singular_values = m
        .as_ref()
        .singular_values()
        .map_err(|e| RomError::from(RomErrorKind::SvdError(e)))?;
    let mut values = singular_values.iter();
    let Some(first) = values.next() else {
        return Err(RomErrorKind::IllConditionedBiorthogonalization { size }.into());
    };
    let (largest, smallest) = values.fold((first, first), |(hi, lo), s| {
        (if s > hi { s } else { hi }, if s < lo { s } else { lo })
    });
    let threshold = T::Real::mul_real_impl(largest, &T::Real::from_f64_impl(BIORTHOGONALITY_RCOND));
    if *smallest <= threshold {
        return Err(RomErrorKind::IllConditionedBiorthogonalization { size }.into());
    }

    // (WᴴV) Xᴴ = Wᴴ  ⇒  X = W (WᴴV)⁻ᴴ.
    let x_adj = m.as_ref().partial_piv_lu().solve(w.adjoint().to_owned().as_ref());
    Ok(x_adj.adjoint().to_owned())
}

/// Projects `system` with left basis `w` and right basis `v`:
/// `(WᴴAV, WᴴB, CV, D, dt)`.
pub(crate) fn project<T>(system: &StateSpace<T>, w: MatRef<'_, T>, v: MatRef<'_, T>) -> Result<StateSpace<T>, RomError>
where
    T: ComplexField,
{
    let av = system.a() * v;
    let a_r = w.adjoint() * av.as_ref();
    let b_r = w.adjoint() * system.b();
    let c_r = system.c() * v;
    StateSpace::new(a_r, b_r, c_r, system.d().to_owned(), system.dt())
}
