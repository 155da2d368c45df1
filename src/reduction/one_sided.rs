//! One-sided Arnoldi reduction about a single interpolation point.

use super::{ProjectionBases, Reduction, check_order, krylov_blocks, operator_for, project};
use crate::algorithms::{InterpolationPoint, KrylovSide};
use crate::error::RomError;
use crate::system::StateSpace;
use faer::traits::{ComplexField, RealField};

/// Reduces `system` by an orthogonal (Galerkin) projection onto an order-`r`
/// Krylov space seeded from `B`.
///
/// About a finite σ the space is $\mathcal{K}_r((\sigma I - A)^{-1}, (\sigma I - A)^{-1} B)$
/// and the reduced transfer function matches the first `r` moments about σ
/// (Pade approximation). About infinity the space is $\mathcal{K}_r(A, B)$ and the
/// first `r` Markov parameters `C Aᵏ B` are matched (partial realization).
///
/// With `m > 1` inputs one block of order `r` is built per input column, all from
/// the same factorization, giving a reduced order of `r·m`.
///
/// The reduced matrices are `Âr = VᴴAV`, `B̂r = VᴴB`, `Ĉr = CV`; `D` and the
/// sample interval are carried over.
pub fn one_sided_arnoldi<T>(
    system: &StateSpace<T>,
    point: &InterpolationPoint<T>,
    r: usize,
) -> Result<Reduction<T>, RomError>
where
    T: ComplexField,
    T::Real: RealField,
{
    check_order(r, system.inputs(), system.states())?;

    let operator = operator_for(system.a(), point)?;
    let (v, hessenbergs) = krylov_blocks(&*operator, system.b(), r, KrylovSide::Input)?;
    let reduced = project(system, v.as_ref(), v.as_ref())?;

    log::debug!(
        "One-sided Arnoldi: {} states reduced to {}.",
        system.states(),
        reduced.states()
    );

    Ok(Reduction {
        system: reduced,
        bases: ProjectionBases {
            v,
            w: None,
            hessenbergs,
        },
    })
}
