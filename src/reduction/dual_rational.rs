//! Dual rational Arnoldi: two-sided projection about several interpolation points.

use super::{ProjectionBases, Reduction, biorthogonalize, project};
use crate::algorithms::{
    InterpolationPoint, KrylovBasis, KrylovSide, arnoldi::construct_krylov, orthonormalize_columns,
};
use crate::error::{RomError, RomErrorKind};
use crate::operator::ShiftedResolvent;
use crate::system::StateSpace;
use faer::{
    Mat,
    traits::{ComplexField, RealField},
};
use rayon::prelude::*;

const ALGORITHM: &str = "dual_rational_arnoldi";

/// The input-side and output-side Krylov blocks built about one point.
type PointBlocks<T> = (KrylovBasis<T>, KrylovBasis<T>);

/// Reduces a single-input/single-output `system` by interpolating about every
/// point in `points`, with `orders[i]` moments per side at `points[i]`.
///
/// For each point σᵢ the shifted matrix `(σᵢI − A)` is factored once and used
/// for both an input-side block seeded from `B` and an output-side block seeded
/// from `Cᴴ`. The blocks are laid side by side in point order, each
/// concatenation is re-orthonormalized, `W` is biorthogonalized against `V` and
/// the system is projected obliquely. The reduced order is `Σ orders[i]`.
///
/// With `parallel` set, the per-point factorizations and Krylov blocks are
/// built on the rayon thread pool. The result does not depend on the setting.
///
/// # Errors
///
/// - Configuration: fewer than two points, an infinite or repeated point, an
///   order of zero, or an `orders` slice whose length differs from `points`.
/// - Dimension: the system is not SISO, or the total order exceeds the state
///   dimension.
/// - Numerical degeneracy: any block breaks down, the blocks of different
///   points are linearly dependent, or the concatenated bases cannot be
///   biorthogonalized.
pub fn dual_rational_arnoldi<T>(
    system: &StateSpace<T>,
    points: &[InterpolationPoint<T>],
    orders: &[usize],
    parallel: bool,
) -> Result<Reduction<T>, RomError>
where
    T: ComplexField + PartialEq + Send + Sync,
    T::Real: RealField,
{
    if system.inputs() != 1 || system.outputs() != 1 {
        return Err(RomErrorKind::UnsupportedChannels {
            algorithm: ALGORITHM,
            requirement: "a single input and a single output",
            inputs: system.inputs(),
            outputs: system.outputs(),
        }
        .into());
    }
    if points.len() < 2 {
        return Err(RomErrorKind::TooFewInterpolationPoints {
            algorithm: ALGORITHM,
            required: 2,
            given: points.len(),
        }
        .into());
    }
    if orders.len() != points.len() {
        return Err(RomErrorKind::OrderCountMismatch {
            points: points.len(),
            orders: orders.len(),
        }
        .into());
    }

    let mut shifts = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        let InterpolationPoint::Finite(sigma) = point else {
            return Err(RomErrorKind::InfiniteInterpolationPoint {
                algorithm: ALGORITHM,
            }
            .into());
        };
        if shifts.contains(sigma) {
            return Err(RomErrorKind::DuplicateInterpolationPoint { index }.into());
        }
        shifts.push(sigma.clone());
    }
    if orders.contains(&0) {
        return Err(RomErrorKind::ZeroOrder.into());
    }
    let n = system.states();
    let total: usize = orders.iter().sum();
    if total > n {
        return Err(RomErrorKind::OrderExceedsStates {
            order: total,
            states: n,
        }
        .into());
    }

    let c_adj = system.c().adjoint().to_owned();
    let build = |(sigma, &r): (&T, &usize)| -> Result<PointBlocks<T>, RomError> {
        let resolvent = ShiftedResolvent::factor(system.a(), sigma)?;
        let v = construct_krylov(&resolvent, system.b(), r, KrylovSide::Input)?;
        let w = construct_krylov(&resolvent, c_adj.as_ref(), r, KrylovSide::Output)?;
        Ok((v, w))
    };
    let blocks: Vec<PointBlocks<T>> = if parallel {
        shifts
            .par_iter()
            .zip(orders.par_iter())
            .map(&build)
            .collect::<Result<_, _>>()?
    } else {
        shifts
            .iter()
            .zip(orders.iter())
            .map(&build)
            .collect::<Result<_, _>>()?
    };

    // Each point owns the column range starting at the sum of the preceding orders.
    let mut v = Mat::<T>::zeros(n, total);
    let mut w = Mat::<T>::zeros(n, total);
    let mut hessenbergs = Vec::with_capacity(2 * blocks.len());
    let mut offset = 0;
    for (v_block, w_block) in blocks {
        let r = v_block.order();
        v.as_mut()
            .get_mut(.., offset..offset + r)
            .copy_from(v_block.v.as_ref());
        w.as_mut()
            .get_mut(.., offset..offset + r)
            .copy_from(w_block.v.as_ref());
        hessenbergs.push(v_block.h);
        hessenbergs.push(w_block.h);
        offset += r;
    }

    // Blocks from nearby points are close to collinear. Orthonormalizing
    // keeps the spans, and with them the matched moments.
    orthonormalize_columns(&mut v)?;
    orthonormalize_columns(&mut w)?;

    let w = biorthogonalize(w.as_ref(), v.as_ref())?;
    let reduced = project(system, w.as_ref(), v.as_ref())?;

    log::debug!(
        "Dual rational Arnoldi: {} states reduced to {} about {} points.",
        n,
        reduced.states(),
        shifts.len()
    );

    Ok(Reduction {
        system: reduced,
        bases: ProjectionBases {
            v,
            w: Some(w),
            hessenbergs,
        },
    })
}
