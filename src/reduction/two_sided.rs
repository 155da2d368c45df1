//! Two-sided (oblique) Arnoldi reduction about a single interpolation point.

use super::{
    ProjectionBases, Reduction, biorthogonalize, check_order, krylov_blocks, operator_for, project,
};
use crate::algorithms::{InterpolationPoint, KrylovSide};
use crate::error::{RomError, RomErrorKind};
use crate::system::StateSpace;
use faer::traits::{ComplexField, RealField};

/// Reduces `system` by an oblique projection onto an input-side space seeded
/// from `B` and an output-side space seeded from `Cᴴ`, both of order `r` and both
/// generated by the same (factored) operator.
///
/// The output-side basis is rescaled to `W ← W (WᴴV)⁻ᴴ` so that `WᴴV = I`
/// before projecting, giving `Âr = WᴴAV`, `B̂r = WᴴB`, `Ĉr = CV`. The reduced
/// model matches `2r` moments about a finite σ, or `2r` Markov parameters
/// about infinity.
///
/// Multi-input systems are handled by one block per channel on each side,
/// which requires as many inputs as outputs.
pub fn two_sided_arnoldi<T>(
    system: &StateSpace<T>,
    point: &InterpolationPoint<T>,
    r: usize,
) -> Result<Reduction<T>, RomError>
where
    T: ComplexField,
    T::Real: RealField,
{
    if system.inputs() != system.outputs() {
        return Err(RomErrorKind::UnsupportedChannels {
            algorithm: "two_sided_arnoldi",
            requirement: "as many inputs as outputs",
            inputs: system.inputs(),
            outputs: system.outputs(),
        }
        .into());
    }
    check_order(r, system.inputs(), system.states())?;

    // One factorization serves both sides.
    let operator = operator_for(system.a(), point)?;
    let (v, mut hessenbergs) = krylov_blocks(&*operator, system.b(), r, KrylovSide::Input)?;
    let c_adj = system.c().adjoint().to_owned();
    let (w, output_hessenbergs) = krylov_blocks(&*operator, c_adj.as_ref(), r, KrylovSide::Output)?;
    hessenbergs.extend(output_hessenbergs);

    let w = biorthogonalize(w.as_ref(), v.as_ref())?;
    let reduced = project(system, w.as_ref(), v.as_ref())?;

    log::debug!(
        "Two-sided Arnoldi: {} states reduced to {}.",
        system.states(),
        reduced.states()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::biorthogonality_loss;
    use faer::Mat;

    fn chain(n: usize) -> StateSpace<f64> {
        let a = Mat::from_fn(n, n, |i, j| {
            if i == j {
                -1.0 - 0.5 * i as f64
            } else if j == i + 1 {
                0.4
            } else if i == j + 1 {
                -0.2
            } else {
                0.0
            }
        });
        let b = Mat::from_fn(n, 1, |i, _| if i == 0 { 1.0 } else { 0.1 });
        let c = Mat::from_fn(1, n, |_, j| if j == n - 1 { 1.0 } else { 0.2 });
        StateSpace::without_feedthrough(a, b, c, None).unwrap()
    }

    #[test]
    fn test_bases_are_biorthogonal() {
        let sys = chain(8);
        let reduction = two_sided_arnoldi(&sys, &InterpolationPoint::Finite(0.3), 3).unwrap();
        let w = reduction.bases.w.as_ref().unwrap();
        assert!(biorthogonality_loss(w.as_ref(), reduction.bases.v.as_ref()) < 1e-10);
        assert_eq!(reduction.system.states(), 3);
        assert_eq!(reduction.bases.hessenbergs.len(), 2);
    }

    #[test]
    fn test_partial_realisation_matches_twice_the_markov_parameters() {
        let sys = chain(8);
        let r = 2;
        let reduction = two_sided_arnoldi(&sys, &InterpolationPoint::Infinity, r).unwrap();
        let full = sys.markov_parameters(2 * r);
        let rom = reduction.system.markov_parameters(2 * r);
        for (f, m) in full.iter().zip(&rom) {
            assert!((f - m).norm_l2() < 1e-9 * f.norm_l2().max(1.0));
        }
    }

    #[test]
    fn test_requires_square_channels() {
        let n = 4;
        let sys = StateSpace::without_feedthrough(
            Mat::from_fn(n, n, |i, j| if i == j { -1.0 } else { 0.0 }),
            Mat::from_fn(n, 2, |_, _| 1.0),
            Mat::from_fn(1, n, |_, _| 1.0),
            None,
        )
        .unwrap();
        let err = two_sided_arnoldi(&sys, &InterpolationPoint::Finite(0.0), 1).unwrap_err();
        assert!(err.is_dimension());
    }
}
