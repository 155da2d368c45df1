//! Synthetic full-order systems for exercising the reducers.

use crate::algorithms::unit_vector;
use crate::error::{RomError, RomErrorKind};
use crate::system::LinearSystem;
use faer::{Mat, Scale};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Physical parameters of a [`mass_spring_damper`] chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainParameters {
    /// Number of masses; the system has twice as many states.
    pub masses: usize,
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            masses: 10,
            mass: 1.0,
            stiffness: 1.0,
            damping: 0.1,
        }
    }
}

/// A chain of equal masses joined by springs and dampers and fixed to walls at
/// both ends. The input is a force on the first mass and the output is the
/// displacement of the last one.
///
/// With `K` and `D` the tridiagonal stiffness and damping matrices the state
/// `[q; q̇]` evolves with
///
/// ```text
/// A = [   0        I    ]     B = [    0    ]     C = [ e_Nᵀ  0 ]
///     [ -K/m     -D/m   ]         [ e_1 / m ]
/// ```
///
/// All poles lie in the open left half-plane for positive parameters. A chain
/// without masses is a dimension error.
pub fn mass_spring_damper(params: &ChainParameters) -> Result<LinearSystem<f64>, RomError> {
    let nm = params.masses;
    if nm == 0 {
        return Err(RomErrorKind::NoStates.into());
    }
    let n = 2 * nm;
    let laplacian = |i: usize, j: usize| -> f64 {
        if i == j {
            2.0
        } else if i.abs_diff(j) == 1 {
            -1.0
        } else {
            0.0
        }
    };
    let a = Mat::from_fn(n, n, |i, j| match (i < nm, j < nm) {
        (true, true) => 0.0,
        (true, false) => {
            if j - nm == i {
                1.0
            } else {
                0.0
            }
        }
        (false, true) => -params.stiffness * laplacian(i - nm, j) / params.mass,
        (false, false) => -params.damping * laplacian(i - nm, j - nm) / params.mass,
    });
    let b = unit_vector::<f64>(n, nm) * Scale(1.0 / params.mass);
    let c = unit_vector::<f64>(n, nm - 1).transpose().to_owned();
    LinearSystem::without_feedthrough(a, b, c, None)
}

/// A reproducible random continuous-time system with `n` states, `m` inputs and
/// `p` outputs.
///
/// `A` has uniform entries in `[-1, 1)` shifted left by more than its largest
/// absolute row sum, so every Gershgorin disc, and with it every eigenvalue,
/// lies in the open left half-plane.
pub fn random_stable_system(
    n: usize,
    m: usize,
    p: usize,
    seed: u64,
) -> Result<LinearSystem<f64>, RomError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut a: Mat<f64> = Mat::from_fn(n, n, |_, _| rng.random_range(-1.0..1.0));
    let radius = (0..n)
        .map(|i| (0..n).map(|j| a[(i, j)].abs()).sum::<f64>())
        .fold(0.0, f64::max);
    for i in 0..n {
        a[(i, i)] -= radius + 1.0;
    }
    let b = Mat::from_fn(n, m, |_, _| rng.random_range(-1.0..1.0));
    let c = Mat::from_fn(p, n, |_, _| rng.random_range(-1.0..1.0));
    LinearSystem::without_feedthrough(a, b, c, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_structure() {
        let params = ChainParameters {
            masses: 3,
            mass: 2.0,
            stiffness: 4.0,
            damping: 0.5,
        };
        let sys = mass_spring_damper(&params).unwrap();
        assert_eq!((sys.states(), sys.inputs(), sys.outputs()), (6, 1, 1));
        assert_eq!(sys.a()[(0, 3)], 1.0);
        assert_eq!(sys.a()[(3, 0)], -4.0);
        assert_eq!(sys.a()[(3, 1)], 2.0);
        assert_eq!(sys.a()[(4, 4)], -0.5);
        assert_eq!(sys.b()[(3, 0)], 0.5);
        assert_eq!(sys.c()[(0, 2)], 1.0);

        // Static deflection of the last mass under a unit force on the first:
        // K⁻¹ e_1 for the fixed-fixed chain gives (N + 1 - N) / ((N + 1) k) = 1 / (4·4).
        let dc = sys.transfer_function(&0.0).unwrap();
        assert!((dc[(0, 0)] - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let params = ChainParameters {
            masses: 0,
            ..ChainParameters::default()
        };
        assert!(mass_spring_damper(&params).unwrap_err().is_dimension());
    }

    #[test]
    fn test_random_system_is_reproducible() {
        let first = random_stable_system(12, 2, 3, 7).unwrap();
        let second = random_stable_system(12, 2, 3, 7).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, random_stable_system(12, 2, 3, 8).unwrap());
        assert_eq!((first.states(), first.inputs(), first.outputs()), (12, 2, 3));
        for i in 0..12 {
            let off: f64 = (0..12).filter(|&j| j != i).map(|j| first.a()[(i, j)].abs()).sum();
            assert!(first.a()[(i, i)] + off < 0.0);
        }
    }
}
