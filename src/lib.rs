//! Krylov-subspace model order reduction for linear time-invariant systems.
//!
//! Given a state-space model
//!
//! $$ \dot{x} = A x + B u, \qquad y = C x + D u $$
//!
//! with a large state dimension `n`, this crate builds a small model
//! $(\hat{A}_r, \hat{B}_r, \hat{C}_r, D)$ whose transfer function
//! $H(s) = C (sI - A)^{-1} B + D$ agrees with the original one in its leading
//! Taylor coefficients (moments) about chosen interpolation points σ, or in its
//! leading Markov parameters $C A^k B$ when σ is infinite.
//!
//! Built on the [`faer`] linear algebra framework, all numerical code is generic
//! over the scalar type: real (`f64`) and complex ([`faer::c64`]) systems are
//! reduced by the same routines.
//!
//! ## Algorithms
//!
//! **Arnoldi basis** ([`algorithms::arnoldi::construct_krylov`]): an orthonormal
//! basis of $\mathcal{K}_r((\sigma I - A)^{-1}, (\sigma I - A)^{-1} b)$, or of
//! $\mathcal{K}_r(A, b)$ about infinity, with the shifted matrix factored once.
//! Every new column is orthogonalized twice with modified Gram–Schmidt.
//!
//! **One-sided Arnoldi** ([`one_sided_arnoldi`]): Galerkin projection onto one
//! basis; matches `r` moments.
//!
//! **Two-sided Arnoldi** ([`two_sided_arnoldi`]): oblique projection onto an
//! input-side and an output-side basis made biorthogonal; matches `2r` moments.
//!
//! **Dual rational Arnoldi** ([`dual_rational_arnoldi`]): the two-sided
//! construction about several points at once, for SISO systems.
//!
//! [`ReducedOrderModel`] selects among them by name and keeps the result.
//!
//! ## Example Usage
//!
//! ```rust
//! use faer::Mat;
//! use krylov_rom::{InterpolationPoint, StateSpace, one_sided_arnoldi};
//!
//! // A 4-state SISO system.
//! let a = Mat::from_fn(4, 4, |i, j| {
//!     if i == j { -1.0 - i as f64 }
//!     else if j == i + 1 { 0.5 }
//!     else { 0.0 }
//! });
//! let b = Mat::from_fn(4, 1, |_, _| 1.0);
//! let c = Mat::from_fn(1, 4, |_, j| (j + 1) as f64);
//! let system = StateSpace::without_feedthrough(a, b, c, None).unwrap();
//!
//! // Reduce to two states, matching two moments about s = 0.
//! let reduction = one_sided_arnoldi(&system, &InterpolationPoint::Finite(0.0), 2).unwrap();
//!
//! // The DC gain is the first moment, so it is preserved.
//! let full = system.transfer_function(&0.0).unwrap();
//! let reduced = reduction.system.transfer_function(&0.0).unwrap();
//! assert!((full[(0, 0)] - reduced[(0, 0)]).abs() < 1e-10);
//! ```

pub mod algorithms;
pub mod config;
pub mod driver;
pub mod error;
pub mod operator;
pub mod reduction;
pub mod system;
pub mod utils;

pub use algorithms::{InterpolationPoint, KrylovBasis, KrylovSide};
pub use config::{Algorithm, Frequency, Order, RomSettings};
pub use driver::{DriverState, ReducedOrderModel};
pub use error::{ErrorClass, RomError};
pub use reduction::{
    ProjectionBases, Reduction, dual_rational_arnoldi, one_sided_arnoldi, two_sided_arnoldi,
};
pub use system::{LinearSystem, ReducedSystem, StateSpace};
