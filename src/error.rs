//! This module defines the error types for the library.
//!
//! Every failure a reduction can run into is collected in a single private
//! enum, [`RomErrorKind`], and exposed through the opaque [`RomError`]
//! wrapper. Callers that need to react to a failure inspect its
//! [`ErrorClass`] rather than the individual variant:
//!
//! - **Configuration**: the request itself is wrong (unknown algorithm, too few
//!   interpolation points, `run` before a system is attached, ...).
//! - **NumericalDegeneracy**: the Krylov iteration or the biorthogonalization
//!   broke down for the given data.
//! - **Dimension**: matrix shapes are inconsistent, or the requested order does
//!   not fit the state dimension.
//!
//! None of these are retryable with the same inputs.
use thiserror::Error;

/// Represents all possible errors that can occur during a model order reduction.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct RomError(#[from] RomErrorKind);

/// Coarse classification of a [`RomError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request is invalid regardless of the numerical data.
    Configuration,
    /// The numerical data made the iteration or projection degenerate.
    NumericalDegeneracy,
    /// Matrix shapes or the requested order are inconsistent.
    Dimension,
}

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum RomErrorKind {
    #[error("Unknown reduction algorithm '{0}'.")]
    UnknownAlgorithm(String),

    #[error("Reduction algorithm '{0}' is not implemented.")]
    AlgorithmNotImplemented(&'static str),

    #[error(
        "Algorithm '{algorithm}' requires at least {required} interpolation points, but {given} were given."
    )]
    TooFewInterpolationPoints {
        algorithm: &'static str,
        required: usize,
        given: usize,
    },

    #[error("Algorithm '{algorithm}' interpolates about a single point, but {given} were given.")]
    TooManyInterpolationPoints {
        algorithm: &'static str,
        given: usize,
    },

    #[error("Interpolation point {index} duplicates an earlier point.")]
    DuplicateInterpolationPoint { index: usize },

    #[error("Algorithm '{algorithm}' requires finite interpolation points.")]
    InfiniteInterpolationPoint { algorithm: &'static str },

    #[error("Reduction order must be a positive integer.")]
    ZeroOrder,

    #[error("{orders} reduction orders were given for {points} interpolation points.")]
    OrderCountMismatch { points: usize, orders: usize },

    #[error("Invalid frequency '{0}'.")]
    InvalidFrequency(String),

    #[error("Complex frequency {re}{im:+}j cannot be used with a real-valued system.")]
    ComplexFrequencyOnRealSystem { re: f64, im: f64 },

    #[error("No system has been attached; call `initialise` before `run`.")]
    NotInitialised,

    #[error("Starting vector is zero; the Krylov subspace is empty.")]
    ZeroStartingVector,

    #[error(
        "Krylov iteration breakdown at column {column} of {order}: residual vanished. The starting vector spans an invariant subspace of dimension {column}."
    )]
    Breakdown { column: usize, order: usize },

    #[error("The shifted operator is singular; the interpolation point is an eigenvalue of A.")]
    SingularShift,

    #[error(
        "Biorthogonalization matrix W^H V of size {size} is singular or severely ill-conditioned."
    )]
    IllConditionedBiorthogonalization { size: usize },

    #[error("Column {column} of the concatenated basis is linearly dependent on the previous ones.")]
    DependentBasisBlock { column: usize },

    #[error("A numerical error occurred during the singular value decomposition: {0:?}")]
    SvdError(faer::linalg::svd::SvdError),

    #[error("State matrix A must be square, but it is {rows}x{cols}.")]
    NonSquareStateMatrix { rows: usize, cols: usize },

    #[error(
        "Dimension mismatch: matrix {name} is {actual_rows}x{actual_cols}, expected {expected_rows}x{expected_cols}."
    )]
    DimensionMismatch {
        name: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("A system needs at least one {0}.")]
    NoChannels(&'static str),

    #[error("A system needs at least one state.")]
    NoStates,

    #[error("Requested reduced order {order} exceeds the state dimension {states}.")]
    OrderExceedsStates { order: usize, states: usize },

    #[error("Krylov starting vector must be a single column, but it has {cols} columns.")]
    SeedNotColumn { cols: usize },

    #[error(
        "Algorithm '{algorithm}' requires {requirement}, but the system has {inputs} inputs and {outputs} outputs."
    )]
    UnsupportedChannels {
        algorithm: &'static str,
        requirement: &'static str,
        inputs: usize,
        outputs: usize,
    },
}

impl RomErrorKind {
    fn class(&self) -> ErrorClass {
        use RomErrorKind::*;
        match self {
            UnknownAlgorithm(_)
            | AlgorithmNotImplemented(_)
            | TooFewInterpolationPoints { .. }
            | TooManyInterpolationPoints { .. }
            | DuplicateInterpolationPoint { .. }
            | InfiniteInterpolationPoint { .. }
            | ZeroOrder
            | OrderCountMismatch { .. }
            | InvalidFrequency(_)
            | ComplexFrequencyOnRealSystem { .. }
            | NotInitialised => ErrorClass::Configuration,
            ZeroStartingVector
            | Breakdown { .. }
            | SingularShift
            | IllConditionedBiorthogonalization { .. }
            | DependentBasisBlock { .. }
            | SvdError(_) => ErrorClass::NumericalDegeneracy,
            NonSquareStateMatrix { .. }
            | DimensionMismatch { .. }
            | NoChannels(_)
            | NoStates
            | OrderExceedsStates { .. }
            | SeedNotColumn { .. }
            | UnsupportedChannels { .. } => ErrorClass::Dimension,
        }
    }
}

impl RomError {
    /// Returns the class of this error.
    pub fn class(&self) -> ErrorClass {
        self.0.class()
    }

    pub fn is_configuration(&self) -> bool {
        self.class() == ErrorClass::Configuration
    }

    pub fn is_numerical(&self) -> bool {
        self.class() == ErrorClass::NumericalDegeneracy
    }

    pub fn is_dimension(&self) -> bool {
        self.class() == ErrorClass::Dimension
    }
}

// Manually implement PartialEq for the public error type.
// We compare the inner `RomErrorKind`.
impl PartialEq for RomError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
