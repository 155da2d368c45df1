//! The reduction driver: owns a full-order system and the most recent reduction.

use crate::config::{Algorithm, Frequency, FrequencyScalar, Order, RomSettings};
use crate::error::{RomError, RomErrorKind};
use crate::reduction::{
    ProjectionBases, Reduction, dual_rational_arnoldi, one_sided_arnoldi, two_sided_arnoldi,
};
use crate::system::{LinearSystem, ReducedSystem};
use faer::traits::RealField;

/// Lifecycle of a [`ReducedOrderModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No system attached; `run` is refused.
    Uninitialised,
    /// A system is attached but has not been reduced yet.
    Initialised,
    /// A reduced model is available.
    Reduced,
}

/// Selects a reduction algorithm by name and keeps its result.
///
/// ```
/// use faer::Mat;
/// use krylov_rom::{DriverState, Frequency, ReducedOrderModel, StateSpace};
///
/// let n = 6;
/// let a = Mat::from_fn(n, n, |i, j| if i == j { -1.0 - i as f64 } else { 0.0 });
/// let b = Mat::from_fn(n, 1, |_, _| 1.0);
/// let c = Mat::from_fn(1, n, |_, _| 1.0);
/// let system = StateSpace::without_feedthrough(a, b, c, None).unwrap();
///
/// let mut rom = ReducedOrderModel::new();
/// rom.initialise(system);
/// let reduced = rom.run("two_sided_arnoldi", 2, &[Frequency::real(0.0)]).unwrap();
/// assert_eq!(reduced.states(), 2);
/// assert_eq!(rom.state(), DriverState::Reduced);
/// ```
#[derive(Debug, Clone)]
pub struct ReducedOrderModel<T: FrequencyScalar> {
    system: Option<LinearSystem<T>>,
    reduction: Option<Reduction<T>>,
    parallel: bool,
}

impl<T: FrequencyScalar> Default for ReducedOrderModel<T> {
    fn default() -> Self {
        Self {
            system: None,
            reduction: None,
            parallel: false,
        }
    }
}

impl<T> ReducedOrderModel<T>
where
    T: FrequencyScalar,
    T::Real: RealField,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the full-order system. Any previous reduction is discarded.
    pub fn initialise(&mut self, system: LinearSystem<T>) {
        log::info!(
            "Attached system with {} states, {} inputs, {} outputs.",
            system.states(),
            system.inputs(),
            system.outputs()
        );
        self.system = Some(system);
        self.reduction = None;
    }

    pub fn state(&self) -> DriverState {
        match (&self.system, &self.reduction) {
            (None, _) => DriverState::Uninitialised,
            (Some(_), None) => DriverState::Initialised,
            (Some(_), Some(_)) => DriverState::Reduced,
        }
    }

    /// Build multi-point bases in parallel in subsequent [`run`](Self::run) and
    /// [`run_algorithm`](Self::run_algorithm) calls.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Runs the algorithm called `name` (see [`Algorithm`]) and stores the
    /// reduced model, replacing any previous one.
    ///
    /// An empty `frequencies` slice means infinity for the single-point
    /// algorithms. On error the previous result is kept.
    pub fn run(
        &mut self,
        name: &str,
        order: impl Into<Order>,
        frequencies: &[Frequency],
    ) -> Result<&ReducedSystem<T>, RomError> {
        let algorithm: Algorithm = name.parse()?;
        self.run_algorithm(algorithm, order, frequencies)
    }

    pub fn run_algorithm(
        &mut self,
        algorithm: Algorithm,
        order: impl Into<Order>,
        frequencies: &[Frequency],
    ) -> Result<&ReducedSystem<T>, RomError> {
        let settings = RomSettings::new(algorithm, order)
            .with_frequencies(frequencies.iter().copied())
            .with_parallel(self.parallel);
        self.run_with_settings(&settings)
    }

    /// Runs a reduction described by `settings`. The `parallel` flag of the
    /// settings takes precedence over [`set_parallel`](Self::set_parallel).
    pub fn run_with_settings(&mut self, settings: &RomSettings) -> Result<&ReducedSystem<T>, RomError> {
        let system = self.system.as_ref().ok_or(RomErrorKind::NotInitialised)?;
        settings.validate()?;

        let points = settings
            .resolved_frequencies()
            .iter()
            .map(Frequency::to_point::<T>)
            .collect::<Result<Vec<_>, _>>()?;
        let orders = settings.resolved_orders()?;

        log::info!(
            "Running {} with order {:?} about {} point(s).",
            settings.algorithm,
            orders,
            points.len()
        );
        let reduction = match settings.algorithm {
            Algorithm::OneSidedArnoldi => one_sided_arnoldi(system, &points[0], orders[0])?,
            Algorithm::TwoSidedArnoldi => two_sided_arnoldi(system, &points[0], orders[0])?,
            Algorithm::DualRationalArnoldi => {
                dual_rational_arnoldi(system, &points, &orders, settings.parallel)?
            }
            Algorithm::RealRationalArnoldi => {
                return Err(RomErrorKind::AlgorithmNotImplemented(settings.algorithm.name()).into());
            }
        };
        log::info!(
            "Reduced {} states to {}.",
            system.states(),
            reduction.system.states()
        );

        Ok(&self.reduction.insert(reduction).system)
    }

    /// The attached full-order system.
    pub fn system(&self) -> Option<&LinearSystem<T>> {
        self.system.as_ref()
    }

    /// The most recent reduced model.
    pub fn reduced(&self) -> Option<&ReducedSystem<T>> {
        self.reduction.as_ref().map(|r| &r.system)
    }

    /// The projection bases of the most recent reduction.
    pub fn bases(&self) -> Option<&ProjectionBases<T>> {
        self.reduction.as_ref().map(|r| &r.bases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::StateSpace;
    use faer::{Mat, c64};

    fn diagonal_system(n: usize) -> StateSpace<f64> {
        let a = Mat::from_fn(n, n, |i, j| {
            if i == j {
                -1.0 - i as f64
            } else if j == i + 1 {
                0.3
            } else {
                0.0
            }
        });
        let b = Mat::from_fn(n, 1, |i, _| 1.0 + 0.1 * i as f64);
        let c = Mat::from_fn(1, n, |_, j| 1.0 / (j + 1) as f64);
        StateSpace::without_feedthrough(a, b, c, None).unwrap()
    }

    #[test]
    fn test_run_before_initialise() {
        let mut rom = ReducedOrderModel::<f64>::new();
        assert_eq!(rom.state(), DriverState::Uninitialised);
        let err = rom.run("one_sided_arnoldi", 2, &[]).unwrap_err();
        assert_eq!(err, RomError::from(RomErrorKind::NotInitialised));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_algorithm_keeps_previous_result() {
        let mut rom = ReducedOrderModel::new();
        rom.initialise(diagonal_system(6));
        assert_eq!(rom.state(), DriverState::Initialised);
        rom.run("arnoldi", 3, &[Frequency::real(0.0)]).unwrap();
        let before = rom.reduced().unwrap().clone();

        let err = rom.run("balanced_truncation", 2, &[]).unwrap_err();
        assert!(err.is_configuration());
        let err = rom.run("one_sided_arnoldi", 7, &[]).unwrap_err();
        assert!(err.is_dimension());
        assert_eq!(rom.state(), DriverState::Reduced);
        assert_eq!(rom.reduced().unwrap(), &before);
    }

    #[test]
    fn test_rerun_replaces_result() {
        let mut rom = ReducedOrderModel::new();
        rom.initialise(diagonal_system(6));
        assert_eq!(rom.run("one_sided_arnoldi", 2, &[]).unwrap().states(), 2);
        assert_eq!(rom.run("two_sided_arnoldi", 3, &[]).unwrap().states(), 3);
        assert_eq!(rom.reduced().unwrap().states(), 3);
        assert!(rom.bases().unwrap().w.is_some());

        rom.initialise(diagonal_system(5));
        assert_eq!(rom.state(), DriverState::Initialised);
        assert!(rom.reduced().is_none());
    }

    #[test]
    fn test_runs_are_idempotent() {
        let mut rom = ReducedOrderModel::new();
        rom.initialise(diagonal_system(8));
        let points = [Frequency::real(0.0), Frequency::real(2.0)];
        let first = rom.run("dual_rational_arnoldi", 2, &points).unwrap().clone();
        rom.set_parallel(true);
        let second = rom.run("dual_rational_arnoldi", 2, &points).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_complex_frequency_needs_complex_system() {
        let mut rom = ReducedOrderModel::new();
        rom.initialise(diagonal_system(6));
        let err = rom
            .run("one_sided_arnoldi", 2, &[Frequency::complex(0.0, 1.0)])
            .unwrap_err();
        assert!(err.is_configuration());

        let mut rom = ReducedOrderModel::<c64>::new();
        rom.initialise(diagonal_system(6).to_complex());
        let reduced = rom
            .run("one_sided_arnoldi", 2, &[Frequency::complex(0.0, 1.0)])
            .unwrap();
        assert_eq!(reduced.states(), 2);
    }

    #[test]
    fn test_settings_driven_run() {
        let mut rom = ReducedOrderModel::new();
        rom.initialise(diagonal_system(8));
        let settings = RomSettings::new(Algorithm::DualRationalArnoldi, vec![3, 2])
            .with_frequencies([Frequency::real(0.5), Frequency::Infinity]);
        assert!(rom.run_with_settings(&settings).unwrap_err().is_configuration());

        let settings = settings.with_frequencies([Frequency::real(0.5), Frequency::real(4.0)]);
        assert_eq!(rom.run_with_settings(&settings).unwrap().states(), 5);
        assert_eq!(rom.bases().unwrap().hessenbergs.len(), 4);
    }
}
