//! Experiment runner for the moment-matching accuracy analysis.
//!
//! Sweeps the reduction order `r` of one algorithm over a synthetic full-order
//! system and records, for every `r`, how well the reduced model reproduces the
//! moments (or Markov parameters) it is supposed to match and how far its
//! projection bases are from (bi)orthonormal. Results are written to CSV.
use anyhow::{Context, Result, anyhow, ensure};
use clap::{Parser, ValueEnum};
use faer::traits::ComplexField;
use krylov_rom::{
    Algorithm, Frequency, InterpolationPoint, LinearSystem, ReducedOrderModel, RomSettings,
    algorithms::biorthogonality_loss,
    config::FrequencyScalar,
    utils::benchmarks::{ChainParameters, mass_spring_damper, random_stable_system},
};
use serde::Serialize;
use std::{path::PathBuf, time::Instant};

/// The full-order test system.
#[derive(ValueEnum, Clone, Debug, Copy)]
enum Benchmark {
    /// A damped mass–spring chain, force in at one end and displacement out at the other.
    Chain,
    /// A seeded random system with all poles in the left half-plane.
    Random,
}

/// Command-line arguments for the moment-matching experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "moment-matching-runner",
    about = "Measures moment-matching accuracy of Krylov reductions across reduction orders."
)]
struct MomentArgs {
    /// Reduction algorithm, e.g. `one_sided_arnoldi` or `dual_rational_arnoldi`.
    #[clap(long, default_value = "two_sided_arnoldi")]
    algorithm: Algorithm,

    /// Comma-separated interpolation frequencies (`inf`, `0.5`, `0.3+2j`, ...).
    #[clap(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0")]
    frequencies: Vec<Frequency>,

    #[clap(long, value_enum, default_value_t = Benchmark::Chain)]
    benchmark: Benchmark,

    /// Number of masses in the chain benchmark.
    #[clap(long, default_value_t = 100)]
    masses: usize,

    /// State dimension of the random benchmark.
    #[clap(long, default_value_t = 200)]
    states: usize,

    #[clap(long, default_value_t = 1)]
    inputs: usize,

    #[clap(long, default_value_t = 1)]
    outputs: usize,

    /// Seed of the random benchmark.
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Minimum reduction order (per point) to test.
    #[clap(long, default_value_t = 1)]
    r_min: usize,

    /// Maximum reduction order (per point) to test.
    #[clap(long, default_value_t = 10)]
    r_max: usize,

    #[clap(long, default_value_t = 1)]
    r_step: usize,

    /// Build multi-point bases in parallel.
    #[clap(long)]
    parallel: bool,

    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// One row of the output CSV.
#[derive(Debug, Serialize)]
struct MomentResult {
    algorithm: String,
    r: usize,
    reduced_states: usize,
    matched_moments: usize,
    max_rel_moment_error: f64,
    basis_loss: f64,
    time_s: f64,
}

/// Number of moments per point the algorithm guarantees to match at order `r`.
fn guaranteed_moments(algorithm: Algorithm, r: usize) -> usize {
    match algorithm {
        Algorithm::TwoSidedArnoldi => 2 * r,
        _ => r,
    }
}

/// Largest error over the guaranteed moments at every configured point,
/// relative to the largest full-order moment at that point.
///
/// Normalizing per point rather than per moment keeps moments that vanish
/// exactly (e.g. leading Markov parameters of systems with relative degree > 1)
/// from dominating the figure.
fn max_moment_error<T>(
    full: &LinearSystem<T>,
    reduced: &LinearSystem<T>,
    frequencies: &[Frequency],
    count: usize,
) -> Result<f64>
where
    T: FrequencyScalar + ComplexField<Real = f64>,
{
    let mut worst = 0.0f64;
    for frequency in frequencies {
        let (lhs, rhs) = match frequency.to_point::<T>()? {
            InterpolationPoint::Infinity => {
                (full.markov_parameters(count), reduced.markov_parameters(count))
            }
            InterpolationPoint::Finite(sigma) => {
                (full.moments(&sigma, count)?, reduced.moments(&sigma, count)?)
            }
        };
        let scale = lhs
            .iter()
            .map(|m| m.norm_l2())
            .fold(f64::MIN_POSITIVE, f64::max);
        for (f, m) in lhs.iter().zip(&rhs) {
            worst = worst.max((f - m).norm_l2() / scale);
        }
    }
    Ok(worst)
}

fn sweep<T>(system: LinearSystem<T>, args: &MomentArgs) -> Result<Vec<MomentResult>>
where
    T: FrequencyScalar + ComplexField<Real = f64>,
{
    let mut rom = ReducedOrderModel::new();
    rom.initialise(system);

    let mut results = Vec::new();
    for r in (args.r_min..=args.r_max).step_by(args.r_step) {
        let settings = RomSettings::new(args.algorithm, r)
            .with_frequencies(args.frequencies.iter().copied())
            .with_parallel(args.parallel);

        let start_time = Instant::now();
        let outcome = rom.run_with_settings(&settings).map(|reduced| reduced.states());
        let time_s = start_time.elapsed().as_secs_f64();
        let reduced_states = match outcome {
            Ok(states) => states,
            Err(e) if e.is_configuration() => return Err(e.into()),
            Err(e) => {
                log::warn!("r = {r}: {e} Skipping.");
                continue;
            }
        };

        let (Some(full), Some(reduced), Some(bases)) = (rom.system(), rom.reduced(), rom.bases())
        else {
            return Err(anyhow!("Driver holds no result after a successful run"));
        };
        let count = guaranteed_moments(args.algorithm, r);
        let frequencies = settings.resolved_frequencies();
        let max_rel_moment_error = max_moment_error(full, reduced, &frequencies, count)?;
        let w = bases.w.as_ref().unwrap_or(&bases.v);
        let basis_loss = biorthogonality_loss(w.as_ref(), bases.v.as_ref());

        log::info!(
            "r = {r}: {reduced_states} states, moment error {max_rel_moment_error:.3e}, basis loss {basis_loss:.3e}"
        );
        results.push(MomentResult {
            algorithm: args.algorithm.to_string(),
            r,
            reduced_states,
            matched_moments: count,
            max_rel_moment_error,
            basis_loss,
            time_s,
        });
    }
    Ok(results)
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = MomentArgs::parse();
    ensure!(args.r_step > 0, "--r-step must be positive");
    ensure!(args.r_min <= args.r_max, "--r-min must not exceed --r-max");

    let system = match args.benchmark {
        Benchmark::Chain => mass_spring_damper(&ChainParameters {
            masses: args.masses,
            ..ChainParameters::default()
        }),
        Benchmark::Random => {
            random_stable_system(args.states, args.inputs, args.outputs, args.seed)
        }
    }
    .context("Failed to build the benchmark system")?;
    log::info!(
        "Benchmark {:?}: {} states, {} inputs, {} outputs.",
        args.benchmark,
        system.states(),
        system.inputs(),
        system.outputs()
    );

    // Complex interpolation points need complex arithmetic throughout.
    let complex = args
        .frequencies
        .iter()
        .any(|f| matches!(f, Frequency::Finite { im, .. } if *im != 0.0));
    let results = if complex {
        sweep(system.to_complex(), &args)?
    } else {
        sweep(system, &args)?
    };

    log::info!("Writing {} rows to {:?}...", results.len(), &args.output);
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {:?}", &args.output))?;
    for record in results {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("Experiment complete.");
    Ok(())
}
