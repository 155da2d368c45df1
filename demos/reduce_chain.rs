//! Reduces a damped mass–spring chain with every available algorithm and
//! compares the reduced transfer functions with the full one.
//!
//! Run with `cargo run --release --example reduce_chain -- --masses 200 --order 6`.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use faer::c64;
use krylov_rom::{
    Frequency, ReducedOrderModel,
    utils::benchmarks::{ChainParameters, mass_spring_damper},
};

#[derive(Parser, Debug)]
#[clap(
    name = "reduce-chain",
    about = "Reduces a mass-spring-damper chain with each Krylov algorithm."
)]
struct ChainArgs {
    #[clap(long, default_value_t = 50)]
    masses: usize,

    /// Reduction order per interpolation point.
    #[clap(long, default_value_t = 4)]
    order: usize,

    /// Angular frequencies at which the transfer functions are compared.
    #[clap(long, value_delimiter = ',', default_values_t = [0.0, 0.1, 0.5, 1.0])]
    omegas: Vec<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;
    let args = ChainArgs::parse();

    let system = mass_spring_damper(&ChainParameters {
        masses: args.masses,
        ..ChainParameters::default()
    })?
    .to_complex();

    let runs: [(&str, Vec<Frequency>); 4] = [
        ("one_sided_arnoldi", vec![Frequency::real(0.0)]),
        ("two_sided_arnoldi", vec![Frequency::real(0.0)]),
        ("two_sided_arnoldi", vec![Frequency::complex(0.0, 0.5)]),
        (
            "dual_rational_arnoldi",
            vec![Frequency::real(0.0), Frequency::complex(0.0, 0.5)],
        ),
    ];

    let mut rom = ReducedOrderModel::new();
    rom.initialise(system);
    for (name, frequencies) in &runs {
        let points: Vec<String> = frequencies.iter().map(|f| f.to_string()).collect();
        let reduced = match rom.run(name, args.order, frequencies) {
            Ok(reduced) => reduced.clone(),
            Err(e) => {
                println!("{name} about [{}]: failed: {e}", points.join(", "));
                continue;
            }
        };
        let full = rom.system().context("system is attached")?;
        println!(
            "{name} about [{}]: {} -> {} states",
            points.join(", "),
            full.states(),
            reduced.states()
        );
        for &omega in &args.omegas {
            let s = c64::new(0.0, omega);
            let h = full.transfer_function(&s)?[(0, 0)];
            let h_r = reduced.transfer_function(&s)?[(0, 0)];
            println!(
                "  w = {omega:<6} |H| = {:.6e}  |H_r| = {:.6e}  rel. error = {:.3e}",
                h.norm(),
                h_r.norm(),
                (h - h_r).norm() / h.norm()
            );
        }
    }
    Ok(())
}
