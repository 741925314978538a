//! `alloy-wl`: parallel Wang-Landau density-of-states sampler CLI.

use std::path::PathBuf;

use clap::Parser;

use alloy_wl::binning::BinEdges;
use alloy_wl::config::Config;
use alloy_wl::error::WlError;
use alloy_wl::lattice::{AlloyConfiguration, AlloyModel, LatticeDims};
use alloy_wl::orchestrator::{run_rank, Topology};
use alloy_wl::partition::window_indices;
use alloy_wl::transport::{LocalTransport, ThreadTransport};
use alloy_wl::writer::TextWriter;

#[derive(Debug, Parser)]
#[command(name = "alloy-wl", about = "Parallel Wang-Landau DoS sampler for lattice alloys")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,

    /// Overrides the configured number of worker ranks.
    #[arg(long)]
    num_proc: Option<usize>,

    /// Overrides the configured base RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the configured termination tolerance.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Increases log verbosity (repeatable).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decreases log verbosity (repeatable).
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    quiet: u8,

    /// Directory output files are written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn init_logging(cli: &Cli, configured: &str) {
    let level = match (cli.verbose, cli.quiet) {
        (v, 0) if v >= 2 => "trace",
        (v, 0) if v == 1 => "debug",
        (0, q) if q >= 2 => "error",
        (0, q) if q == 1 => "warn",
        _ => configured,
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();
}

fn run(cli: Cli) -> Result<(), WlError> {
    let mut config = Config::load(&cli.config)?;
    if let Some(num_proc) = cli.num_proc {
        config.num_proc = num_proc;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }

    init_logging(&cli, &config.log_level);

    let dims = LatticeDims { lx: config.lx, ly: config.ly, lz: config.lz, basis: config.basis };
    let model = AlloyModel::new(
        dims,
        config.shells,
        config.interaction.clone(),
        config.concentrations.clone(),
    );
    let edges = BinEdges::uniform(config.energy_min, config.energy_max, config.bins);
    let windows = window_indices(config.bins, config.num_windows, config.bin_overlap)?;
    let topology = Topology::new(config.num_proc, config.num_windows, windows);
    let writer = TextWriter::new(&cli.out_dir);

    if config.num_proc == 1 {
        let transport = LocalTransport;
        return run_rank(
            0,
            &model,
            &transport,
            &edges,
            &topology,
            &config,
            AlloyConfiguration::empty(dims),
            Some(&writer),
        );
    }

    let handles = ThreadTransport::mesh(config.num_proc);
    std::thread::scope(|scope| {
        let joins: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(rank, transport)| {
                let model = &model;
                let edges = &edges;
                let topology = &topology;
                let config = &config;
                let writer = &writer;
                scope.spawn(move || {
                    let initial_config = AlloyConfiguration::empty(dims);
                    let w = if rank == 0 { Some(writer) } else { None };
                    run_rank(rank, model, &transport, edges, topology, config, initial_config, w)
                })
            })
            .collect();

        for join in joins {
            join.join().expect("worker thread panicked")?;
        }
        Ok(())
    })
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("alloy-wl: fatal error: {err}");
        std::process::exit(1);
    }
}
