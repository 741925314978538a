//! # Orchestrator
//!
//! Sequences burn-in, sweeping, flatness checks, intra-window reduction,
//! inter-window stitching and output for one rank, per the state machine of
//! §4.8: `Init → BurnIn → Sweeping → Refining → Sweeping | Done`.
//!
//! The only cross-rank synchronization points are the four suspension
//! points of §5: a global barrier after burn-in, intra-window gather/scatter
//! on refinement, root-directed inter-window send/receive on refinement, and
//! a min/max reduction of per-round wall-clock time.
//!
//! A failure on any of those message-passing points is unrecoverable for the
//! whole run, so it is routed through [`Transport::abort`] rather than
//! propagated up through `Result`.

use std::time::Instant;

use crate::binning::BinEdges;
use crate::burnin::burn_in;
use crate::config::Config;
use crate::error::WlError;
use crate::partition::Window;
use crate::rebase::rebase;
use crate::reduce::reduce_window;
use crate::rng::{derive_walker_seed, seeded};
use crate::schedule::Geometric;
use crate::stitch::{stitch_all, WindowDos};
use crate::sweep::sweep;
use crate::traits::{LatticeModel, Schedule};
use crate::transport::{Phase, Tag, Transport};
use crate::walker::Walker;
use crate::writer::Writer;

/// Maps a global rank to its window and back, assuming ranks are laid out
/// window-major: window `w`'s walkers occupy ranks
/// `[w * walkers_per_window, (w+1) * walkers_per_window)`.
#[derive(Debug, Clone)]
pub struct Topology {
    pub num_proc: usize,
    pub num_windows: usize,
    pub windows: Vec<Window>,
}

impl Topology {
    pub fn new(num_proc: usize, num_windows: usize, windows: Vec<Window>) -> Self {
        Self { num_proc, num_windows, windows }
    }

    pub fn walkers_per_window(&self) -> usize {
        self.num_proc / self.num_windows
    }

    pub fn window_of(&self, rank: usize) -> usize {
        rank / self.walkers_per_window()
    }

    pub fn rank_in_window(&self, rank: usize) -> usize {
        rank % self.walkers_per_window()
    }

    pub fn window_root(&self, window_id: usize) -> usize {
        window_id * self.walkers_per_window()
    }

    pub fn peers_in_window(&self, window_id: usize) -> Vec<usize> {
        let root = self.window_root(window_id);
        (root + 1..root + self.walkers_per_window()).collect()
    }
}

/// Runs the full state machine for one rank to completion (`f <= tolerance`).
///
/// `initial_config` is a model-specific, not-yet-populated configuration
/// value (e.g. an all-zero species lattice); this function fills it via
/// [`LatticeModel::initial_setup`]. `writer` is `Some` only on rank 0, the
/// only rank that persists output.
#[allow(clippy::too_many_arguments)]
pub fn run_rank<M, T, Wr>(
    rank: usize,
    model: &M,
    transport: &T,
    edges: &BinEdges,
    topology: &Topology,
    config: &Config,
    initial_config: M::Config,
    writer: Option<&Wr>,
) -> Result<(), WlError>
where
    M: LatticeModel<crate::rng::Rng64>,
    T: Transport,
    Wr: Writer,
{
    let window_id = topology.window_of(rank);
    let rank_in_window = topology.rank_in_window(rank);
    let window = topology.windows[window_id];

    let seed = derive_walker_seed(config.seed, rank);
    let mut walker = Walker::new(
        window_id,
        rank_in_window,
        window,
        initial_config,
        edges.bins(),
        config.wl_f,
        seeded(seed),
    );
    model.initial_setup(&mut walker.config, &mut walker.rng);

    let max_burnin_attempts = config.n_atoms() * 10;
    let settled = burn_in(model, &mut walker, edges, max_burnin_attempts);
    if !settled {
        tracing::warn!(rank, window_id, "burn-in exhausted attempts without settling");
    }

    // Suspension point (a): global barrier after burn-in.
    transport.barrier();

    let mut schedule = Geometric::halving(config.tolerance);
    let min_val = config.tolerance * 0.1;
    let mut round_start = Instant::now();

    loop {
        sweep(model, &mut walker, edges, config.mc_sweeps, config.n_atoms());

        let triggered = walker.flatness.check(&mut walker.local_histogram, config.flatness);
        if !triggered {
            continue;
        }

        {
            let window_slice = &mut walker.log_dos[window.lo - 1..window.hi];
            rebase(window_slice, config.rebase_mode);
        }

        // Suspension point (b): intra-window gather/scatter.
        let root = topology.window_root(window_id);
        let peers = topology.peers_in_window(window_id);
        {
            let window_slice = &mut walker.log_dos[window.lo - 1..window.hi];
            if let Err(e) = reduce_window(transport, window_id, root, &peers, window_slice) {
                transport.abort(&e.to_string());
            }
        }

        // Suspension point (d): min/max wall-clock reduction.
        let elapsed = round_start.elapsed().as_secs_f64();
        let (min_t, max_t) = transport.reduce_min_max(elapsed);
        round_start = Instant::now();

        // Suspension point (c): root-directed inter-window send/receive.
        if rank == 0 {
            let mut window_results = vec![WindowDos {
                window,
                log_dos: walker.log_dos[window.lo - 1..window.hi].to_vec(),
            }];
            for w in 1..topology.num_windows {
                let other_root = topology.window_root(w);
                let tag = Tag { window_id: w, phase: Phase::InterStitch };
                let payload = match transport.recv(other_root, tag) {
                    Ok(p) => p,
                    Err(e) => transport.abort(&e.to_string()),
                };
                window_results.push(WindowDos {
                    window: topology.windows[w],
                    log_dos: payload,
                });
            }

            let global = match stitch_all(edges.bins(), &window_results, config.bin_overlap, min_val) {
                Ok(g) => g,
                Err(e) => transport.abort(&e.to_string()),
            };

            if let Some(w) = writer {
                w.write("wl_dos_bins.dat", edges.edges())?;
                w.write("wl_dos.dat", &global)?;
                let hist_as_f64: Vec<f64> =
                    walker.local_histogram.iter().map(|&h| h as f64).collect();
                w.write("wl_hist.dat", &hist_as_f64)?;
            }

            tracing::info!(f = walker.f, flatness = config.flatness, min_t, max_t, "refinement");
            println!(
                "f={:e} flatness_target={:.3} min_t={:.3}s max_t={:.3}s",
                walker.f, config.flatness, min_t, max_t
            );
        } else if rank_in_window == 0 {
            let tag = Tag { window_id, phase: Phase::InterStitch };
            let dos: Vec<f64> = walker.log_dos[window.lo - 1..window.hi].to_vec();
            if let Err(e) = transport.send(0, tag, &dos) {
                transport.abort(&e.to_string());
            }
        }

        if schedule.update(&mut walker.f) {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{AlloyConfiguration, AlloyModel, LatticeDims};
    use crate::partition::window_indices;
    use crate::transport::LocalTransport;
    use crate::writer::TextWriter;

    fn tiny_config() -> Config {
        Config::from_raw(crate::config::RawConfig {
            bins: Some(4),
            num_windows: Some(1),
            num_proc: Some(1),
            bin_overlap: Some(1),
            wl_f: Some(2.0),
            tolerance: Some(0.5),
            flatness: Some(0.2),
            mc_sweeps: Some(3),
            energy_min: Some(-2000.0),
            energy_max: Some(2000.0),
            lattice: Some(crate::config::RawLattice {
                lx: Some(3),
                ly: Some(3),
                lz: Some(3),
                basis: Some(1),
            }),
            concentrations: Some(std::collections::BTreeMap::from([("0".to_string(), 0.5), ("1".to_string(), 0.5)])),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn single_rank_run_terminates_and_writes_output() {
        let config = tiny_config();
        let dims = LatticeDims { lx: config.lx, ly: config.ly, lz: config.lz, basis: config.basis };
        let model = AlloyModel::new(
            dims,
            1,
            vec![vec![0.0, -1.0], vec![-1.0, 1.0]],
            config.concentrations.clone(),
        );

        // Center the bin edges on the initial configuration's actual energy
        // span rather than the config's (unit-converted) nominal range, so
        // the tiny test lattice's histogram can plausibly flatten.
        let mut probe_rng = seeded(derive_walker_seed(config.seed, 0));
        let mut probe_config = AlloyConfiguration::empty(dims);
        model.initial_setup(&mut probe_config, &mut probe_rng);
        let probe_energy = model.full_energy(&probe_config);
        let edges = BinEdges::uniform(probe_energy - 40.0, probe_energy + 40.0, config.bins);

        let windows = window_indices(config.bins, config.num_windows, config.bin_overlap).unwrap();
        let topology = Topology::new(config.num_proc, config.num_windows, windows);

        let transport = LocalTransport;
        let dir = std::env::temp_dir().join(format!("alloy-wl-orch-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let writer = TextWriter::new(&dir);

        let initial_config = AlloyConfiguration::empty(dims);
        let result = run_rank(0, &model, &transport, &edges, &topology, &config, initial_config, Some(&writer));

        assert!(result.is_ok());
        assert!(dir.join("wl_dos.dat").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn topology_maps_ranks_to_windows() {
        let windows = window_indices(20, 4, 2).unwrap();
        let topo = Topology::new(8, 4, windows);
        assert_eq!(topo.walkers_per_window(), 2);
        assert_eq!(topo.window_of(0), 0);
        assert_eq!(topo.window_of(3), 1);
        assert_eq!(topo.window_root(2), 4);
        assert_eq!(topo.peers_in_window(2), vec![5]);
    }
}
