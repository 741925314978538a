//! # WL sweep kernel
//!
//! Executes one batch of `mc_sweeps * n_atoms` biased species-exchange
//! trials for one walker, per §4.4 of the component design.

use rand::Rng;

use crate::binning::BinEdges;
use crate::flatness::Flatness;
use crate::rng::Rng64;
use crate::traits::LatticeModel;
use crate::walker::Walker;

/// Runs one sweep batch for `walker`, mutating its configuration, local
/// histogram and log-DoS view. Returns the number of accepted in-window
/// moves (diagnostic only).
pub fn sweep<M: LatticeModel<Rng64>, F: Flatness>(
    model: &M,
    walker: &mut Walker<M, F>,
    edges: &BinEdges,
    mc_sweeps: usize,
    n_atoms: usize,
) -> u64 {
    let trials = mc_sweeps * n_atoms;
    let mut accepted = 0u64;

    for _ in 0..trials {
        let a = model.rdm_site(&mut walker.rng);
        let b = model.rdm_site(&mut walker.rng);

        if model.same_species(&walker.config, a, b) {
            // Swap-and-unswap is a no-op for energy, but the trial still
            // counts as a visit at the walker's current bin.
            let e_cur = model.full_energy(&walker.config);
            let ibin = edges.bin_index(e_cur);
            if walker.window.contains(ibin) {
                walker.record(ibin);
            }
            continue;
        }

        let e_before = model.full_energy(&walker.config);
        let ibin = edges.bin_index(e_before);

        model.pair_swap(&mut walker.config, a, b);
        let e_after = model.full_energy(&walker.config);
        let jbin = edges.bin_index(e_after);

        if walker.window.contains(jbin) {
            let accept_prob = (walker.log_dos_at(ibin) - walker.log_dos_at(jbin))
                .exp()
                .min(1.0);
            let accept = walker.rng.random::<f64>() < accept_prob;

            let final_bin = if accept {
                accepted += 1;
                jbin
            } else {
                model.pair_swap(&mut walker.config, a, b);
                ibin
            };
            walker.record(final_bin);
        } else {
            // Outside the window: undo the move, no accounting.
            model.pair_swap(&mut walker.config, a, b);
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BinEdges;
    use crate::lattice::{AlloyConfiguration, AlloyModel, LatticeDims};
    use crate::partition::Window;
    use crate::rng::seeded;

    fn setup() -> (AlloyModel, AlloyConfiguration, BinEdges) {
        let dims = LatticeDims { lx: 3, ly: 3, lz: 3, basis: 1 };
        let model = AlloyModel::new(
            dims,
            2,
            vec![vec![0.0, -1.0], vec![-1.0, 1.0]],
            vec![0.5, 0.5],
        );
        let mut rng = seeded(5);
        let mut config = AlloyConfiguration::empty(dims);
        LatticeModel::<Rng64>::initial_setup(&model, &mut config, &mut rng);
        let energy = model.full_energy(&config);
        let edges = BinEdges::uniform(energy - 20.0, energy + 20.0, 8);
        (model, config, edges)
    }

    #[test]
    fn histogram_only_counts_in_window_trials() {
        let (model, config, edges) = setup();
        let window = Window { lo: 1, hi: edges.bins() };
        let mut walker = Walker::new(0, 0, window, config, edges.bins(), 1.0, seeded(99));

        let accepted = sweep(&model, &mut walker, &edges, 1, 50);

        let total_hist: u64 = walker.local_histogram.iter().sum();
        assert!(total_hist > 0);
        assert!(accepted <= total_hist);
    }

    #[test]
    fn out_of_window_trials_leave_config_unchanged_in_energy() {
        let (model, config, edges) = setup();
        // A one-bin window forces almost every proposal outside the window,
        // exercising the undo-and-skip path without panicking.
        let e_cur = model.full_energy(&config);
        let cur_bin = edges.bin_index(e_cur);
        let window = Window {
            lo: cur_bin.max(1) as usize,
            hi: cur_bin.max(1) as usize,
        };
        let mut walker = Walker::new(0, 0, window, config, edges.bins(), 1.0, seeded(1));
        sweep(&model, &mut walker, &edges, 1, 20);
        // No panics, and any recorded visits must be at the single allowed bin.
        assert!(walker.local_histogram.len() == 1);
    }
}
