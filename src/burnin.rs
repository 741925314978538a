//! # Burn-in
//!
//! Before the refinement loop starts, each walker performs an unweighted
//! descent toward its assigned window: §4.3 of the component design. A move
//! is accepted when it reduces the distance between the current energy and
//! the window's midpoint; with a small fixed probability an otherwise
//! rejected move is accepted anyway, letting the walker escape local minima.
//! Terminates the first time the current energy lies strictly inside the
//! window.

use rand::Rng;

use crate::binning::BinEdges;
use crate::flatness::Flatness;
use crate::rng::Rng64;
use crate::traits::LatticeModel;
use crate::walker::Walker;

/// Probability of accepting a move that does not improve distance to the
/// window midpoint, letting burn-in escape a local minimum.
const ESCAPE_PROBABILITY: f64 = 0.001;

/// Repeatedly proposes species swaps until `walker`'s current energy lies
/// strictly inside its window, or `max_attempts` proposals are exhausted.
///
/// Returns `true` once the walker has settled in-window.
pub fn burn_in<M: LatticeModel<Rng64>, F: Flatness>(
    model: &M,
    walker: &mut Walker<M, F>,
    edges: &BinEdges,
    max_attempts: usize,
) -> bool {
    let midpoint = window_midpoint(edges, walker.window.lo, walker.window.hi);

    let mut energy = model.full_energy(&walker.config);
    if bin_in_window(edges, walker.window.lo, walker.window.hi, energy) {
        return true;
    }

    for _ in 0..max_attempts {
        let a = model.rdm_site(&mut walker.rng);
        let b = model.rdm_site(&mut walker.rng);

        if model.same_species(&walker.config, a, b) {
            continue;
        }

        model.pair_swap(&mut walker.config, a, b);
        let candidate = model.full_energy(&walker.config);

        let improves = (candidate - midpoint).abs() <= (energy - midpoint).abs();
        let escapes = walker.rng.random::<f64>() < ESCAPE_PROBABILITY;

        if improves || escapes {
            energy = candidate;
            if bin_in_window(edges, walker.window.lo, walker.window.hi, energy) {
                return true;
            }
        } else {
            model.pair_swap(&mut walker.config, a, b);
        }
    }

    bin_in_window(edges, walker.window.lo, walker.window.hi, energy)
}

fn window_midpoint(edges: &BinEdges, lo: usize, hi: usize) -> f64 {
    let lo_edge = edges.edges()[lo - 1];
    let hi_edge = edges.edges()[hi];
    (lo_edge + hi_edge) / 2.0
}

fn bin_in_window(edges: &BinEdges, lo: usize, hi: usize, energy: f64) -> bool {
    let bin = edges.bin_index(energy);
    bin >= lo as i64 && bin <= hi as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{AlloyConfiguration, AlloyModel, LatticeDims};
    use crate::partition::Window;
    use crate::rng::seeded;

    #[test]
    fn burn_in_settles_into_a_wide_window() {
        let dims = LatticeDims { lx: 4, ly: 4, lz: 4, basis: 1 };
        let model = AlloyModel::new(
            dims,
            2,
            vec![vec![0.0, -1.0], vec![-1.0, 1.0]],
            vec![0.5, 0.5],
        );
        let mut rng = seeded(21);
        let mut config = AlloyConfiguration::empty(dims);
        LatticeModel::<Rng64>::initial_setup(&model, &mut config, &mut rng);

        let energy = model.full_energy(&config);
        let edges = BinEdges::uniform(energy - 200.0, energy + 200.0, 10);
        let window = Window { lo: 1, hi: edges.bins() };

        let mut walker = Walker::new(0, 0, window, config, edges.bins(), 1.0, seeded(22));
        assert!(burn_in(&model, &mut walker, &edges, 500));
    }

    #[test]
    fn already_in_window_returns_immediately() {
        let dims = LatticeDims { lx: 3, ly: 3, lz: 3, basis: 1 };
        let model = AlloyModel::new(
            dims,
            1,
            vec![vec![0.0, -1.0], vec![-1.0, 1.0]],
            vec![0.5, 0.5],
        );
        let mut rng = seeded(1);
        let mut config = AlloyConfiguration::empty(dims);
        LatticeModel::<Rng64>::initial_setup(&model, &mut config, &mut rng);
        let energy = model.full_energy(&config);
        let edges = BinEdges::uniform(energy - 100.0, energy + 100.0, 4);
        let window = Window { lo: 1, hi: edges.bins() };
        let mut walker = Walker::new(0, 0, window, config, edges.bins(), 1.0, seeded(2));
        assert!(burn_in(&model, &mut walker, &edges, 0));
    }
}
