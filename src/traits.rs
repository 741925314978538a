//! # Core abstractions
//!
//! This module defines the traits that let the engine in [`crate::sweep`],
//! [`crate::burnin`] and [`crate::orchestrator`] stay agnostic of any
//! particular alloy model:
//!
//! - [`LatticeModel`]: the external lattice representation, energy
//!   evaluator, site sampler and pair-swap primitive (§6 of the spec)
//! - [`Schedule`]: controls how the refinement factor `f` decays over time
//! - [`Flatness`]: determines when a histogram is considered "flat enough"
//!
//! Implementing [`LatticeModel`] for a new alloy system lets the generic
//! sweep kernel and orchestrator drive Wang-Landau sampling over it.

use rand::RngCore;

/// A 4-D lattice site address: `(i, j, k, l)` where `l` indexes the
/// sublattice basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteIndex {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
}

/// The external lattice representation and its energy evaluator, site
/// sampler and pair-swap primitive (§6: lattice initializer, shell builder,
/// energy evaluator, site sampler, pair swap).
///
/// # Type Parameters
///
/// * `R` - The random number generator type used for stochastic operations
pub trait LatticeModel<R: RngCore> {
    /// The per-walker configuration type this model operates on.
    type Config: Clone;

    /// Fills `config` with a valid initial species arrangement.
    fn initial_setup(&self, config: &mut Self::Config, rng: &mut R);

    /// Returns the total lattice energy of `config`, in the same units as
    /// the bin edges. Must be deterministic for a given configuration.
    fn full_energy(&self, config: &Self::Config) -> f64;

    /// Returns a uniformly distributed valid 4-D site index.
    fn rdm_site(&self, rng: &mut R) -> SiteIndex;

    /// Exchanges the species at the two given indices in place. Must be its
    /// own inverse: applying it twice with the same indices is a no-op.
    fn pair_swap(&self, config: &mut Self::Config, a: SiteIndex, b: SiteIndex);

    /// Whether the two sites currently hold the same species (used by the
    /// sweep kernel to special-case same-species draws).
    fn same_species(&self, config: &Self::Config, a: SiteIndex, b: SiteIndex) -> bool;
}

/// Controls how the refinement factor `f` changes during sampling.
///
/// Called whenever the flatness controller decides a histogram is flat
/// enough to warrant halving `f`.
pub trait Schedule {
    /// Updates `f` in place and reports whether the run has converged
    /// (`f <= tolerance`).
    fn update(&mut self, f: &mut f64) -> bool;
}

/// A criterion for histogram flatness.
pub trait Flatness {
    /// Determines whether `hist` is "flat enough" according to some
    /// criterion, given a `flatness` parameter in `(0, 1)`.
    fn is_flat(&self, hist: &[u64], flatness: f64) -> bool;
}
