//! # Lattice model
//!
//! A concrete, generic-over-species-count 4-D species lattice with a
//! pairwise-interaction energy evaluator. This fulfils the lattice
//! representation, lattice initializer, shell builder, energy evaluator,
//! site sampler and pair-swap externals of §6 with a real implementation,
//! while staying behind the [`crate::traits::LatticeModel`] trait so other
//! models remain pluggable.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::traits::{LatticeModel, SiteIndex};

/// Extents of a 4-D lattice: `lx * ly * lz` unit cells, each with `basis`
/// sublattice sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeDims {
    pub lx: usize,
    pub ly: usize,
    pub lz: usize,
    pub basis: usize,
}

impl LatticeDims {
    pub fn n_sites(&self) -> usize {
        self.lx * self.ly * self.lz * self.basis
    }

    fn flat_index(&self, site: SiteIndex) -> usize {
        ((site.i * self.ly + site.j) * self.lz + site.k) * self.basis + site.l
    }
}

/// A row-major species lattice: each site holds a `u8` species id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlloyConfiguration {
    dims: LatticeDims,
    species: Vec<u8>,
}

impl AlloyConfiguration {
    pub fn empty(dims: LatticeDims) -> Self {
        Self {
            species: vec![0u8; dims.n_sites()],
            dims,
        }
    }

    pub fn dims(&self) -> LatticeDims {
        self.dims
    }

    pub fn species_at(&self, site: SiteIndex) -> u8 {
        self.species[self.dims.flat_index(site)]
    }

    pub fn set_species(&mut self, site: SiteIndex, species: u8) {
        let idx = self.dims.flat_index(site);
        self.species[idx] = species;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.species
    }
}

/// A single coordination shell: the relative `(di, dj, dk)` unit-cell
/// offsets of neighbors at that shell's distance, applied to every
/// sublattice site.
#[derive(Debug, Clone)]
pub struct Shell {
    pub offsets: Vec<(isize, isize, isize)>,
}

/// Builds the first `n_shells` coordination shells of a simple cubic
/// lattice by grouping neighbor offsets by squared distance.
pub fn lattice_shells(n_shells: usize) -> Vec<Shell> {
    const RADIUS: isize = 3;
    let mut by_dist2: std::collections::BTreeMap<isize, Vec<(isize, isize, isize)>> =
        std::collections::BTreeMap::new();

    for di in -RADIUS..=RADIUS {
        for dj in -RADIUS..=RADIUS {
            for dk in -RADIUS..=RADIUS {
                if di == 0 && dj == 0 && dk == 0 {
                    continue;
                }
                let dist2 = di * di + dj * dj + dk * dk;
                by_dist2.entry(dist2).or_default().push((di, dj, dk));
            }
        }
    }

    by_dist2
        .into_values()
        .take(n_shells)
        .map(|offsets| Shell { offsets })
        .collect()
}

/// A pairwise-interaction alloy model: total energy is the sum, over every
/// neighbor pair within the configured shells, of a symmetric
/// species-by-species interaction matrix.
#[derive(Debug, Clone)]
pub struct AlloyModel {
    dims: LatticeDims,
    shells: Vec<Shell>,
    interaction: Vec<Vec<f64>>,
    concentrations: Vec<f64>,
}

impl AlloyModel {
    pub fn new(
        dims: LatticeDims,
        n_shells: usize,
        interaction: Vec<Vec<f64>>,
        concentrations: Vec<f64>,
    ) -> Self {
        Self {
            dims,
            shells: lattice_shells(n_shells),
            interaction,
            concentrations,
        }
    }

    pub fn dims(&self) -> LatticeDims {
        self.dims
    }

    fn wrap(&self, i: isize, bound: usize) -> usize {
        i.rem_euclid(bound as isize) as usize
    }

    fn neighbors(&self, site: SiteIndex) -> impl Iterator<Item = SiteIndex> + '_ {
        let dims = self.dims;
        self.shells.iter().flat_map(move |shell| {
            shell.offsets.iter().map(move |&(di, dj, dk)| SiteIndex {
                i: self.wrap(site.i as isize + di, dims.lx),
                j: self.wrap(site.j as isize + dj, dims.ly),
                k: self.wrap(site.k as isize + dk, dims.lz),
                l: site.l,
            })
        })
    }

    /// Total lattice energy: half the sum over every site of the
    /// interaction energy with its shell neighbors (each unordered pair
    /// counted once).
    fn energy_from_scratch(&self, config: &AlloyConfiguration) -> f64 {
        let dims = self.dims;
        let mut total = 0.0;
        for i in 0..dims.lx {
            for j in 0..dims.ly {
                for k in 0..dims.lz {
                    for l in 0..dims.basis {
                        let site = SiteIndex { i, j, k, l };
                        let sa = config.species_at(site) as usize;
                        for nb in self.neighbors(site) {
                            let sb = config.species_at(nb) as usize;
                            total += self.interaction[sa][sb];
                        }
                    }
                }
            }
        }
        total / 2.0
    }

    /// Energy contribution of a single site's bonds to its shell neighbors,
    /// used by [`Self::delta_energy`] to avoid a full lattice recompute.
    fn site_energy(&self, config: &AlloyConfiguration, site: SiteIndex) -> f64 {
        let sa = config.species_at(site) as usize;
        self.neighbors(site)
            .map(|nb| self.interaction[sa][config.species_at(nb) as usize])
            .sum()
    }

    /// The change in total energy caused by swapping the species at `a` and
    /// `b`, computed without a full lattice recompute. Provided as an
    /// optimization; tested against [`Self::energy_from_scratch`] for
    /// agreement rather than wired into the sweep kernel's hot loop.
    pub fn delta_energy(&self, config: &AlloyConfiguration, a: SiteIndex, b: SiteIndex) -> f64 {
        let before = self.site_energy(config, a) + self.site_energy(config, b);
        let mut after_config = config.clone();
        let sa = after_config.species_at(a);
        let sb = after_config.species_at(b);
        after_config.set_species(a, sb);
        after_config.set_species(b, sa);
        let after = self.site_energy(&after_config, a) + self.site_energy(&after_config, b);
        after - before
    }
}

impl<R: RngCore> LatticeModel<R> for AlloyModel {
    type Config = AlloyConfiguration;

    fn initial_setup(&self, config: &mut Self::Config, rng: &mut R) {
        let n = self.dims.n_sites();
        let mut species = Vec::with_capacity(n);
        let mut remaining = n;
        for (id, &frac) in self.concentrations.iter().enumerate() {
            let count = if id + 1 == self.concentrations.len() {
                remaining
            } else {
                (frac * n as f64).round() as usize
            };
            species.extend(std::iter::repeat(id as u8).take(count.min(remaining)));
            remaining = remaining.saturating_sub(count);
        }
        while species.len() < n {
            species.push((self.concentrations.len() - 1) as u8);
        }
        species.shuffle(rng);

        let dims = self.dims;
        let mut idx = 0;
        for i in 0..dims.lx {
            for j in 0..dims.ly {
                for k in 0..dims.lz {
                    for l in 0..dims.basis {
                        config.set_species(SiteIndex { i, j, k, l }, species[idx]);
                        idx += 1;
                    }
                }
            }
        }
    }

    fn full_energy(&self, config: &Self::Config) -> f64 {
        self.energy_from_scratch(config)
    }

    fn rdm_site(&self, rng: &mut R) -> SiteIndex {
        SiteIndex {
            i: rng.random_range(0..self.dims.lx),
            j: rng.random_range(0..self.dims.ly),
            k: rng.random_range(0..self.dims.lz),
            l: rng.random_range(0..self.dims.basis),
        }
    }

    fn pair_swap(&self, config: &mut Self::Config, a: SiteIndex, b: SiteIndex) {
        let sa = config.species_at(a);
        let sb = config.species_at(b);
        config.set_species(a, sb);
        config.set_species(b, sa);
    }

    fn same_species(&self, config: &Self::Config, a: SiteIndex, b: SiteIndex) -> bool {
        config.species_at(a) == config.species_at(b)
    }
}
