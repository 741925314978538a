//! # Parallel Wang-Landau sampling for lattice alloys
//!
//! This crate estimates the density of states g(E) of a multi-component
//! lattice alloy by biased random exchange of atomic species between sites.
//! The Wang-Landau method adaptively builds a running estimate of `log g(E)`
//! by performing random walks in energy space, biasing acceptance by the
//! inverse of the current DoS estimate, and halving a modification factor
//! `f` each time a walker's visit histogram is judged flat, until `f` falls
//! to or below a configured tolerance.
//!
//! ## Coordination
//!
//! The global bin range is split into overlapping energy windows
//! ([`partition`]); each window is sampled by one or more walkers
//! ([`walker`]) running the sweep kernel ([`sweep`]) after a burn-in descent
//! ([`burnin`]) into their window. On a flatness event, walkers within a
//! window average their DoS views ([`reduce`]), and the root assembles a
//! single global curve by matching means over each window's overlap region
//! ([`stitch`]). [`orchestrator`] sequences this for one rank; [`transport`]
//! carries it across ranks, whether that's a single in-process rank
//! ([`transport::LocalTransport`]) or several OS threads
//! ([`transport::ThreadTransport`]).
//!
//! ## Example
//!
//! ```no_run
//! use alloy_wl::config::Config;
//! use alloy_wl::lattice::{AlloyConfiguration, AlloyModel, LatticeDims};
//! use alloy_wl::binning::BinEdges;
//! use alloy_wl::partition::window_indices;
//! use alloy_wl::orchestrator::{run_rank, Topology};
//! use alloy_wl::transport::LocalTransport;
//! use alloy_wl::writer::TextWriter;
//!
//! # fn main() -> Result<(), alloy_wl::error::WlError> {
//! let config = Config::load(std::path::Path::new("alloy.toml"))?;
//! let dims = LatticeDims { lx: config.lx, ly: config.ly, lz: config.lz, basis: config.basis };
//! let model = AlloyModel::new(dims, config.shells, config.interaction.clone(), config.concentrations.clone());
//! let edges = BinEdges::uniform(config.energy_min, config.energy_max, config.bins);
//! let windows = window_indices(config.bins, config.num_windows, config.bin_overlap)?;
//! let topology = Topology::new(config.num_proc, config.num_windows, windows);
//! let transport = LocalTransport;
//! let writer = TextWriter::new(".");
//! run_rank(0, &model, &transport, &edges, &topology, &config, AlloyConfiguration::empty(dims), Some(&writer))?;
//! # Ok(())
//! # }
//! ```

pub mod binning;
pub mod burnin;
pub mod config;
pub mod error;
pub mod flatness;
pub mod lattice;
pub mod orchestrator;
pub mod partition;
pub mod rebase;
pub mod reduce;
pub mod rng;
pub mod schedule;
pub mod stitch;
pub mod sweep;
pub mod traits;
pub mod transport;
pub mod walker;
pub mod writer;

/// Commonly used items, exported for convenience.
pub mod prelude {
    pub use crate::binning::BinEdges;
    pub use crate::config::Config;
    pub use crate::error::WlError;
    pub use crate::flatness::{Fraction, RMS};
    pub use crate::lattice::{AlloyConfiguration, AlloyModel, LatticeDims};
    pub use crate::orchestrator::{run_rank, Topology};
    pub use crate::partition::{window_indices, Window};
    pub use crate::rng::Rng64;
    pub use crate::schedule::Geometric;
    pub use crate::traits::*;
    pub use crate::transport::{LocalTransport, Tag, ThreadTransport, Transport};
    pub use crate::writer::{TextWriter, Writer};
}
