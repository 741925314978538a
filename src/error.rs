//! # Error types
//!
//! All fallible operations in this crate return `Result<_, WlError>`. There is
//! no local recovery: a `ConfigError` halts setup before any walker starts,
//! and a `StitchError`/`TransportError` during a run is treated as fatal by
//! the orchestrator (see [`crate::transport::Transport::abort`]).

use thiserror::Error;

/// The top-level error type returned by fallible crate operations.
#[derive(Debug, Error)]
pub enum WlError {
    /// Configuration was rejected before any sampling started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The inter-window stitcher could not produce a meaningful scale.
    #[error(transparent)]
    Stitch(#[from] StitchError),

    /// Inter-worker messaging failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Writing an output array failed.
    #[error("failed to write output file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Errors raised while validating a [`crate::config::Config`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("num_proc ({num_proc}) is not evenly divisible by num_windows ({num_windows})")]
    ProcWindowMismatch { num_proc: usize, num_windows: usize },

    #[error(
        "bin_overlap ({overlap}) must be in [1, {window_width}) for a window width of {window_width}"
    )]
    OverlapOutOfRange { overlap: usize, window_width: usize },

    #[error("bins ({bins}) must be >= num_windows ({num_windows})")]
    TooFewBins { bins: usize, num_windows: usize },

    #[error("wl_f ({0}) must be > 1")]
    InvalidWlF(f64),

    #[error("tolerance ({0}) must be > 0")]
    InvalidTolerance(f64),

    #[error("flatness ({0}) must be in (0, 1)")]
    InvalidFlatness(f64),

    #[error("concentrations must sum to 1.0, got {0}")]
    InvalidConcentrations(f64),

    #[error("mc_sweeps must be >= 1")]
    InvalidMcSweeps,

    #[error("energy_min ({energy_min}) must be < energy_max ({energy_max})")]
    InvalidEnergyRange { energy_min: f64, energy_max: f64 },
}

/// Raised when an overlap region contains no positions where both
/// neighboring windows' DoS estimates exceed the qualifying threshold.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("window {window} has no overlap position where both DoS estimates exceed {min_val}")]
pub struct StitchError {
    pub window: usize,
    pub min_val: f64,
}

/// Raised on any failure of the inter-worker messaging substrate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("send to rank {dst} (tag {tag}) failed: {reason}")]
    SendFailed {
        dst: usize,
        tag: String,
        reason: String,
    },

    #[error("recv from rank {src} (tag {tag}) failed: {reason}")]
    RecvFailed {
        src: usize,
        tag: String,
        reason: String,
    },

    #[error("peer rank {rank} disconnected")]
    PeerDisconnected { rank: usize },
}
