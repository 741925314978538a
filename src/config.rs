//! # Configuration
//!
//! Loads and validates the TOML configuration described in §6/§11: a
//! `RawConfig` with every field optional is deserialized first, defaults
//! are applied, then the result is validated into a [`Config`], performing
//! exactly the checks enumerated in the component design.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, WlError};
use crate::rebase::RebaseMode;

/// Conversion factor from meV/atom to the energy units `full_energy`
/// reports in, matching the source literally: `n_atoms / (eV_to_Ry * 1000)`.
const EV_TO_RY: f64 = 0.073_498_618;

#[derive(Debug, Clone, Deserialize)]
pub struct RawLattice {
    pub lx: Option<usize>,
    pub ly: Option<usize>,
    pub lz: Option<usize>,
    pub basis: Option<usize>,
}

/// The as-parsed, all-optional form of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    pub bins: Option<usize>,
    pub energy_min: Option<f64>,
    pub energy_max: Option<f64>,
    pub num_windows: Option<usize>,
    pub bin_overlap: Option<usize>,
    pub mc_sweeps: Option<usize>,
    pub wl_f: Option<f64>,
    pub tolerance: Option<f64>,
    pub flatness: Option<f64>,
    pub temperature: Option<f64>,
    pub num_proc: Option<usize>,
    pub lattice: Option<RawLattice>,
    pub concentrations: Option<BTreeMap<String, f64>>,
    pub interaction: Option<Vec<Vec<f64>>>,
    pub shells: Option<usize>,
    pub seed: Option<u64>,
    pub rebase_mode: Option<RebaseMode>,
    pub log_level: Option<String>,
}

/// A fully validated, run-ready configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub bins: usize,
    pub energy_min: f64,
    pub energy_max: f64,
    pub num_windows: usize,
    pub bin_overlap: usize,
    pub mc_sweeps: usize,
    pub wl_f: f64,
    pub tolerance: f64,
    pub flatness: f64,
    pub temperature: f64,
    pub num_proc: usize,
    pub lx: usize,
    pub ly: usize,
    pub lz: usize,
    pub basis: usize,
    pub concentrations: Vec<f64>,
    pub interaction: Vec<Vec<f64>>,
    pub shells: usize,
    pub seed: u64,
    pub rebase_mode: RebaseMode,
    pub log_level: String,
}

/// A fixed seed used when the configuration omits `seed`, for reproducible
/// runs by default rather than reaching for system entropy.
const DEFAULT_SEED: u64 = 0x5EED_0000_A110_Y000;

impl Config {
    pub fn n_atoms(&self) -> usize {
        self.lx * self.ly * self.lz * self.basis
    }

    /// Loads and validates a configuration from a TOML file on disk.
    pub fn load(path: &Path) -> Result<Config, WlError> {
        let text = std::fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&text)?;
        Ok(Config::from_raw(raw)?)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Config, ConfigError> {
        let num_proc = raw.num_proc.unwrap_or(1);
        let num_windows = raw.num_windows.unwrap_or(1);
        if num_proc % num_windows != 0 {
            return Err(ConfigError::ProcWindowMismatch { num_proc, num_windows });
        }

        let bins = raw.bins.unwrap_or(100);
        if bins < num_windows {
            return Err(ConfigError::TooFewBins { bins, num_windows });
        }

        let window_width = bins / num_windows;
        let bin_overlap = raw.bin_overlap.unwrap_or(1);
        if bin_overlap < 1 || bin_overlap >= window_width {
            return Err(ConfigError::OverlapOutOfRange {
                overlap: bin_overlap,
                window_width,
            });
        }

        let wl_f = raw.wl_f.unwrap_or(std::f64::consts::E);
        if wl_f <= 1.0 {
            return Err(ConfigError::InvalidWlF(wl_f));
        }

        let tolerance = raw.tolerance.unwrap_or(1e-7);
        if tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }

        let flatness = raw.flatness.unwrap_or(0.8);
        if !(0.0 < flatness && flatness < 1.0) {
            return Err(ConfigError::InvalidFlatness(flatness));
        }

        let mc_sweeps = raw.mc_sweeps.unwrap_or(1);
        if mc_sweeps < 1 {
            return Err(ConfigError::InvalidMcSweeps);
        }

        let energy_min = raw.energy_min.unwrap_or(-1000.0);
        let energy_max = raw.energy_max.unwrap_or(1000.0);
        if energy_min >= energy_max {
            return Err(ConfigError::InvalidEnergyRange { energy_min, energy_max });
        }

        let lattice = raw.lattice.unwrap_or(RawLattice {
            lx: None,
            ly: None,
            lz: None,
            basis: None,
        });
        let lx = lattice.lx.unwrap_or(4);
        let ly = lattice.ly.unwrap_or(4);
        let lz = lattice.lz.unwrap_or(4);
        let basis = lattice.basis.unwrap_or(1);
        let n_atoms = lx * ly * lz * basis;

        let concentrations = match raw.concentrations {
            Some(map) => {
                let parsed: BTreeMap<u8, f64> = map
                    .iter()
                    .map(|(id, frac)| (id.parse::<u8>().unwrap_or(0), *frac))
                    .collect();
                let max_id = *parsed.keys().max().unwrap_or(&0);
                let mut v = vec![0.0; max_id as usize + 1];
                for (id, frac) in &parsed {
                    v[*id as usize] = *frac;
                }
                v
            }
            None => vec![0.5, 0.5],
        };
        let total: f64 = concentrations.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(ConfigError::InvalidConcentrations(total));
        }

        let interaction = raw
            .interaction
            .unwrap_or_else(|| vec![vec![0.0; concentrations.len()]; concentrations.len()]);

        let unit_factor = n_atoms as f64 / (EV_TO_RY * 1000.0);

        Ok(Config {
            bins,
            energy_min: energy_min * unit_factor,
            energy_max: energy_max * unit_factor,
            num_windows,
            bin_overlap,
            mc_sweeps,
            wl_f,
            tolerance,
            flatness,
            temperature: raw.temperature.unwrap_or(300.0),
            num_proc,
            lx,
            ly,
            lz,
            basis,
            concentrations,
            interaction,
            shells: raw.shells.unwrap_or(1),
            seed: raw.seed.unwrap_or(DEFAULT_SEED),
            rebase_mode: raw.rebase_mode.unwrap_or_default(),
            log_level: raw.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawConfig {
        RawConfig {
            bins: Some(100),
            num_windows: Some(2),
            num_proc: Some(4),
            bin_overlap: Some(2),
            wl_f: Some(2.0),
            tolerance: Some(1e-6),
            flatness: Some(0.8),
            mc_sweeps: Some(1),
            energy_min: Some(-500.0),
            energy_max: Some(500.0),
            lattice: Some(RawLattice { lx: Some(4), ly: Some(4), lz: Some(4), basis: Some(1) }),
            concentrations: Some(BTreeMap::from([("0".to_string(), 0.5), ("1".to_string(), 0.5)])),
            ..Default::default()
        }
    }

    #[test]
    fn round_trips_a_valid_configuration() {
        let cfg = Config::from_raw(valid_raw()).unwrap();
        assert_eq!(cfg.bins, 100);
        assert_eq!(cfg.num_windows, 2);
    }

    #[test]
    fn rejects_mismatched_proc_window_count() {
        let mut raw = valid_raw();
        raw.num_proc = Some(7);
        raw.num_windows = Some(3);
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ProcWindowMismatch { .. }));
    }

    #[test]
    fn rejects_bad_concentrations() {
        let mut raw = valid_raw();
        raw.concentrations = Some(BTreeMap::from([("0".to_string(), 0.3), ("1".to_string(), 0.3)]));
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConcentrations(_)));
    }

    #[test]
    fn rejects_wl_f_not_greater_than_one() {
        let mut raw = valid_raw();
        raw.wl_f = Some(0.5);
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWlF(_)));
    }

    #[test]
    fn rejects_flatness_out_of_range() {
        let mut raw = valid_raw();
        raw.flatness = Some(1.2);
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFlatness(_)));
    }
}
