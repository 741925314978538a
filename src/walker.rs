//! # Walker
//!
//! A walker is one of `num_proc` independent workers: it owns a private
//! configuration, a local histogram scoped to its assigned window, and its
//! own running view of the global log-DoS.

use crate::flatness::{Flatness, Fraction, FlatnessController};
use crate::partition::Window;
use crate::rng::Rng64;
use crate::traits::LatticeModel;

/// One walker's full mutable state.
pub struct Walker<M: LatticeModel<Rng64>, F: Flatness = Fraction> {
    pub window_id: usize,
    pub rank_in_window: usize,
    pub window: Window,

    pub config: M::Config,

    /// Visit counts for this round, indexed `0..window.width()` (local bin
    /// `0` corresponds to global bin `window.lo`).
    pub local_histogram: Vec<u64>,

    /// This walker's own running log-DoS estimate, over *all* global bins
    /// (only the entries within `window` are updated by its own sweeps).
    pub log_dos: Vec<f64>,

    pub f: f64,
    pub rng: Rng64,
    pub flatness: FlatnessController<F>,
}

impl<M: LatticeModel<Rng64>> Walker<M, Fraction> {
    pub fn new(
        window_id: usize,
        rank_in_window: usize,
        window: Window,
        config: M::Config,
        bins: usize,
        f0: f64,
        rng: Rng64,
    ) -> Self {
        Self {
            window_id,
            rank_in_window,
            window,
            config,
            local_histogram: vec![0; window.width()],
            log_dos: vec![0.0; bins],
            f: f0,
            rng,
            flatness: FlatnessController::new(Fraction),
        }
    }
}

impl<M: LatticeModel<Rng64>, F: Flatness> Walker<M, F> {
    /// Records a visit to global bin `bin` (1-based) that falls within this
    /// walker's window: bumps the local histogram and adds `f` to the
    /// walker's own log-DoS view.
    pub fn record(&mut self, bin: i64) {
        debug_assert!(self.window.contains(bin));
        let local_idx = (bin - self.window.lo as i64) as usize;
        self.local_histogram[local_idx] += 1;
        self.log_dos[(bin - 1) as usize] += self.f;
    }

    pub fn log_dos_at(&self, bin: i64) -> f64 {
        self.log_dos[(bin - 1) as usize]
    }
}
