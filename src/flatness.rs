//! # Histogram flatness criteria and the refinement controller
//!
//! This module provides implementations of the [`Flatness`] trait for
//! determining when a per-walker histogram is sufficiently "flat", plus
//! [`FlatnessController`], which layers the first-reset latch and the
//! `min > 10` guard from the component design on top of a chosen criterion.
//!
//! Two criteria are provided:
//!
//! - [`Fraction`]: flat once `min(H) > flat * mean(H)`
//! - [`RMS`]: flat once the coefficient of variation drops below `1 - flat`
//!
//! Custom criteria can be implemented by implementing the [`Flatness`] trait.

use crate::traits::Flatness;

/// Considers a histogram flat when `min(H) > flat * mean(H)`.
///
/// This is the criterion used by the component design's flatness controller:
/// `flatness = min(local_histogram) / mean(local_histogram)`, compared
/// strictly against `flatness_tolerance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fraction;

impl Flatness for Fraction {
    fn is_flat(&self, hist: &[u64], flat: f64) -> bool {
        if hist.is_empty() {
            return false;
        }

        let min = *hist.iter().min().unwrap() as f64;
        let avg = hist.iter().sum::<u64>() as f64 / hist.len() as f64;

        min > flat * avg
    }
}

/// Considers a histogram flat when the relative standard deviation
/// `σ/μ ≤ (1 - flat)`.
///
/// An alternative criterion to [`Fraction`], provided for users who want a
/// stricter, variance-based measure of flatness. Not used by the default
/// refinement controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RMS;

impl Flatness for RMS {
    fn is_flat(&self, hist: &[u64], flat: f64) -> bool {
        if hist.is_empty() {
            return false;
        }

        let mean = hist.iter().sum::<u64>() as f64 / hist.len() as f64;

        let var = hist
            .iter()
            .map(|&h| {
                let d = h as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / hist.len() as f64;

        let rel_std_dev = var.sqrt() / mean;

        rel_std_dev <= 1.0 - flat
    }
}

/// The minimum per-bin visit count required before any flatness check fires,
/// discarding the unphysical initial exploration of a window.
const MIN_VISITS: u64 = 10;

/// Wraps a [`Flatness`] criterion with the first-reset latch and refinement
/// trigger from the component design.
///
/// Behavior:
/// - **First reset**: until `min(hist) > 10` for the first time, `check`
///   never fires; once it does, the latch trips and the histogram is
///   zeroed, discarding the initial burn-in-adjacent exploration.
/// - **Refinement**: thereafter, `check` returns `true` (and zeros the
///   histogram) whenever `min(hist) > 10` and the wrapped criterion reports
///   flat.
#[derive(Debug, Clone)]
pub struct FlatnessController<F: Flatness = Fraction> {
    criterion: F,
    first_reset_done: bool,
}

impl<F: Flatness> FlatnessController<F> {
    pub fn new(criterion: F) -> Self {
        Self {
            criterion,
            first_reset_done: false,
        }
    }

    pub fn first_reset_done(&self) -> bool {
        self.first_reset_done
    }

    /// Inspects `hist`, possibly zeroing it, and reports whether this call
    /// should trigger a refinement (f-halving + reductions).
    pub fn check(&mut self, hist: &mut [u64], flatness_tolerance: f64) -> bool {
        let min = *hist.iter().min().unwrap_or(&0);

        if !self.first_reset_done {
            if min > MIN_VISITS {
                self.first_reset_done = true;
                hist.iter_mut().for_each(|h| *h = 0);
            }
            return false;
        }

        if min > MIN_VISITS && self.criterion.is_flat(hist, flatness_tolerance) {
            hist.iter_mut().for_each(|h| *h = 0);
            return true;
        }

        false
    }
}

impl Default for FlatnessController<Fraction> {
    fn default() -> Self {
        Self::new(Fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_flat_example() {
        let hist = vec![80u64, 95, 103, 88, 90];
        assert!(Fraction.is_flat(&hist, 0.7));
        assert!(!Fraction.is_flat(&hist, 0.95));
    }

    #[test]
    fn controller_ignores_first_unflat_histogram() {
        let mut ctrl = FlatnessController::new(Fraction);
        let mut hist = vec![1u64, 2, 0, 3];
        assert!(!ctrl.check(&mut hist, 0.8));
        assert!(!ctrl.first_reset_done());
    }

    #[test]
    fn controller_latches_first_reset_then_refines() {
        let mut ctrl = FlatnessController::new(Fraction);
        let mut hist = vec![20u64, 20, 20, 20];
        // First call with min > 10: trips the latch and zeroes, no refine yet.
        assert!(!ctrl.check(&mut hist, 0.8));
        assert!(ctrl.first_reset_done());
        assert!(hist.iter().all(|&h| h == 0));

        // Refill the histogram flat and above threshold: now it refines.
        hist.iter_mut().for_each(|h| *h = 20);
        assert!(ctrl.check(&mut hist, 0.8));
        assert!(hist.iter().all(|&h| h == 0));
    }
}
