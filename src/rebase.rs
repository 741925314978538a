//! # Log-DoS rebase
//!
//! Before an intra-window reduction, a walker's log-DoS is rebased:
//! subtract the minimum *positive* entry from every entry, then handle the
//! resulting negatives according to a [`RebaseMode`]. This normalizes the
//! zero of the DoS per walker before averaging.
//!
//! The source this crate is modeled on subtracts the minimum positive entry
//! and then takes the absolute value of whatever goes negative — which
//! could be read as "treat negative log-DoS as their magnitude" (intentional)
//! or as a bug (negatives should just be clamped to zero). Rather than pick
//! silently, this is an explicit, configured choice.

use serde::{Deserialize, Serialize};

/// How to handle entries that go negative after subtracting the minimum
/// positive log-DoS value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebaseMode {
    /// Reproduces the source literally: `abs(x)` for negative `x`.
    #[serde(rename = "abs")]
    AbsoluteValue,
    /// Treats the source's behavior as a bug: negatives are clamped to zero.
    #[serde(rename = "clamp")]
    ClampToZero,
}

impl Default for RebaseMode {
    fn default() -> Self {
        RebaseMode::AbsoluteValue
    }
}

/// Rebases `log_dos` in place per `mode`. A no-op if there are no positive
/// entries to rebase against.
pub fn rebase(log_dos: &mut [f64], mode: RebaseMode) {
    let min_positive = log_dos
        .iter()
        .copied()
        .filter(|&x| x > 0.0)
        .fold(f64::INFINITY, f64::min);

    if !min_positive.is_finite() {
        return;
    }

    for x in log_dos.iter_mut() {
        *x -= min_positive;
        if *x < 0.0 {
            *x = match mode {
                RebaseMode::AbsoluteValue => x.abs(),
                RebaseMode::ClampToZero => 0.0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_value_mode_mirrors_source() {
        let mut dos = vec![0.0, 3.0, 1.0, 5.0];
        rebase(&mut dos, RebaseMode::AbsoluteValue);
        // min positive is 1.0: subtract -> [-1, 2, 0, 4] -> abs negatives -> [1, 2, 0, 4]
        assert_eq!(dos, vec![1.0, 2.0, 0.0, 4.0]);
    }

    #[test]
    fn clamp_mode_zeroes_negatives() {
        let mut dos = vec![0.0, 3.0, 1.0, 5.0];
        rebase(&mut dos, RebaseMode::ClampToZero);
        assert_eq!(dos, vec![0.0, 2.0, 0.0, 4.0]);
    }

    #[test]
    fn no_positive_entries_is_noop() {
        let mut dos = vec![0.0, 0.0, 0.0];
        rebase(&mut dos, RebaseMode::AbsoluteValue);
        assert_eq!(dos, vec![0.0, 0.0, 0.0]);
    }
}
