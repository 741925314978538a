//! # Inter-window stitcher
//!
//! After every refinement the root assembles the global DoS curve by
//! walking windows left to right, vertically shifting each subsequent
//! window so its overlap region matches the running global curve in mean:
//! §4.7 of the component design.

use crate::error::StitchError;
use crate::partition::Window;

/// One window's averaged log-DoS (indexed `0..window.width()`, local bin 0
/// is global bin `window.lo`), as gathered by the root for stitching.
pub struct WindowDos {
    pub window: Window,
    pub log_dos: Vec<f64>,
}

/// Assembles the global log-DoS buffer (length `bins`, 0-indexed for global
/// bin `i+1`) from window 1's already-authoritative values and every
/// subsequent window's averaged view, each vertically shifted to match the
/// running curve over its qualifying overlap positions.
///
/// `overlap` is the configured bin overlap; `min_val` is the qualifying
/// threshold (`tolerance * 1e-1` per the component design).
pub fn stitch_all(
    bins: usize,
    windows: &[WindowDos],
    overlap: usize,
    min_val: f64,
) -> Result<Vec<f64>, StitchError> {
    let mut global = vec![0.0f64; bins];

    let first = &windows[0];
    for (local_idx, &val) in first.log_dos.iter().enumerate() {
        global[first.window.lo - 1 + local_idx] = val;
    }

    for (w_index, w) in windows.iter().enumerate().skip(1) {
        let lo = w.window.lo;

        let mut sum = 0.0;
        let mut count = 0usize;
        for j in 0..overlap {
            let global_idx = lo - 1 + j;
            let global_val = global[global_idx];
            let received_val = w.log_dos[j];
            if global_val > min_val && received_val > min_val {
                sum += global_val - received_val;
                count += 1;
            }
        }

        if count == 0 {
            return Err(StitchError {
                window: w_index + 1,
                min_val,
            });
        }

        let scale = sum / count as f64;

        for j in overlap..w.window.width() {
            let global_idx = lo - 1 + j;
            global[global_idx] = w.log_dos[j] + scale;
        }
    }

    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_two_window_stitch() {
        let windows = vec![
            WindowDos {
                window: Window { lo: 1, hi: 5 },
                log_dos: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            },
            WindowDos {
                window: Window { lo: 4, hi: 10 },
                log_dos: vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0],
            },
        ];

        let global = stitch_all(10, &windows, 2, 0.0).unwrap();

        assert_eq!(
            global,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
        );
    }

    #[test]
    fn no_qualifying_overlap_is_stitch_error() {
        let windows = vec![
            WindowDos {
                window: Window { lo: 1, hi: 5 },
                log_dos: vec![0.0, 0.0, 0.0, 0.0, 0.0],
            },
            WindowDos {
                window: Window { lo: 4, hi: 10 },
                log_dos: vec![0.0, 0.0, 12.0, 13.0, 14.0, 15.0, 16.0],
            },
        ];

        let err = stitch_all(10, &windows, 2, 1.0).unwrap_err();
        assert_eq!(err.window, 2);
    }
}
