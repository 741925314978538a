//! # Intra-window reducer
//!
//! On a flatness event, every walker in a window sends its (rebased)
//! log-DoS view to the window's root rank; the root averages them and
//! scatters the mean back, so every walker in the window ends the round
//! holding a bitwise-identical DoS view: §4.6 of the component design.

use crate::error::TransportError;
use crate::transport::{Phase, Tag, Transport};

/// Runs the gather/scatter for one window.
///
/// `window_root` and `peers` are absolute transport ranks; `peers` excludes
/// `window_root` itself. `local_dos` is this call's own pre-reduction view;
/// it is overwritten in place with the averaged result.
pub fn reduce_window<T: Transport>(
    transport: &T,
    window_id: usize,
    window_root: usize,
    peers: &[usize],
    local_dos: &mut [f64],
) -> Result<(), TransportError> {
    let my_rank = transport.rank();
    let tag_gather = Tag { window_id, phase: Phase::IntraGather };
    let tag_scatter = Tag { window_id, phase: Phase::IntraScatter };

    if my_rank == window_root {
        let mut sum = local_dos.to_vec();
        for &peer in peers {
            let received = transport.recv(peer, tag_gather)?;
            for (s, r) in sum.iter_mut().zip(received.iter()) {
                *s += r;
            }
        }

        let n = peers.len() as f64 + 1.0;
        for s in sum.iter_mut() {
            *s /= n;
        }

        for &peer in peers {
            transport.send(peer, tag_scatter, &sum)?;
        }

        local_dos.copy_from_slice(&sum);
    } else {
        transport.send(window_root, tag_gather, local_dos)?;
        let averaged = transport.recv(window_root, tag_scatter)?;
        local_dos.copy_from_slice(&averaged);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ThreadTransport;

    #[test]
    fn averages_three_walkers_to_identical_views() {
        let handles = ThreadTransport::mesh(3);
        let inputs = [vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let expected = vec![3.0, 4.0];

        let results: Vec<Vec<f64>> = std::thread::scope(|scope| {
            let joins: Vec<_> = handles
                .into_iter()
                .enumerate()
                .map(|(i, t)| {
                    let mut local = inputs[i].clone();
                    scope.spawn(move || {
                        let peers: Vec<usize> = (0..3).filter(|&r| r != 0).collect();
                        reduce_window(&t, 0, 0, &peers, &mut local).unwrap();
                        local
                    })
                })
                .collect();
            joins.into_iter().map(|j| j.join().unwrap()).collect()
        });

        for r in results {
            assert_eq!(r, expected);
        }
    }
}
