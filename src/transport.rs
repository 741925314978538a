//! # Collective-communication substrate
//!
//! A minimal message-passing trait satisfying §5's suspension points: a
//! global barrier, intra-window gather/scatter, inter-window send/receive,
//! and a min/max reduction for wall-clock reporting. [`LocalTransport`] is
//! the trivial single-rank implementation used when `num_proc == 1`.
//! [`ThreadTransport`] realizes `num_proc` ranks as scoped OS threads
//! communicating over a full mesh of bounded `crossbeam_channel` pairs,
//! grounded on the worker-thread/channel pattern used to farm out chain
//! bursts across threads elsewhere in this codebase's lineage.

use std::sync::{Arc, Barrier, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::TransportError;

/// Identifies the purpose of a message so out-of-order arrivals across
/// windows never get matched to the wrong receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub window_id: usize,
    pub phase: Phase,
}

/// The protocol phase a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Intra-window gather: non-root walkers send their log-DoS view.
    IntraGather,
    /// Intra-window scatter: the window root broadcasts the averaged view.
    IntraScatter,
    /// Inter-window stitch: a window root sends its averaged DoS to rank 0.
    InterStitch,
}

/// The collective-communication contract the orchestrator depends on.
pub trait Transport {
    /// Total number of ranks participating in the run.
    fn size(&self) -> usize;

    /// This transport handle's own rank, in `[0, size())`.
    fn rank(&self) -> usize;

    /// Sends `payload` to `dst`, tagged `tag`.
    fn send(&self, dst: usize, tag: Tag, payload: &[f64]) -> Result<(), TransportError>;

    /// Blocks until a message tagged `tag` arrives from `src`.
    fn recv(&self, src: usize, tag: Tag) -> Result<Vec<f64>, TransportError>;

    /// Blocks until every rank has called `barrier`.
    fn barrier(&self);

    /// Collectively reduces `value`: every rank receives the true
    /// `(min, max)` across all ranks' inputs.
    fn reduce_min_max(&self, value: f64) -> (f64, f64);

    /// Terminates the whole run immediately, modeling a fatal collective
    /// failure that no peer can recover from. Never returns.
    fn abort(&self, message: &str) -> ! {
        tracing::error!(rank = self.rank(), %message, "aborting run");
        std::process::exit(1);
    }
}

/// The trivial single-rank transport: `size() == 1`, every send/recv is
/// unreachable in correct usage, `barrier` and `reduce_min_max` are no-ops.
/// Used to drive the orchestrator with `num_proc = num_windows = 1` without
/// spawning any threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn size(&self) -> usize {
        1
    }

    fn rank(&self) -> usize {
        0
    }

    fn send(&self, dst: usize, tag: Tag, _payload: &[f64]) -> Result<(), TransportError> {
        Err(TransportError::SendFailed {
            dst,
            tag: format!("{:?}", tag),
            reason: "LocalTransport has no peers".to_string(),
        })
    }

    fn recv(&self, src: usize, tag: Tag) -> Result<Vec<f64>, TransportError> {
        Err(TransportError::RecvFailed {
            src,
            tag: format!("{:?}", tag),
            reason: "LocalTransport has no peers".to_string(),
        })
    }

    fn barrier(&self) {}

    fn reduce_min_max(&self, value: f64) -> (f64, f64) {
        (value, value)
    }
}

/// One rank's view of a full mesh of channels: `inboxes[src]` is this rank's
/// receiving end for messages from `src`.
struct Mesh {
    outboxes: Vec<Sender<(Tag, Vec<f64>)>>,
    inboxes: Vec<Receiver<(Tag, Vec<f64>)>>,
}

/// A `num_proc`-rank transport where every rank owns an end of a full mesh
/// of bounded channels, plus a shared barrier and a shared scratch buffer
/// for the min/max reduction.
pub struct ThreadTransport {
    rank: usize,
    mesh: Mesh,
    barrier: Arc<Barrier>,
    reduce_scratch: Arc<Mutex<Vec<Option<f64>>>>,
    reduce_ready: Arc<Barrier>,
}

impl ThreadTransport {
    /// Builds `size` linked transport handles, one per rank, ready to be
    /// moved into `size` scoped threads.
    pub fn mesh(size: usize) -> Vec<ThreadTransport> {
        let mut senders: Vec<Vec<Sender<(Tag, Vec<f64>)>>> = vec![Vec::with_capacity(size); size];
        let mut receivers: Vec<Vec<Receiver<(Tag, Vec<f64>)>>> =
            vec![Vec::with_capacity(size); size];

        for src in 0..size {
            for dst in 0..size {
                let (tx, rx) = bounded(64);
                senders[src].push(tx);
                receivers[dst].push(rx);
            }
        }

        let barrier = Arc::new(Barrier::new(size));
        let reduce_ready = Arc::new(Barrier::new(size));
        let reduce_scratch = Arc::new(Mutex::new(vec![None; size]));

        (0..size)
            .map(|rank| ThreadTransport {
                rank,
                mesh: Mesh {
                    outboxes: senders[rank].clone(),
                    inboxes: std::mem::take(&mut receivers[rank]),
                },
                barrier: barrier.clone(),
                reduce_scratch: reduce_scratch.clone(),
                reduce_ready: reduce_ready.clone(),
            })
            .collect()
    }
}

impl Transport for ThreadTransport {
    fn size(&self) -> usize {
        self.mesh.outboxes.len()
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn send(&self, dst: usize, tag: Tag, payload: &[f64]) -> Result<(), TransportError> {
        self.mesh.outboxes[dst]
            .send((tag, payload.to_vec()))
            .map_err(|_| TransportError::SendFailed {
                dst,
                tag: format!("{:?}", tag),
                reason: "peer channel closed".to_string(),
            })
    }

    fn recv(&self, src: usize, tag: Tag) -> Result<Vec<f64>, TransportError> {
        // Messages from `src` are delivered in FIFO order on a dedicated
        // channel, so a tag mismatch here means the protocol stepped out of
        // lock-step, not a genuine ambiguity between windows.
        let (got_tag, payload) =
            self.mesh.inboxes[src]
                .recv()
                .map_err(|_| TransportError::RecvFailed {
                    src,
                    tag: format!("{:?}", tag),
                    reason: "peer disconnected".to_string(),
                })?;

        if got_tag != tag {
            return Err(TransportError::RecvFailed {
                src,
                tag: format!("{:?}", tag),
                reason: format!("got mismatched tag {:?}", got_tag),
            });
        }

        Ok(payload)
    }

    fn barrier(&self) {
        self.barrier.wait();
    }

    fn reduce_min_max(&self, value: f64) -> (f64, f64) {
        {
            let mut scratch = self.reduce_scratch.lock().unwrap();
            scratch[self.rank] = Some(value);
        }
        self.reduce_ready.wait();

        let result = {
            let scratch = self.reduce_scratch.lock().unwrap();
            let min = scratch.iter().flatten().copied().fold(f64::INFINITY, f64::min);
            let max = scratch
                .iter()
                .flatten()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            (min, max)
        };

        // Second rendezvous so no rank clears scratch before a slower rank
        // has read it for this round.
        self.reduce_ready.wait();
        if self.rank == 0 {
            let mut scratch = self.reduce_scratch.lock().unwrap();
            scratch.iter_mut().for_each(|s| *s = None);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_transport_reduce_is_identity() {
        let t = LocalTransport;
        assert_eq!(t.reduce_min_max(3.5), (3.5, 3.5));
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn thread_transport_send_recv_round_trip() {
        let mut handles = ThreadTransport::mesh(2);
        let t1 = handles.pop().unwrap();
        let t0 = handles.pop().unwrap();

        let tag = Tag { window_id: 0, phase: Phase::IntraGather };
        std::thread::scope(|scope| {
            scope.spawn(|| {
                t0.send(1, tag, &[1.0, 2.0, 3.0]).unwrap();
            });
            scope.spawn(|| {
                let got = t1.recv(0, tag).unwrap();
                assert_eq!(got, vec![1.0, 2.0, 3.0]);
            });
        });
    }

    #[test]
    fn thread_transport_reduce_min_max_across_ranks() {
        let handles = ThreadTransport::mesh(3);
        let values = [5.0, 1.0, 9.0];

        let results: Vec<(f64, f64)> = std::thread::scope(|scope| {
            let joins: Vec<_> = handles
                .into_iter()
                .enumerate()
                .map(|(i, t)| scope.spawn(move || t.reduce_min_max(values[i])))
                .collect();
            joins.into_iter().map(|j| j.join().unwrap()).collect()
        });

        for r in results {
            assert_eq!(r, (1.0, 9.0));
        }
    }

    #[test]
    fn thread_transport_barrier_releases_all_ranks() {
        let handles = ThreadTransport::mesh(4);
        std::thread::scope(|scope| {
            for t in handles {
                scope.spawn(move || t.barrier());
            }
        });
    }
}
