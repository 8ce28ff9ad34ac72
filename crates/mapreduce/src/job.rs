//! `SharedJobState`: the data every worker thread and the job handle both reach into.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::barrier::PhaseBarrier;
use crate::client::MapReduceClient;
use crate::stage::{AtomicStage, Stage};

/// The subset of job state that's mutated under a single lock because the phases that touch
/// it never overlap in time: `input` only moves during MAP, `shuffled_map` only during
/// REDUCE's group hand-out, `output` only during REDUCE's `emit3` calls. Reusing one mutex for
/// all three (rather than one per field) mirrors the single `input_mutex` of the distilled
/// specification.
pub(crate) struct Guarded<C: MapReduceClient> {
    pub(crate) input: Vec<(C::K1, C::V1)>,
    pub(crate) shuffled_map: BTreeMap<C::K2, Vec<(C::K2, C::V2)>>,
    pub(crate) output: Vec<(C::K3, C::V3)>,
}

/// Everything a job's worker threads and its external [`crate::JobHandle`] share.
pub(crate) struct SharedJobState<C: MapReduceClient> {
    pub(crate) client: C,
    pub(crate) n_workers: usize,
    pub(crate) initial_input_size: usize,
    pub(crate) stage: AtomicStage,
    /// Pairs remaining in `input`, tracked independently of the mutex so `get_state` never
    /// has to take a lock a worker might be holding.
    pub(crate) remaining_input: AtomicUsize,
    /// Known exactly once every worker has crossed the post-map barrier.
    pub(crate) total_intermediate: AtomicUsize,
    pub(crate) shuffled_count: AtomicUsize,
    pub(crate) reduced_count: AtomicUsize,
    pub(crate) finished: AtomicBool,
    pub(crate) barrier: PhaseBarrier,
    /// One slot per worker, committed exactly once (by its owner, at the end of MAP) and read
    /// exactly once (by worker 0, during SHUFFLE). Uncontended in the common case, but a
    /// `Mutex` rather than an unsynchronized cell because this crate forbids `unsafe`.
    pub(crate) worker_buffers: Vec<Mutex<Vec<(C::K2, C::V2)>>>,
    pub(crate) guarded: Mutex<Guarded<C>>,
    /// The first worker panic observed, if any. `worker::run` catches each phase's client
    /// call with `catch_unwind` and records the failure here rather than letting the panic
    /// unwind out of the worker's thread entry point, so siblings parked on a barrier are
    /// never starved by a panicking peer (see `worker.rs`).
    pub(crate) failure: Mutex<Option<(usize, String)>>,
}

impl<C: MapReduceClient> SharedJobState<C> {
    pub(crate) fn new(client: C, n_workers: usize, input: Vec<(C::K1, C::V1)>) -> Self {
        let initial_input_size = input.len();
        if initial_input_size == 0 {
            log::warn!("starting job with empty input; it will complete immediately");
        }
        Self {
            client,
            n_workers,
            initial_input_size,
            stage: AtomicStage::new(Stage::Undefined),
            remaining_input: AtomicUsize::new(initial_input_size),
            total_intermediate: AtomicUsize::new(0),
            shuffled_count: AtomicUsize::new(0),
            reduced_count: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            barrier: PhaseBarrier::new(n_workers),
            worker_buffers: (0..n_workers).map(|_| Mutex::new(Vec::new())).collect(),
            guarded: Mutex::new(Guarded {
                input,
                shuffled_map: BTreeMap::new(),
                output: Vec::new(),
            }),
            failure: Mutex::new(None),
        }
    }

    /// Locks the shared mutex. `parking_lot::Mutex` carries no poisoning concept, so one
    /// worker panicking while this lock is held never contaminates it for every other
    /// observer the way a `std::sync::Mutex` would; panics are instead caught and recorded
    /// at the worker-phase boundary (see `worker::run` and [`Self::record_panic`]).
    pub(crate) fn lock_guarded(&self) -> parking_lot::MutexGuard<'_, Guarded<C>> {
        self.guarded.lock()
    }

    fn lock_worker_buffer(&self, worker_id: usize) -> parking_lot::MutexGuard<'_, Vec<(C::K2, C::V2)>> {
        self.worker_buffers[worker_id].lock()
    }

    /// Records the first worker panic observed by [`crate::worker::run`]'s `catch_unwind`.
    /// Later panics from other workers are logged but not retained, since `wait` surfaces
    /// only one fatal error per job.
    pub(crate) fn record_panic(&self, worker_id: usize, message: String) {
        log::error!("system error: worker {worker_id} panicked: {message}");
        let mut slot = self.failure.lock();
        if slot.is_none() {
            *slot = Some((worker_id, message));
        }
    }

    /// Takes the recorded panic, if any, for [`crate::JobHandle::wait`] to surface.
    pub(crate) fn take_failure(&self) -> Option<(usize, String)> {
        self.failure.lock().take()
    }

    /// Pops one input pair for a worker to `map`, LIFO (see Design Notes: this is a
    /// performance choice, not a semantic one — map order is irrelevant).
    pub(crate) fn pop_input(&self) -> Option<(C::K1, C::V1)> {
        let mut guarded = self.lock_guarded();
        let popped = guarded.input.pop();
        if popped.is_some() {
            self.remaining_input.fetch_sub(1, Ordering::Release);
        }
        popped
    }

    /// Commits a worker's finished map buffer and folds its length into `total_intermediate`.
    pub(crate) fn commit_map_buffer(&self, worker_id: usize, buffer: Vec<(C::K2, C::V2)>) {
        log::debug!(
            "worker {worker_id} finished MAP with {} intermediate pairs",
            buffer.len()
        );
        self.total_intermediate
            .fetch_add(buffer.len(), Ordering::AcqRel);
        *self.lock_worker_buffer(worker_id) = buffer;
    }

    /// Worker 0 only: groups every committed buffer into `shuffled_map`, in worker-id order,
    /// preserving each buffer's `emit2` order within its group.
    pub(crate) fn shuffle_all_buffers(&self) {
        log::debug!("shuffling {} worker buffers into groups", self.n_workers);
        let mut guarded = self.lock_guarded();
        for worker_id in 0..self.n_workers {
            let buffer = std::mem::take(&mut *self.lock_worker_buffer(worker_id));
            for (k2, v2) in buffer {
                guarded
                    .shuffled_map
                    .entry(k2.clone())
                    .or_default()
                    .push((k2, v2));
                self.shuffled_count.fetch_add(1, Ordering::Release);
            }
        }
        log::debug!("shuffle produced {} groups", guarded.shuffled_map.len());
    }

    /// Takes the lowest-keyed group out of `shuffled_map`, if any remain, crediting its size to
    /// `reduced_count` immediately (see the accounting policy in the crate docs).
    pub(crate) fn take_group(&self) -> Option<(C::K2, Vec<(C::K2, C::V2)>)> {
        let mut guarded = self.lock_guarded();
        let group = guarded.shuffled_map.pop_first();
        if let Some((_, pairs)) = &group {
            log::trace!("dispatching reduce over a group of {} pairs", pairs.len());
            self.reduced_count.fetch_add(pairs.len(), Ordering::Release);
        }
        group
    }

    pub(crate) fn percentage(&self, stage: Stage) -> f64 {
        if self.finished.load(Ordering::Acquire) {
            return 100.0;
        }
        match stage {
            Stage::Undefined => 0.0,
            Stage::Map => {
                if self.initial_input_size == 0 {
                    0.0
                } else {
                    let remaining = self.remaining_input.load(Ordering::Acquire) as f64;
                    100.0 * (1.0 - remaining / self.initial_input_size as f64)
                }
            }
            Stage::Shuffle => {
                let total = self.total_intermediate.load(Ordering::Acquire);
                if total == 0 {
                    0.0
                } else {
                    100.0 * self.shuffled_count.load(Ordering::Acquire) as f64 / total as f64
                }
            }
            Stage::Reduce => {
                let total = self.total_intermediate.load(Ordering::Acquire);
                if total == 0 {
                    0.0
                } else {
                    100.0 * self.reduced_count.load(Ordering::Acquire) as f64 / total as f64
                }
            }
        }
    }
}
