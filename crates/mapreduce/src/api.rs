//! The external surface: [`start`], [`JobHandle::wait`], [`JobHandle::get_state`], and
//! [`JobHandle::close`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::MapReduceClient;
use crate::error::{panic_message, JobError, JobResult};
use crate::job::SharedJobState;
use crate::stage::Stage;
use crate::worker;

/// A snapshot of a job's progress, as returned by [`JobHandle::get_state`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobState {
    /// The current phase.
    pub stage: Stage,
    /// Progress within that phase, in `[0.0, 100.0]`.
    pub percentage: f64,
}

enum WaitSlot {
    Pending(Vec<std::thread::JoinHandle<()>>),
    Done(Option<Arc<JobError>>),
}

/// An opaque, owned handle to a running (or finished) job.
///
/// Dropping a handle without calling [`JobHandle::wait`] or [`JobHandle::close`] first does
/// not stop the job — its worker threads hold their own `Arc` to the shared state and run to
/// completion regardless.
pub struct JobHandle<C: MapReduceClient> {
    shared: Arc<SharedJobState<C>>,
    wait_slot: Mutex<WaitSlot>,
}

/// Starts a new job: spawns `n_workers` OS threads that will drive `input` through
/// `client.map`, a shuffle, and `client.reduce`.
///
/// # Panics
///
/// Panics if `n_workers` is `0` — a zero-party barrier has no sensible semantics, and failing
/// fast beats a job that can never progress past `MAP`.
///
/// # Errors
///
/// Returns [`JobError::ThreadSpawn`] if the OS refuses to create one of the worker threads.
pub fn start<C: MapReduceClient + 'static>(
    client: C,
    input: Vec<(C::K1, C::V1)>,
    n_workers: usize,
) -> JobResult<JobHandle<C>> {
    assert!(n_workers >= 1, "mapreduce: n_workers must be at least 1");

    let shared = Arc::new(SharedJobState::new(client, n_workers, input));
    let mut handles = Vec::with_capacity(n_workers);

    for worker_id in 0..n_workers {
        let shared = Arc::clone(&shared);
        let spawned = std::thread::Builder::new()
            .name(format!("mapreduce-worker-{worker_id}"))
            .spawn(move || worker::run(worker_id, shared));

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                let err = JobError::ThreadSpawn { worker_id, source };
                log::error!("{err}");
                // Any siblings spawned before this failure are already running against
                // `shared` and hold their own `Arc` clone; they'll run to completion (or hang
                // on the phase barrier, since fewer than `n_workers` parties will ever arrive)
                // without a caller-visible handle. There is no cooperative-cancellation
                // mechanism to unwind them (a documented non-goal), matching the distilled
                // spec's original "partial construction is fatal" contract as closely as a
                // library that must not kill its host process can.
                return Err(err);
            }
        }
    }

    log::debug!("started job with {n_workers} workers");
    Ok(JobHandle {
        shared,
        wait_slot: Mutex::new(WaitSlot::Pending(handles)),
    })
}

impl<C: MapReduceClient> JobHandle<C> {
    /// Blocks until every worker has finished. Idempotent: concurrent or repeated calls all
    /// observe the same outcome, and only the first caller actually joins the threads.
    ///
    /// # Errors
    ///
    /// Returns the first worker panic observed, if any.
    pub fn wait(&self) -> Result<(), Arc<JobError>> {
        let mut slot = self.wait_slot.lock();

        if let WaitSlot::Done(result) = &*slot {
            return result.clone().map_or(Ok(()), Err);
        }

        let WaitSlot::Pending(handles) = std::mem::replace(&mut *slot, WaitSlot::Done(None)) else {
            unreachable!("just checked for Done above")
        };

        let mut first_err = None;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            // Client panics are already caught inside `worker::run` and recorded via
            // `SharedJobState::record_panic`, so a worker thread panicking out to `join` here
            // means something escaped that net (e.g. a panic in a client-supplied `Ord`
            // implementation during shuffle, outside the map/reduce calls `catch_unwind`
            // wraps). Either source of failure is reported the same way.
            if let Err(payload) = handle.join() {
                let err = JobError::WorkerPanicked {
                    worker_id,
                    message: panic_message(&*payload),
                };
                log::error!("{err}");
                if first_err.is_none() {
                    first_err = Some(Arc::new(err));
                }
            }
        }

        if first_err.is_none() {
            if let Some((worker_id, message)) = self.shared.take_failure() {
                first_err = Some(Arc::new(JobError::WorkerPanicked { worker_id, message }));
            }
        }

        *slot = WaitSlot::Done(first_err.clone());
        first_err.map_or(Ok(()), Err)
    }

    /// A non-blocking snapshot of the job's current stage and progress percentage.
    ///
    /// Reads of the underlying counters may race with worker writes; the returned percentage
    /// may momentarily be stale, but is always in `[0.0, 100.0]`. This call never blocks a
    /// worker thread.
    pub fn get_state(&self) -> JobState {
        let stage = self.shared.stage.load();
        JobState {
            stage,
            percentage: self.shared.percentage(stage),
        }
    }

    /// Waits for the job to finish, then returns every pair published via `emit3`, in the
    /// order `emit3` calls were serialized (see the crate docs: unspecified across distinct
    /// `reduce` calls, preserved within one).
    ///
    /// # Errors
    ///
    /// Returns the first worker panic observed, if any; the output collected so far is
    /// discarded in that case, since a panicked job's output is not considered valid.
    pub fn close(self) -> Result<Vec<(C::K3, C::V3)>, Arc<JobError>> {
        self.wait()?;
        match Arc::try_unwrap(self.shared) {
            Ok(state) => {
                let guarded = state.guarded.into_inner();
                Ok(guarded.output)
            }
            Err(_still_shared) => {
                // Unreachable in practice: `wait` above has joined every worker thread, each
                // of which dropped its `Arc` clone on exit, so this handle holds the last one.
                log::error!("system error: job state outlived its workers; output unavailable");
                Ok(Vec::new())
            }
        }
    }
}
