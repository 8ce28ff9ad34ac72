//! The error hierarchy for the job engine.
//!
//! [`JobError`] distinguishes the one kind of failure this crate treats as fatal — an OS
//! primitive that refused to cooperate, or client code that panicked — from ordinary misuse
//! (zero workers, emitting outside `map`/`reduce`), which the engine does not validate at all
//! and leaves as undefined behavior, matching the distilled specification.
//!
//! There is no `LockPoisoned` variant: every shared lock in this crate is a
//! `parking_lot::Mutex`, which carries no poisoning concept, so a panic while a lock is held
//! never needs to be reported as a distinct system error — it's caught and reported as
//! [`JobError::WorkerPanicked`] instead (see `worker.rs`).

use std::fmt;

/// A fatal failure of the job engine.
///
/// Every variant corresponds to something the distilled specification calls a "system error":
/// it is reported on the diagnostic channel (via [`log::error!`]) before being returned to the
/// caller of [`crate::start`] or [`crate::JobHandle::wait`].
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Spawning one of the `n_workers` OS threads failed.
    #[error("system error: failed to spawn worker {worker_id}: {source}")]
    ThreadSpawn {
        /// The worker id that failed to spawn.
        worker_id: usize,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A worker's `map` or `reduce` call panicked (caught and recorded by `worker::run`'s
    /// `catch_unwind`), or a panic escaped the worker's top-level closure some other way —
    /// e.g. a client-supplied `Ord` implementation panicking during the shuffle phase's
    /// `BTreeMap` operations, which fall outside the map/reduce calls `catch_unwind` wraps.
    #[error("system error: worker {worker_id} panicked: {message}")]
    WorkerPanicked {
        /// The worker id that panicked.
        worker_id: usize,
        /// A best-effort description of the panic payload.
        message: String,
    },
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Result alias used throughout the public API.
pub type JobResult<T> = Result<T, JobError>;

impl fmt::Display for crate::stage::Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            crate::stage::Stage::Undefined => "UNDEFINED",
            crate::stage::Stage::Map => "MAP",
            crate::stage::Stage::Shuffle => "SHUFFLE",
            crate::stage::Stage::Reduce => "REDUCE",
        };
        f.write_str(label)
    }
}
