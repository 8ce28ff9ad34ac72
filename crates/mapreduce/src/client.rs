//! The contract a caller implements to describe a job's business logic, and the two
//! `emit` callbacks the runtime hands back during `map`/`reduce`.

use crate::job::SharedJobState;

/// The map/reduce business logic for a job.
///
/// `K2` is the only type this trait asks anything of beyond `Send`: it must be [`Ord`] so the
/// shuffle phase can group intermediate pairs by key, and [`Clone`] because the shuffled map
/// is keyed by `K2` while also storing `K2` alongside each `V2` inside its group (an owned key
/// is needed both as the map key and inside the stored pair).
///
/// Implementations must not retain references to the `key`/`value` arguments past the call —
/// the runtime reuses and eventually drops the backing storage once the callback returns.
pub trait MapReduceClient: Send + Sync {
    /// Input key type.
    type K1: Send;
    /// Input value type.
    type V1: Send;
    /// Intermediate key type. Totally ordered; see the trait docs.
    type K2: Ord + Clone + Send;
    /// Intermediate value type.
    type V2: Send;
    /// Output key type.
    type K3: Send;
    /// Output value type.
    type V3: Send;

    /// Transforms one input pair into zero or more intermediate pairs, publishing each one via
    /// `context.emit2`.
    fn map(&self, key: &Self::K1, value: &Self::V1, context: &mut MapContext<'_, Self>);

    /// Aggregates one group of intermediate pairs — all sharing a single `K2` under the
    /// comparator — into zero or more output pairs, publishing each one via `context.emit3`.
    ///
    /// Every pair in `group` has an equal-valued `K2` (invariant 4 of the job engine): neither
    /// `<` nor `>` holds between any two keys in the group.
    fn reduce(&self, group: &[(Self::K2, Self::V2)], context: &mut ReduceContext<'_, Self>);
}

/// Handed to [`MapReduceClient::map`]; the only way to publish an intermediate pair.
///
/// Appending to the worker's private buffer needs no lock: the buffer is only ever touched by
/// this worker during MAP, and is only read by worker 0 during SHUFFLE, after the post-map
/// barrier has synchronized-with every write made here.
pub struct MapContext<'w, C: MapReduceClient> {
    worker_id: usize,
    buffer: &'w mut Vec<(C::K2, C::V2)>,
}

impl<'w, C: MapReduceClient> MapContext<'w, C> {
    pub(crate) fn new(worker_id: usize, buffer: &'w mut Vec<(C::K2, C::V2)>) -> Self {
        Self { worker_id, buffer }
    }

    /// The id of the worker currently running `map`.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Publishes one intermediate pair.
    pub fn emit2(&mut self, key: C::K2, value: C::V2) {
        self.buffer.push((key, value));
    }
}

/// Handed to [`MapReduceClient::reduce`]; the only way to publish an output pair.
///
/// Appending to `output` is serialized through the shared job mutex, since multiple reduce
/// workers may call `emit3` concurrently.
pub struct ReduceContext<'j, C: MapReduceClient> {
    worker_id: usize,
    shared: &'j SharedJobState<C>,
}

impl<'j, C: MapReduceClient> ReduceContext<'j, C> {
    pub(crate) fn new(worker_id: usize, shared: &'j SharedJobState<C>) -> Self {
        Self { worker_id, shared }
    }

    /// The id of the worker currently running `reduce`.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Publishes one output pair. Safe to call more than once per group: `reduced_count`
    /// progress is credited once per group at the point it was taken from the shuffled map
    /// (see the crate-level docs on the accounting policy), not per `emit3` call, so emitting
    /// several outputs from one `reduce` call never overshoots 100%.
    pub fn emit3(&mut self, key: C::K3, value: C::V3) {
        let mut guarded = self.shared.lock_guarded();
        guarded.output.push((key, value));
    }
}
