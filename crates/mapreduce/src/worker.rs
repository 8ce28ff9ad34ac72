//! The body each of the `n_workers` OS threads runs: map, then (worker 0 only) shuffle, then
//! reduce.
//!
//! Every call into client code is wrapped in `catch_unwind`: a panicking `map`/`reduce`
//! must not leave siblings stuck forever on the next barrier (`std::sync::Barrier` has no
//! timeout and never releases short of every party arriving), so the panic is caught here,
//! recorded on [`SharedJobState::record_panic`], and the worker still runs its phase to
//! completion and crosses every remaining barrier exactly as it would have on success.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::client::{MapContext, MapReduceClient, ReduceContext};
use crate::error::panic_message;
use crate::job::SharedJobState;
use crate::stage::Stage;

/// Runs one worker's full map -> shuffle -> reduce lifecycle, returning once it has crossed
/// the terminal barrier. Only worker 0 performs the shuffle; every other worker is parked on
/// the post-shuffle barrier while that happens.
pub(crate) fn run<C: MapReduceClient>(worker_id: usize, shared: Arc<SharedJobState<C>>) {
    run_map_phase(worker_id, &shared);
    shared.barrier.arrive_and_wait();

    if worker_id == 0 {
        shared.stage.advance_to(Stage::Shuffle);
        log::debug!("worker 0 entering SHUFFLE");
        shared.shuffle_all_buffers();
    }
    shared.barrier.arrive_and_wait();

    run_reduce_phase(worker_id, &shared);
    shared.barrier.arrive_and_wait();

    // Every worker sets this on exit; the first one to do so is enough for observers to see
    // 100%, and the write is idempotent.
    shared.finished.store(true, std::sync::atomic::Ordering::Release);
}

fn run_map_phase<C: MapReduceClient>(worker_id: usize, shared: &Arc<SharedJobState<C>>) {
    shared.stage.advance_to(Stage::Map);
    log::debug!("worker {worker_id} entering MAP");

    let mut buffer: Vec<(C::K2, C::V2)> = Vec::new();
    while let Some((k1, v1)) = shared.pop_input() {
        let mut context = MapContext::new(worker_id, &mut buffer);
        let client = &shared.client;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            client.map(&k1, &v1, &mut context);
        }));
        if let Err(payload) = outcome {
            shared.record_panic(worker_id, panic_message(&*payload));
            break;
        }
    }

    shared.commit_map_buffer(worker_id, buffer);
}

fn run_reduce_phase<C: MapReduceClient>(worker_id: usize, shared: &Arc<SharedJobState<C>>) {
    shared.stage.advance_to(Stage::Reduce);
    log::debug!("worker {worker_id} entering REDUCE");

    while let Some((_key, group)) = shared.take_group() {
        let mut context = ReduceContext::new(worker_id, shared);
        let client = &shared.client;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            client.reduce(&group, &mut context);
        }));
        if let Err(payload) = outcome {
            shared.record_panic(worker_id, panic_message(&*payload));
            break;
        }
    }
}
