#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! An in-process, thread-pool MapReduce runtime.
//!
//! A job drives a caller-supplied [`MapReduceClient`] through three phases — `map`, `shuffle`,
//! `reduce` — across a fixed pool of OS threads, synchronized by a barrier reused three times
//! (post-map, post-shuffle, terminal). [`start`] spawns the pool and returns a [`JobHandle`]
//! that can be polled with [`JobHandle::get_state`], joined with [`JobHandle::wait`], or
//! consumed for its output with [`JobHandle::close`].

mod api;
mod barrier;
mod client;
mod error;
mod job;
mod stage;
mod worker;

pub use api::{start, JobHandle, JobState};
pub use client::{MapContext, MapReduceClient, ReduceContext};
pub use error::{JobError, JobResult};
pub use stage::Stage;
