//! The job stage enum and its atomic storage.

use std::sync::atomic::{AtomicU8, Ordering};

/// The current phase of a job, observable from any thread without blocking workers.
///
/// `stage` only ever advances: `Undefined -> Map -> Shuffle -> Reduce`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Stage {
    /// No worker has started yet.
    Undefined = 0,
    /// Workers are draining `input` and calling `client.map`.
    Map = 1,
    /// Worker 0 is grouping intermediate pairs by key; all others are blocked on the barrier.
    Shuffle = 2,
    /// Workers are draining `shuffled_map` and calling `client.reduce`.
    Reduce = 3,
}

impl Stage {
    fn from_u8(value: u8) -> Stage {
        match value {
            0 => Stage::Undefined,
            1 => Stage::Map,
            2 => Stage::Shuffle,
            _ => Stage::Reduce,
        }
    }
}

/// An atomic cell holding a [`Stage`], safe to read from an observer thread while workers
/// write to it.
pub(crate) struct AtomicStage(AtomicU8);

impl AtomicStage {
    pub(crate) fn new(stage: Stage) -> Self {
        Self(AtomicU8::new(stage as u8))
    }

    /// Every worker calls this at phase entry with the same value; the race is benign because
    /// the write is atomic and idempotent (see Design Notes: "Stage write races").
    pub(crate) fn advance_to(&self, stage: Stage) {
        self.0.store(stage as u8, Ordering::Release);
    }

    pub(crate) fn load(&self) -> Stage {
        Stage::from_u8(self.0.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u8() {
        for stage in [Stage::Undefined, Stage::Map, Stage::Shuffle, Stage::Reduce] {
            let cell = AtomicStage::new(stage);
            assert_eq!(cell.load(), stage);
        }
    }

    #[test]
    fn ordinal_values_match_the_documented_constants() {
        assert_eq!(Stage::Undefined as u8, 0);
        assert_eq!(Stage::Map as u8, 1);
        assert_eq!(Stage::Shuffle as u8, 2);
        assert_eq!(Stage::Reduce as u8, 3);
    }
}
