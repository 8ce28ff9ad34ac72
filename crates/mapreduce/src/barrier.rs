//! A reusable N-way rendezvous point used to gate the map/shuffle/reduce phases.

/// Blocks `n` callers until all of them have arrived, then releases all of them at once.
///
/// This is a thin wrapper around [`std::sync::Barrier`], which already supports being waited
/// on more than once by the same set of threads. The wrapper exists so the phase barrier is a
/// named component in this crate's module layout, matching the job engine's worker-pool
/// lifecycle rather than being an anonymous `std::sync::Barrier` threaded through call sites.
pub(crate) struct PhaseBarrier {
    inner: std::sync::Barrier,
}

impl PhaseBarrier {
    /// Creates a barrier that releases once `n_workers` threads have called
    /// [`PhaseBarrier::arrive_and_wait`].
    pub(crate) fn new(n_workers: usize) -> Self {
        Self {
            inner: std::sync::Barrier::new(n_workers),
        }
    }

    /// Blocks until every worker has arrived, then releases all of them. Safe to call again
    /// with the same set of threads (used three times per job: post-map, post-shuffle, and
    /// after reduce).
    pub(crate) fn arrive_and_wait(&self) {
        self.inner.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::PhaseBarrier;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn releases_all_parties_together() {
        let barrier = Arc::new(PhaseBarrier::new(8));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|id| {
                let barrier = barrier.clone();
                let order = order.clone();
                thread::spawn(move || {
                    order.lock().unwrap().push(("before", id));
                    barrier.arrive_and_wait();
                    order.lock().unwrap().push(("after", id));
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let order = order.lock().unwrap();
        let before_count = order.iter().filter(|(tag, _)| *tag == "before").count();
        let after_count = order.iter().filter(|(tag, _)| *tag == "after").count();
        assert_eq!(before_count, 8);
        assert_eq!(after_count, 8);
    }

    #[test]
    fn tolerates_back_to_back_reuse() {
        let barrier = Arc::new(PhaseBarrier::new(4));
        let rounds = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let barrier = barrier.clone();
                let rounds = rounds.clone();
                thread::spawn(move || {
                    for _ in 0..3 {
                        barrier.arrive_and_wait();
                        rounds.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        barrier.arrive_and_wait();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(rounds.load(std::sync::atomic::Ordering::SeqCst), 12);
    }

    #[test]
    fn single_party_degenerates_to_a_no_op() {
        let barrier = PhaseBarrier::new(1);
        barrier.arrive_and_wait();
        barrier.arrive_and_wait();
        barrier.arrive_and_wait();
    }
}
