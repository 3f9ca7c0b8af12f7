//! Single-slot cache for the processed map data.

use std::sync::{Arc, Mutex, PoisonError};

struct Slot<T> {
    /// Advances on every invalidation.
    generation: u64,
    value: Option<Arc<T>>,
}

/// Holds one lazily computed value until it is invalidated.
///
/// Concurrent first callers of [`get_or_compute`](Self::get_or_compute)
/// queue on `computing` and share a single computation. The slot lock is
/// never held while computing, so [`is_cached`](Self::is_cached) and
/// [`get`](Self::get) answer immediately.
pub struct ProcessedCache<T> {
    computing: Mutex<()>,
    slot: Mutex<Slot<T>>,
}

impl<T> ProcessedCache<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            computing: Mutex::new(()),
            slot: Mutex::new(Slot {
                generation: 0,
                value: None,
            }),
        }
    }

    fn cached(&self) -> (u64, Option<Arc<T>>) {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        (slot.generation, slot.value.clone())
    }

    /// Returns the cached value, computing and storing it if the slot is
    /// empty.
    ///
    /// A value computed across an [`invalidate`](Self::invalidate) is
    /// returned to the caller but not stored.
    ///
    /// # Errors
    ///
    /// Returns whatever error `compute` returns. The slot stays empty in
    /// that case, so the next call retries.
    pub fn get_or_compute<E>(
        &self,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let (_, Some(value)) = self.cached() {
            log::debug!("Processed data cache hit");
            return Ok(value);
        }

        let _computing = self.computing.lock().unwrap_or_else(PoisonError::into_inner);
        let (generation, value) = self.cached();
        if let Some(value) = value {
            return Ok(value);
        }

        let value = Arc::new(compute()?);
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            slot.value = Some(Arc::clone(&value));
        } else {
            log::debug!("Processed data invalidated during computation, not caching");
        }
        Ok(value)
    }

    /// Returns the cached value without computing.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.cached().1
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .value
            .is_some()
    }

    /// Empties the slot. Values already handed out stay valid.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.value = None;
    }
}

impl<T> Default for ProcessedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn computes_once() {
        let cache = ProcessedCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![1, 2, 3])
        };

        let first = cache.get_or_compute(compute).unwrap();
        let second = cache.get_or_compute(compute).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let cache = ProcessedCache::new();
        let first = cache.get_or_compute(|| Ok::<_, String>(1)).unwrap();
        cache.invalidate();
        assert!(cache.get().is_none());

        let second = cache.get_or_compute(|| Ok::<_, String>(2)).unwrap();
        assert_eq!(*first, 1);
        assert_eq!(*second, 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = ProcessedCache::<i32>::new();
        assert_eq!(
            cache.get_or_compute(|| Err("unavailable")).unwrap_err(),
            "unavailable"
        );
        assert!(!cache.is_cached());
        assert_eq!(*cache.get_or_compute(|| Ok::<_, &str>(7)).unwrap(), 7);
    }

    #[test]
    fn concurrent_callers_share_one_computation() {
        let cache = Arc::new(ProcessedCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    cache
                        .get_or_compute(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(10));
                            Ok::<_, String>(42)
                        })
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();

        let results = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    /// Spawns a computation of `value` that signals once it has started and
    /// then waits for `release` before finishing.
    fn blocked_compute(
        cache: &Arc<ProcessedCache<i32>>,
        value: i32,
    ) -> (
        mpsc::Receiver<()>,
        mpsc::Sender<()>,
        std::thread::JoinHandle<Arc<i32>>,
    ) {
        let (started_tx, started) = mpsc::channel();
        let (release, release_rx) = mpsc::channel::<()>();
        let cache = Arc::clone(cache);
        let handle = std::thread::spawn(move || {
            cache
                .get_or_compute(|| {
                    started_tx.send(()).unwrap();
                    release_rx.recv_timeout(Duration::from_secs(5)).ok();
                    Ok::<_, String>(value)
                })
                .unwrap()
        });
        (started, release, handle)
    }

    #[test]
    fn is_cached_answers_while_computing() {
        let cache = Arc::new(ProcessedCache::new());
        let (started, release, handle) = blocked_compute(&cache, 5);
        started.recv().unwrap();

        let begin = Instant::now();
        assert!(!cache.is_cached());
        assert!(cache.get().is_none());
        assert!(begin.elapsed() < Duration::from_secs(1));

        release.send(()).unwrap();
        assert_eq!(*handle.join().unwrap(), 5);
        assert!(cache.is_cached());
    }

    #[test]
    fn invalidate_during_compute_discards_result() {
        let cache = Arc::new(ProcessedCache::new());
        let (started, release, handle) = blocked_compute(&cache, 1);
        started.recv().unwrap();

        cache.invalidate();
        release.send(()).unwrap();
        assert_eq!(*handle.join().unwrap(), 1);
        assert!(!cache.is_cached());

        assert_eq!(*cache.get_or_compute(|| Ok::<_, String>(2)).unwrap(), 2);
    }
}
