//! Bounded fork-join over a buffer of items
//!
//! The buffer is split into one contiguous chunk per thread. Results are collected per
//! chunk and concatenated in chunk order, so the output always lines up with the input
//! regardless of which thread finishes first.

use std::thread;

/// Number of threads actually used for a requested worker count
///
/// Zero selects every available core; any other request is capped at the core count.
#[must_use]
pub fn effective_threads(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get()
    } else {
        requested.min(num_cpus::get())
    }
}

/// Applies `f` to every item on up to `num_threads` threads, preserving input order
///
/// A panic in `f` is propagated to the caller once all threads have stopped.
pub fn ordered_map<T, U, F>(items: &[T], num_threads: usize, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync,
{
    let num_threads = effective_threads(num_threads);
    if num_threads <= 1 || items.len() <= 1 {
        return items.iter().map(&f).collect();
    }

    let items_per_thread = items.len().div_ceil(num_threads);
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(items_per_thread)
            .map(|chunk| scope.spawn(move || chunk.iter().map(f).collect::<Vec<U>>()))
            .collect();

        let mut results = Vec::with_capacity(items.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk) => results.extend(chunk),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        results
    })
}

#[cfg(test)]
mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    #[test]
    fn test_effective_threads_bounds() {
        let cores = num_cpus::get();
        assert_eq!(effective_threads(0), cores);
        assert_eq!(effective_threads(1), 1);
        assert_eq!(effective_threads(cores + 16), cores);
    }

    #[test]
    fn test_preserves_order() {
        let items: Vec<usize> = (0..1000).collect();
        for threads in [1, 2, 3, 8] {
            let squares = ordered_map(&items, threads, |x| x * x);
            let expected: Vec<usize> = items.iter().map(|x| x * x).collect();
            assert_eq!(squares, expected);
        }
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u8> = Vec::new();
        assert!(ordered_map(&items, 4, |x| *x).is_empty());
    }

    #[test]
    fn test_each_item_visited_once() {
        let items: Vec<usize> = (0..257).collect();
        let seen = Mutex::new(Vec::new());
        ordered_map(&items, 4, |x| seen.lock().push(*x));

        let seen = seen.into_inner();
        assert_eq!(seen.len(), items.len());
        let unique: HashSet<usize> = seen.into_iter().collect();
        assert_eq!(unique.len(), items.len());
    }

    #[test]
    fn test_runs_on_several_threads() {
        if num_cpus::get() < 2 {
            return;
        }
        let items: Vec<usize> = (0..64).collect();
        let threads = Mutex::new(HashSet::new());
        ordered_map(&items, 2, |_| {
            threads.lock().insert(thread::current().id());
        });
        assert_eq!(threads.into_inner().len(), 2);
    }

    #[test]
    #[should_panic(expected = "bad item")]
    fn test_panic_is_propagated() {
        let items: Vec<usize> = (0..16).collect();
        let _ = ordered_map(&items, 2, |x| assert!(*x != 11, "bad item"));
    }
}
