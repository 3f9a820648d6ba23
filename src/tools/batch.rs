//! Running independent per-tool work with bounded parallelism.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Apply `work` to every item using at most `parallel` threads.
///
/// `parallel == 0` means one thread per item. Results come back in input
/// order regardless of completion order. Items share nothing but `work`
/// itself, so a slow item only occupies its own worker.
pub fn evaluate_all<T, R, F>(items: &[T], parallel: usize, work: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = match parallel {
        0 => items.len(),
        n => n.min(items.len()),
    };

    if workers == 1 {
        return items.iter().map(&work).collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<R>>> = Mutex::new((0..items.len()).map(|_| None).collect());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let idx = next.fetch_add(1, Ordering::Relaxed);
                let Some(item) = items.get(idx) else {
                    break;
                };
                let result = work(item);
                if let Ok(mut slots) = slots.lock() {
                    slots[idx] = Some(result);
                }
            });
        }
    });

    slots
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .into_iter()
        .flatten()
        .collect()
}
