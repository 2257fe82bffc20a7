//! Bounded worker pool for blocking store I/O.
//!
//! Each task owns exactly one item end-to-end, so workers share nothing but
//! the input queue. Results are collected in completion order; callers that
//! need a stable order must sort afterwards.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

/// Run `task` over every item with at most `width` concurrent workers.
///
/// Returns one result per item, in completion order. A task can only report
/// failure through its return value; panics are not caught and will abort the
/// batch, so tasks must convert their errors into data.
pub fn run<T, R, F>(width: usize, items: Vec<T>, task: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let count = items.len();
    if count == 0 {
        return Vec::new();
    }
    let width = width.max(1).min(count);
    let queue = Mutex::new(items.into_iter());
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..width {
            let tx = tx.clone();
            let queue = &queue;
            let task = &task;
            scope.spawn(move || loop {
                let item = {
                    let mut pending = queue.lock().unwrap();
                    pending.next()
                };
                let Some(item) = item else { break };
                if tx.send(task(item)).is_err() {
                    break;
                }
            });
        }
        drop(tx);
        rx.into_iter().collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn processes_every_item() {
        let results = run(4, (0..100).collect(), |n: i32| n * 2);
        assert_eq!(results.len(), 100);
        let sum: i32 = results.iter().sum();
        assert_eq!(sum, (0..100).map(|n| n * 2).sum::<i32>());
    }

    #[test]
    fn width_is_bounded() {
        let live = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        run(3, (0..50).collect::<Vec<i32>>(), |_| {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            live.fetch_sub(1, Ordering::SeqCst);
        });
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn empty_input_spawns_nothing() {
        let results: Vec<i32> = run(8, Vec::<i32>::new(), |n| n);
        assert!(results.is_empty());
    }

    #[test]
    fn zero_width_is_clamped_to_one() {
        let results = run(0, vec![1, 2, 3], |n: i32| n + 1);
        assert_eq!(results.len(), 3);
    }
}
