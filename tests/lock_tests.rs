//! Contention tests for the FIFO async lock.

use futures::future::join_all;
use inittree::lock::{AsyncFifoLock, MAX_TICKET};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const WAITERS: usize = 10_000;

/// Issue `WAITERS` acquisitions in order, poll them in reverse, and record
/// the order in which their critical sections run.
async fn service_order(lock: &AsyncFifoLock) -> Vec<usize> {
    let order = Mutex::new(Vec::with_capacity(WAITERS));
    let order_ref = &order;

    let mut tasks: Vec<_> = (0..WAITERS)
        .map(|i| {
            let acquire = lock.acquire();
            async move {
                acquire.await;
                order_ref.lock().unwrap().push(i);
                tokio::task::yield_now().await;
                lock.release();
            }
        })
        .collect();
    tasks.reverse();
    join_all(tasks).await;

    order.into_inner().unwrap()
}

#[tokio::test]
async fn waiters_are_serviced_in_request_order() {
    let lock = AsyncFifoLock::new();
    let order = service_order(&lock).await;

    assert_eq!(order, (0..WAITERS).collect::<Vec<_>>());
    assert!(!lock.is_locked());
    assert_eq!(lock.next_ticket(), WAITERS as u64);
}

#[tokio::test]
async fn order_survives_ticket_wraparound() {
    let lock = AsyncFifoLock::starting_at(MAX_TICKET - (WAITERS as u64) / 2);
    let order = service_order(&lock).await;

    assert_eq!(order, (0..WAITERS).collect::<Vec<_>>());
    assert!(!lock.is_locked());
    // Half the tickets were drawn before the wrap, the rest after it.
    assert_eq!(lock.next_ticket(), (WAITERS as u64) / 2 - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn at_most_one_holder_across_threads() {
    let lock = Arc::new(AsyncFifoLock::new());
    let holders = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..64 {
        let lock = Arc::clone(&lock);
        let holders = Arc::clone(&holders);
        let max_seen = Arc::clone(&max_seen);
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                let guard = lock.lock().await;
                let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                holders.fetch_sub(1, Ordering::SeqCst);
                drop(guard);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(holders.load(Ordering::SeqCst), 0);
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn late_arrival_does_not_barge_past_waiters() {
    let lock = AsyncFifoLock::new();
    lock.acquire().await;

    let queued = lock.acquire();
    lock.release();
    // The lock now belongs to `queued`, so a newcomer must wait.
    let late = lock.acquire();
    assert!(lock.is_locked());
    assert_eq!(lock.waiting(), 1);

    queued.await;
    lock.release();
    late.await;
    assert!(lock.is_locked());
    lock.release();
    assert!(!lock.is_locked());
}
