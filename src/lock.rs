//! First-come-first-served asynchronous mutual exclusion.
//!
//! Every call to [`AsyncFifoLock::acquire`] draws a ticket at the moment of
//! the call. Tickets are serviced strictly in the order they were drawn:
//! a release hands the lock directly to the oldest live waiter through a
//! wake queue, so there is no polling and no barging by late arrivals.
//!
//! Both ticket counters wrap to zero after [`MAX_TICKET`] instead of
//! overflowing.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::oneshot;

/// Largest ticket number handed out before the counters wrap to zero.
pub const MAX_TICKET: u64 = (1 << 53) - 1;

fn advance(ticket: u64) -> u64 {
    if ticket >= MAX_TICKET { 0 } else { ticket + 1 }
}

struct Waiter {
    ticket: u64,
    wake: oneshot::Sender<()>,
}

struct State {
    locked: bool,
    /// Next ticket to hand out.
    next_ticket: u64,
    /// Ticket currently eligible to take the lock.
    serving: u64,
    waiters: VecDeque<Waiter>,
}

/// Queue-ordered lock for a single critical section.
///
/// `acquire()`/`release()` must be paired by the caller. Prefer
/// [`AsyncFifoLock::lock`], whose guard releases on drop.
pub struct AsyncFifoLock {
    state: Mutex<State>,
}

impl AsyncFifoLock {
    /// Create an unlocked lock with both counters at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an unlocked lock whose first ticket is `ticket`.
    pub fn starting_at(ticket: u64) -> Self {
        let ticket = ticket.min(MAX_TICKET);
        Self {
            state: Mutex::new(State {
                locked: false,
                next_ticket: ticket,
                serving: ticket,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Draw a ticket now and wait for its turn.
    ///
    /// The ticket is taken when this method is called, not when the
    /// returned future is first polled. Dropping the future before it
    /// completes gives up the ticket; if the lock had already been
    /// handed to it, the lock is passed on to the next waiter.
    pub fn acquire(&self) -> impl Future<Output = ()> + Send + '_ {
        let mut turn = self.take_ticket();
        async move {
            if let Turn::Waiting(rx) = &mut turn.state {
                // The sender lives in `self.state`, which outlives this borrow.
                let _ = rx.await;
            }
            turn.observed();
        }
    }

    /// Acquire the lock and return a guard that releases it on drop.
    pub fn lock(&self) -> impl Future<Output = FifoLockGuard<'_>> + Send + '_ {
        let acquire = self.acquire();
        async move {
            acquire.await;
            FifoLockGuard { lock: self }
        }
    }

    /// Release the lock.
    ///
    /// Ownership is not checked. If tickets are waiting, the lock passes
    /// straight to the oldest one that is still interested; otherwise it
    /// becomes free.
    pub fn release(&self) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            debug_assert_eq!(waiter.ticket, state.serving);
            state.serving = advance(waiter.ticket);
            if waiter.wake.send(()).is_ok() {
                state.locked = true;
                return;
            }
        }
        state.locked = false;
    }

    /// Whether some ticket currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Number of tickets waiting behind the current holder.
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// The ticket the next `acquire()` call will draw.
    pub fn next_ticket(&self) -> u64 {
        self.state.lock().next_ticket
    }

    fn take_ticket(&self) -> Ticket<'_> {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket = advance(ticket);

        if !state.locked && state.waiters.is_empty() && ticket == state.serving {
            state.locked = true;
            state.serving = advance(ticket);
            return Ticket {
                lock: self,
                state: Turn::Ready,
            };
        }

        let (wake, rx) = oneshot::channel();
        state.waiters.push_back(Waiter { ticket, wake });
        Ticket {
            lock: self,
            state: Turn::Waiting(rx),
        }
    }
}

impl Default for AsyncFifoLock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AsyncFifoLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AsyncFifoLock")
            .field("locked", &state.locked)
            .field("next_ticket", &state.next_ticket)
            .field("serving", &state.serving)
            .field("waiting", &state.waiters.len())
            .finish()
    }
}

enum Turn {
    /// Lock was granted when the ticket was drawn.
    Ready,
    /// Queued; the receiver fires when the lock is handed over.
    Waiting(oneshot::Receiver<()>),
    /// The caller observed the grant and now owns the release.
    Done,
}

struct Ticket<'a> {
    lock: &'a AsyncFifoLock,
    state: Turn,
}

impl Ticket<'_> {
    /// The caller has seen the grant; releasing is now its job.
    fn observed(&mut self) {
        self.state = Turn::Done;
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        match std::mem::replace(&mut self.state, Turn::Done) {
            Turn::Done => {}
            Turn::Ready => self.lock.release(),
            Turn::Waiting(mut rx) => {
                rx.close();
                if rx.try_recv().is_ok() {
                    self.lock.release();
                }
            }
        }
    }
}

/// Holds an [`AsyncFifoLock`] until dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct FifoLockGuard<'a> {
    lock: &'a AsyncFifoLock,
}

impl Drop for FifoLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
