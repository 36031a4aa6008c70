// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazy timer wheel: a single worker thread that fires scheduled payloads
//! as `GenericEvent`s tagged `TIMEREVENT`.
//!
//! Kept on a plain `std::thread` (not a tokio task) so it keeps working even
//! if the async runtime the rest of clusterlib uses is saturated — the
//! timer wheel is the clock the rest of the dispatch pipeline relies on.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::event::{GenericEvent, GenericEventKind};
use crate::queue::Timeout;

/// Opaque handle returned by [`TimerWheel::schedule_after`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Handler + client data carried by a fired timer, matching spec §4.2's
/// payload shape `{ending, handler, clientData, id, cancelled}`.
pub struct TimerPayload {
    pub id: TimerId,
    pub handler: Arc<dyn Fn(TimerId) + Send + Sync>,
    cancelled: Arc<std::sync::atomic::AtomicBool>,
}

impl TimerPayload {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct Entry {
    fire_at: Instant,
    payload: Arc<TimerPayload>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fire_at.cmp(&other.fire_at)
    }
}

struct Heap {
    entries: BinaryHeap<Reverse<Entry>>,
}

/// A single background thread that fires [`TimerPayload`]s into a generic
/// event sink as they come due.
pub struct TimerWheel {
    heap: Arc<Mutex<Heap>>,
    wake: Arc<Condvar>,
    next_id: AtomicU64,
    registered: AtomicUsize,
    shutdown: Arc<std::sync::atomic::AtomicBool>,
    resolution: Duration,
}

impl TimerWheel {
    /// Spawn the worker thread. `sink` receives a [`GenericEvent`] tagged
    /// [`GenericEventKind::Timer`] for every payload that fires and was not
    /// cancelled.
    pub fn spawn(
        resolution: Duration,
        sink: impl Fn(GenericEvent<Arc<TimerPayload>>) + Send + 'static,
    ) -> Arc<Self> {
        let wheel = Arc::new(Self {
            heap: Arc::new(Mutex::new(Heap { entries: BinaryHeap::new() })),
            wake: Arc::new(Condvar::new()),
            next_id: AtomicU64::new(1),
            registered: AtomicUsize::new(0),
            shutdown: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            resolution,
        });

        let heap = Arc::clone(&wheel.heap);
        let wake = Arc::clone(&wheel.wake);
        let shutdown = Arc::clone(&wheel.shutdown);
        std::thread::Builder::new()
            .name("clusterlib-timer-wheel".into())
            .spawn(move || Self::run(heap, wake, shutdown, resolution, sink))
            .ok();

        wheel
    }

    fn run(
        heap: Arc<Mutex<Heap>>,
        wake: Arc<Condvar>,
        shutdown: Arc<std::sync::atomic::AtomicBool>,
        resolution: Duration,
        sink: impl Fn(GenericEvent<Arc<TimerPayload>>),
    ) {
        loop {
            if shutdown.load(Ordering::Acquire) {
                return;
            }
            let mut guard = heap.lock();
            let sleep_for = match guard.entries.peek() {
                Some(Reverse(entry)) => {
                    let now = Instant::now();
                    if entry.fire_at <= now {
                        Duration::ZERO
                    } else {
                        (entry.fire_at - now).min(resolution)
                    }
                }
                None => resolution,
            };
            let _ = wake.wait_for(&mut guard, sleep_for);

            let now = Instant::now();
            let mut fired = Vec::new();
            while let Some(Reverse(entry)) = guard.entries.peek() {
                if entry.fire_at > now {
                    break;
                }
                #[allow(clippy::expect_used)]
                let Reverse(entry) = guard.entries.pop().expect("peeked entry exists");
                fired.push(entry.payload);
            }
            drop(guard);

            for payload in fired {
                if !payload.is_cancelled() {
                    (payload.handler)(payload.id);
                    sink(GenericEvent { kind: GenericEventKind::Timer, payload: payload.clone() });
                }
            }
        }
    }

    /// Schedule `handler` to fire after `delay`, returning a [`TimerId`]
    /// that can be passed to [`Self::cancel`].
    pub fn schedule_after(
        &self,
        delay: Duration,
        handler: impl Fn(TimerId) + Send + Sync + 'static,
    ) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let payload = Arc::new(TimerPayload {
            id,
            handler: Arc::new(handler),
            cancelled: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        });
        {
            let mut guard = self.heap.lock();
            guard.entries.push(Reverse(Entry { fire_at: Instant::now() + delay, payload }));
        }
        self.registered.fetch_add(1, Ordering::Relaxed);
        self.wake.notify_one();
        id
    }

    /// Best-effort cancel: marks the payload cancelled so that if it is
    /// already about to fire, the wheel drops it silently instead of
    /// invoking the handler. Per spec §4.2 this is best-effort, not a
    /// guarantee against a payload that is already mid-fire.
    pub fn cancel(&self, id: TimerId) {
        let guard = self.heap.lock();
        for Reverse(entry) in guard.entries.iter() {
            if entry.payload.id == id {
                entry
                    .payload
                    .cancelled
                    .store(true, std::sync::atomic::Ordering::Release);
                return;
            }
        }
    }

    /// Number of timers ever registered (not decremented on fire/cancel;
    /// exposed for diagnostics, e.g. the `clusterlib-cli` status command).
    pub fn registered_count(&self) -> usize {
        self.registered.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.wake.notify_all();
    }
}

/// Convenience wrapper letting callers `take` fired timer events the same
/// way they would from a [`crate::queue::BlockingQueue`]-backed adapter.
pub fn drain_poll<T>(queue: &crate::queue::BlockingQueue<GenericEvent<T>>) -> Option<GenericEvent<T>> {
    queue.take(Timeout::Poll).item()
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
