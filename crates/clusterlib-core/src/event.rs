// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic event envelope and the synchronous/listener adapters that feed
//! it, per spec §4.3.
//!
//! Two producers exist in the running system — the timer wheel and the
//! repository watch stream — and each is connected to both an internal and
//! an external [`SynchronousEventAdapter`]. This module only provides the
//! envelope and the plumbing; wiring the two real producers in lives in the
//! `clusterlib` crate's dispatcher.

use std::sync::Arc;

use crate::queue::{BlockingQueue, Timeout};

/// Discriminates which producer a [`GenericEvent`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericEventKind {
    Timer,
    Repository,
}

/// Envelope wrapping a typed payload with its producer tag.
#[derive(Debug, Clone)]
pub struct GenericEvent<P> {
    pub kind: GenericEventKind,
    pub payload: P,
}

/// A listener that only deposits received events into a [`BlockingQueue`];
/// consumers pull with [`Self::get_next_event`].
pub struct SynchronousEventAdapter<P> {
    queue: BlockingQueue<GenericEvent<P>>,
}

impl<P> Default for SynchronousEventAdapter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SynchronousEventAdapter<P> {
    pub fn new() -> Self {
        Self { queue: BlockingQueue::new() }
    }

    pub fn deposit(&self, event: GenericEvent<P>) {
        self.queue.put(event);
    }

    pub fn get_next_event(&self, timeout: Timeout) -> Option<GenericEvent<P>> {
        self.queue.take(timeout).item()
    }
}

/// Converts a typed event source into a generic-event source by tagging
/// each event with a static [`GenericEventKind`] and forwarding it to one or
/// more sinks (the internal and external adapters).
pub struct ListenerAdapter<P> {
    kind: GenericEventKind,
    sinks: Vec<Arc<SynchronousEventAdapter<P>>>,
}

impl<P: Clone> ListenerAdapter<P> {
    pub fn new(kind: GenericEventKind, sinks: Vec<Arc<SynchronousEventAdapter<P>>>) -> Self {
        Self { kind, sinks }
    }

    /// Tag `payload` and deposit a copy into every connected sink.
    pub fn fan_out(&self, payload: P) {
        for sink in &self.sinks {
            sink.deposit(GenericEvent { kind: self.kind, payload: payload.clone() });
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
