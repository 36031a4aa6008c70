// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-client event delivery (spec §4.9): one unbounded channel, one
//! delivery task, a `(key → handler)` registration table guarded by a
//! single mutex. Delivery copies the matching handler range out from
//! under the mutex before invoking anything, so a handler that blocks or
//! mutates its own registrations cannot deadlock the delivery task (spec
//! §5's "no user handler is invoked while any internal mutex is held").

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use clusterlib_cache::SemanticEvent;
use clusterlib_core::NotifyableKey;

pub type UserEventHandler = Arc<dyn Fn(&NotifyableKey, SemanticEvent) + Send + Sync>;

struct RegisteredHandler {
    key: NotifyableKey,
    handler: UserEventHandler,
}

/// What flows through a [`Client`]'s delivery channel: either a semantic
/// event about one Notifyable, or the terminating end-event (spec's
/// `ClusterEventPayload{rootKey, ENDEVENT}`, modeled here as its own
/// variant rather than a sixteenth `SemanticEvent` since it isn't produced
/// by any `CachedObjectChangeHandler`).
#[derive(Debug, Clone)]
pub enum ClientPayload {
    Semantic { key: NotifyableKey, event: SemanticEvent },
    End,
}

pub struct Client {
    id: u64,
    sender: mpsc::UnboundedSender<ClientPayload>,
    registered: Mutex<Vec<RegisteredHandler>>,
}

impl Client {
    /// Creates a client and spawns its delivery task. The task exits after
    /// dispatching the end-event, matching spec §4.9's "the thread exits
    /// after dispatching" rule.
    pub fn spawn(id: u64) -> (Arc<Self>, tokio::task::JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let client = Arc::new(Self { id, sender, registered: Mutex::new(Vec::new()) });
        let delivery_client = Arc::clone(&client);
        let task = tokio::spawn(async move {
            while let Some(payload) = receiver.recv().await {
                match payload {
                    ClientPayload::Semantic { key, event } => {
                        let matching: Vec<UserEventHandler> = delivery_client
                            .registered
                            .lock()
                            .iter()
                            .filter(|r| r.key == key)
                            .map(|r| Arc::clone(&r.handler))
                            .collect();
                        for handler in matching {
                            handler(&key, event);
                        }
                    }
                    ClientPayload::End => {
                        tracing::debug!(client_id = id, "end-event received, delivery task exiting");
                        break;
                    }
                }
            }
        });
        (client, task)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deposits a payload for this client's delivery task to pick up.
    /// Called from the dispatcher's blocking-pool thread, so this must
    /// stay a synchronous, non-blocking send — `UnboundedSender::send`
    /// is exactly that.
    pub fn deliver(&self, payload: ClientPayload) {
        if self.sender.send(payload).is_err() {
            tracing::debug!(client_id = self.id, "delivery task already gone");
        }
    }

    pub fn register_handler(&self, key: NotifyableKey, handler: UserEventHandler) {
        self.registered.lock().push(RegisteredHandler { key, handler });
    }

    /// Removes the first registration whose key and handler pointer match,
    /// mirroring spec §4.9's "removes the first matching entry".
    pub fn cancel_handler(&self, key: &NotifyableKey, handler: &UserEventHandler) {
        let mut registered = self.registered.lock();
        if let Some(pos) = registered
            .iter()
            .position(|r| &r.key == key && Arc::ptr_eq(&r.handler, handler))
        {
            registered.remove(pos);
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
