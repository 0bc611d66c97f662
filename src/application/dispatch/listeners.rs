//! Lifecycle listeners
//!
//! Listeners can be added and removed from any thread while calls are in
//! flight. Notification works on a snapshot, so no map lock is held while a
//! listener runs, and a panicking listener is logged and skipped.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::notifications::Event;

/// Receives every lifecycle event of every dispatched call.
pub trait DispatchListener: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> DispatchListener for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: DashMap<ListenerId, Arc<dyn DispatchListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: impl DispatchListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Arc::new(listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver to listeners in registration order.
    pub fn notify(&self, event: &Event) {
        let mut snapshot: Vec<(ListenerId, Arc<dyn DispatchListener>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);

        for (id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener.on_event(event))).is_err() {
                warn!(
                    listener = id.0,
                    event_type = event.event_type(),
                    request_id = ?event.request_id(),
                    "Dispatch listener panicked; skipped"
                );
            }
        }
    }
}
