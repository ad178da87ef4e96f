//! Zero-payload change notification.
//!
//! Subscribers are told *that* the reactor changed, never *what*; they
//! re-read whatever state they need.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::lock;

pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Notifier::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct Notifier {
    next_id: AtomicU64,
    listeners: Mutex<IndexMap<SubscriptionId, Listener>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).insert(id, listener);
        id
    }

    /// Returns false if the handle was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.listeners).shift_remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener on the calling thread.
    ///
    /// The listener table is not locked while callbacks run, so a callback
    /// may subscribe, unsubscribe or trigger a nested notification.
    pub fn notify(&self) {
        let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }
}
