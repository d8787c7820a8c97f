// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback registry shared by every event producer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::Subscription;

/// Unique identifier for a subscription.
///
/// IDs are unique within one [`EventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registry of callbacks for one event type.
///
/// Callbacks are stored behind `Arc` so that [`dispatch`](Self::dispatch)
/// can release the lock before invoking them. A callback may therefore
/// subscribe or unsubscribe (including dropping its own handle) while it
/// runs.
pub struct EventSource<E> {
    next_id: AtomicU64,
    callbacks: RwLock<HashMap<SubscriptionId, Callback<E>>>,
}

impl<E: 'static> EventSource<E> {
    /// Creates an empty event source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a callback and returns a handle that unsubscribes on drop.
    pub fn subscribe<F>(this: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(this.next_id.fetch_add(1, Ordering::Relaxed));
        this.callbacks.write().insert(id, Arc::new(callback));

        let weak: Weak<Self> = Arc::downgrade(this);
        Subscription::new(id, weak)
    }

    /// Removes a callback.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.write().remove(&id).is_some()
    }

    /// Invokes every registered callback, in subscription order.
    pub fn dispatch(&self, event: &E) {
        let callbacks: Vec<(SubscriptionId, Callback<E>)> = {
            let guard = self.callbacks.read();
            let mut entries: Vec<_> = guard
                .iter()
                .map(|(id, cb)| (*id, Arc::clone(cb)))
                .collect();
            entries.sort_by_key(|(id, _)| *id);
            entries
        };

        for (_, callback) in callbacks {
            callback(event);
        }
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Removes every callback.
    pub fn clear(&self) {
        self.callbacks.write().clear();
    }
}

impl<E: 'static> Default for EventSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventSource<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("subscribers", &self.callbacks.read().len())
            .finish_non_exhaustive()
    }
}

/// Type-erased unsubscription used by [`Subscription`].
pub(crate) trait Unsubscribe: Send + Sync {
    fn remove(&self, id: SubscriptionId) -> bool;
}

impl<E: 'static> Unsubscribe for EventSource<E> {
    fn remove(&self, id: SubscriptionId) -> bool {
        self.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    #[test]
    fn subscription_ids_are_unique() {
        let source: Arc<EventSource<()>> = Arc::new(EventSource::new());
        let a = EventSource::subscribe(&source, |()| {});
        let b = EventSource::subscribe(&source, |()| {});
        assert_ne!(a.id(), b.id());
        assert_eq!(source.subscriber_count(), 2);
    }

    #[test]
    fn dispatch_reaches_all_subscribers_in_order() {
        let source: Arc<EventSource<u8>> = Arc::new(EventSource::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let l1 = Arc::clone(&log);
        let _s1 = EventSource::subscribe(&source, move |v: &u8| l1.lock().push(("first", *v)));
        let l2 = Arc::clone(&log);
        let _s2 = EventSource::subscribe(&source, move |v: &u8| l2.lock().push(("second", *v)));

        source.dispatch(&7);
        assert_eq!(*log.lock(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn dropping_handle_unsubscribes() {
        let source: Arc<EventSource<()>> = Arc::new(EventSource::new());
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let sub = EventSource::subscribe(&source, move |()| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        source.dispatch(&());
        drop(sub);
        source.dispatch(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn callback_may_drop_its_own_subscription() {
        let source: Arc<EventSource<()>> = Arc::new(EventSource::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&slot);
        let sub = EventSource::subscribe(&source, move |()| {
            inner.lock().take();
        });
        *slot.lock() = Some(sub);

        source.dispatch(&());
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn clear_removes_everything() {
        let source: Arc<EventSource<()>> = Arc::new(EventSource::new());
        let _a = EventSource::subscribe(&source, |()| {});
        source.clear();
        assert_eq!(source.subscriber_count(), 0);
    }
}
