// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deferred activation and deactivation of accessories.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::AccessoryInner;

/// Queue of accessories with a pending lifecycle transition.
///
/// Accessories only enqueue themselves; the transition runs when the owner
/// drains the queue. Whether an accessory activates or deactivates is
/// decided at that point from its current `active` flag, so several
/// toggles in a row collapse into one transition.
#[derive(Default)]
pub struct TransitionQueue {
    queue: Mutex<VecDeque<Weak<AccessoryInner>>>,
    notify: Notify,
}

impl TransitionQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&self, accessory: &Arc<AccessoryInner>) {
        self.queue.lock().push_back(Arc::downgrade(accessory));
        self.notify.notify_one();
    }

    /// Number of queued entries, including cancelled ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Runs every pending transition, including ones scheduled meanwhile.
    ///
    /// Returns the number of transitions that ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            // the lock must not be held while a transition runs
            let next = self.queue.lock().pop_front();
            let Some(entry) = next else {
                break;
            };
            if let Some(accessory) = entry.upgrade()
                && accessory.run_pending()
            {
                ran += 1;
            }
        }
        ran
    }

    /// Waits until a transition is scheduled.
    pub async fn scheduled(&self) {
        self.notify.notified().await;
    }
}

impl std::fmt::Debug for TransitionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionQueue")
            .field("queued", &self.len())
            .finish_non_exhaustive()
    }
}
