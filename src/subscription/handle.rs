// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription handle.

use std::sync::Weak;

use super::SubscriptionId;
use super::callback::Unsubscribe;

/// A live subscription to an [`EventSource`](super::EventSource).
///
/// The callback stays registered for as long as this handle exists.
/// Dropping it (or calling [`cancel`](Self::cancel)) removes the callback.
/// The handle does not keep the event source alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    source: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, source: Weak<dyn Unsubscribe>) -> Self {
        Self {
            id,
            source: Some(source),
        }
    }

    /// Returns the subscription ID.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribes now.
    ///
    /// Returns `true` if the callback was still registered.
    pub fn cancel(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        self.source
            .take()
            .and_then(|weak| weak.upgrade())
            .is_some_and(|source| source.remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
