// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event subscriptions for devices and their components.
//!
//! Every event producer in this crate (a device, a switch, a cover, an
//! input) owns an [`EventSource`] for a tagged event enum. Subscribing
//! returns a [`Subscription`] handle; dropping the handle unsubscribes.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use shelly_homekit::subscription::EventSource;
//!
//! let source: Arc<EventSource<u32>> = Arc::new(EventSource::new());
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let sub = EventSource::subscribe(&source, move |_: &u32| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! source.dispatch(&1);
//! drop(sub);
//! source.dispatch(&2);
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

mod callback;
mod handle;

pub use callback::{EventSource, SubscriptionId};
pub use handle::Subscription;
