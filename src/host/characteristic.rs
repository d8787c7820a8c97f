// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side characteristic.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::error::HapStatus;
use crate::hap::{CharacteristicType, CharacteristicValue, Perm};

/// Capacity of the per-characteristic notification channel.
const NOTIFY_CAPACITY: usize = 16;

/// Future returned by a [`WriteHandler`].
pub type WriteFuture = Pin<Box<dyn Future<Output = Result<(), HapStatus>> + Send>>;

/// Handler invoked when a controller writes a characteristic.
pub type WriteHandler = Arc<dyn Fn(CharacteristicValue) -> WriteFuture + Send + Sync>;

struct Inner {
    kind: CharacteristicType,
    value: RwLock<CharacteristicValue>,
    perms: RwLock<Vec<Perm>>,
    on_set: RwLock<Option<WriteHandler>>,
    notifier: broadcast::Sender<CharacteristicValue>,
}

/// A characteristic of a [`Service`](super::Service).
///
/// Cloning yields another handle to the same characteristic.
#[derive(Clone)]
pub struct Characteristic {
    inner: Arc<Inner>,
}

impl Characteristic {
    pub(crate) fn new(kind: CharacteristicType) -> Self {
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                kind,
                value: RwLock::new(kind.default_value()),
                perms: RwLock::new(kind.default_perms().to_vec()),
                on_set: RwLock::new(None),
                notifier,
            }),
        }
    }

    /// The characteristic type.
    #[must_use]
    pub fn kind(&self) -> CharacteristicType {
        self.inner.kind
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> CharacteristicValue {
        self.inner.value.read().clone()
    }

    /// The current permissions.
    #[must_use]
    pub fn perms(&self) -> Vec<Perm> {
        self.inner.perms.read().clone()
    }

    /// Replaces the permissions.
    pub fn set_perms(&self, perms: &[Perm]) -> &Self {
        *self.inner.perms.write() = perms.to_vec();
        self
    }

    /// Stores a value reported by the accessory and notifies subscribed
    /// controllers. The write handler is not invoked.
    pub fn update_value(&self, value: impl Into<CharacteristicValue>) -> &Self {
        let value = value.into();
        *self.inner.value.write() = value.clone();
        // no receivers is fine
        let _ = self.inner.notifier.send(value);
        self
    }

    /// Installs the handler for controller writes, replacing any previous one.
    pub fn on_set<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(CharacteristicValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HapStatus>> + Send + 'static,
    {
        let handler: WriteHandler = Arc::new(move |value| Box::pin(handler(value)));
        *self.inner.on_set.write() = Some(handler);
        self
    }

    /// Removes the write handler.
    pub fn clear_on_set(&self) {
        self.inner.on_set.write().take();
    }

    /// Returns true if a write handler is installed.
    #[must_use]
    pub fn has_on_set(&self) -> bool {
        self.inner.on_set.read().is_some()
    }

    /// Subscribes to value notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicValue> {
        self.inner.notifier.subscribe()
    }

    /// Processes a write from a controller.
    ///
    /// The stored value changes only if the handler succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`HapStatus::ReadOnlyCharacteristic`] if the characteristic is
    /// not writable, [`HapStatus::InvalidValueInRequest`] if the value has the
    /// wrong format, or whatever status the write handler fails with.
    pub async fn handle_write(&self, value: CharacteristicValue) -> Result<(), HapStatus> {
        if !self.inner.perms.read().contains(&Perm::PairedWrite) {
            return Err(HapStatus::ReadOnlyCharacteristic);
        }
        if !value.matches(self.inner.kind.format()) {
            return Err(HapStatus::InvalidValueInRequest);
        }

        let handler = self.inner.on_set.read().clone();
        if let Some(handler) = handler {
            handler(value.clone()).await?;
        }

        *self.inner.value.write() = value;
        Ok(())
    }

    /// Returns true if both handles refer to the same characteristic.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Characteristic")
            .field("kind", &self.inner.kind)
            .field("value", &*self.inner.value.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn write_runs_handler_and_stores_value() {
        let c = Characteristic::new(CharacteristicType::On);
        let calls = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&calls);
        c.on_set(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        c.handle_write(true.into()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.value(), CharacteristicValue::Bool(true));
    }

    #[tokio::test]
    async fn failed_write_keeps_value() {
        let c = Characteristic::new(CharacteristicType::On);
        c.on_set(|_| async { Err(HapStatus::ServiceCommunicationFailure) });

        let result = c.handle_write(true.into()).await;

        assert_eq!(result, Err(HapStatus::ServiceCommunicationFailure));
        assert_eq!(c.value(), CharacteristicValue::Bool(false));
    }

    #[tokio::test]
    async fn read_only_and_invalid_writes_are_rejected() {
        let c = Characteristic::new(CharacteristicType::On);
        assert_eq!(
            c.handle_write(CharacteristicValue::Int(1)).await,
            Err(HapStatus::InvalidValueInRequest)
        );

        c.set_perms(&[Perm::Notify, Perm::PairedRead]);
        assert_eq!(
            c.handle_write(true.into()).await,
            Err(HapStatus::ReadOnlyCharacteristic)
        );
    }

    #[tokio::test]
    async fn update_value_notifies_without_handler() {
        let c = Characteristic::new(CharacteristicType::CurrentPosition);
        let mut rx = c.subscribe();
        c.on_set(|_| async { Err(HapStatus::InvalidValueInRequest) });

        c.update_value(40u8);

        assert_eq!(rx.recv().await.unwrap(), CharacteristicValue::Int(40));
    }
}
