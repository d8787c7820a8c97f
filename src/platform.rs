// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The platform: entry point that turns discovered devices into delegates.
//!
//! [`PlatformHandle`] is the part shared with every accessory: the host,
//! the map of host objects (restored from cache or created since) and the
//! transition queue. [`Platform`] owns the delegates and routes
//! [`PlatformEvent`]s to them.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use shelly_homekit::config::PlatformOptions;
//! use shelly_homekit::delegate::DelegateRegistry;
//! use shelly_homekit::device::{Device, SwitchStatus};
//! use shelly_homekit::host::{HostApi, InMemoryHost};
//! use shelly_homekit::platform::Platform;
//!
//! let host = Arc::new(InMemoryHost::new());
//! let mut platform = Platform::new(
//!     Arc::clone(&host) as Arc<dyn HostApi>,
//!     PlatformOptions::new(),
//!     DelegateRegistry::with_builtin_models().unwrap(),
//! );
//!
//! let device = Device::builder("shellyplus1-a8032ab12345", "SNSW-001X16EU")
//!     .switch(SwitchStatus::new(false))
//!     .build();
//! assert!(platform.add_device(device).unwrap());
//!
//! // accessories reach the host once pending transitions run
//! assert!(host.published().is_empty());
//! platform.run_pending();
//! assert_eq!(host.published().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::accessory::TransitionQueue;
use crate::config::PlatformOptions;
use crate::delegate::{DelegateRegistry, DeviceDelegate};
use crate::device::{Device, DeviceId};
use crate::error::Result;
use crate::host::{HostApi, PlatformAccessory};

struct PlatformShared {
    host: Arc<dyn HostApi>,
    accessories: RwLock<HashMap<Uuid, PlatformAccessory>>,
    transitions: TransitionQueue,
}

/// Shared view of the platform held by every accessory.
#[derive(Clone)]
pub struct PlatformHandle {
    shared: Arc<PlatformShared>,
}

impl PlatformHandle {
    /// Creates a handle publishing to `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostApi>) -> Self {
        Self {
            shared: Arc::new(PlatformShared {
                host,
                accessories: RwLock::new(HashMap::new()),
                transitions: TransitionQueue::new(),
            }),
        }
    }

    /// Restores a host object loaded from the host's cache.
    ///
    /// Cached objects are already known to the host and are not registered
    /// again when an accessory picks them up.
    pub fn configure_accessory(&self, accessory: PlatformAccessory) {
        tracing::debug!(
            uuid = %accessory.uuid(),
            name = accessory.display_name(),
            "Restoring cached accessory"
        );
        self.shared
            .accessories
            .write()
            .insert(accessory.uuid(), accessory);
    }

    /// The host object with the given UUID, if known.
    #[must_use]
    pub fn accessory(&self, uuid: Uuid) -> Option<PlatformAccessory> {
        self.shared.accessories.read().get(&uuid).cloned()
    }

    /// Every known host object.
    #[must_use]
    pub fn accessories(&self) -> Vec<PlatformAccessory> {
        self.shared.accessories.read().values().cloned().collect()
    }

    /// The queue of pending accessory transitions.
    #[must_use]
    pub fn transitions(&self) -> &TransitionQueue {
        &self.shared.transitions
    }

    /// Runs every pending accessory transition.
    ///
    /// Returns the number of transitions that ran.
    pub fn run_pending(&self) -> usize {
        self.shared.transitions.drain()
    }

    /// Registers a host object unless it is already known.
    pub(crate) fn add_accessory(&self, accessory: &PlatformAccessory) {
        let inserted = {
            let mut accessories = self.shared.accessories.write();
            if accessories.contains_key(&accessory.uuid()) {
                false
            } else {
                accessories.insert(accessory.uuid(), accessory.clone());
                true
            }
        };
        if inserted {
            self.shared
                .host
                .register_accessories(std::slice::from_ref(accessory));
        }
    }

    /// Unregisters the given host objects in one call.
    ///
    /// Objects the platform does not know are skipped.
    pub(crate) fn remove_accessories(&self, accessories: &[PlatformAccessory]) {
        let removed: Vec<_> = {
            let mut known = self.shared.accessories.write();
            accessories
                .iter()
                .filter(|pa| known.remove(&pa.uuid()).is_some())
                .cloned()
                .collect()
        };
        if !removed.is_empty() {
            self.shared.host.unregister_accessories(&removed);
        }
    }
}

impl std::fmt::Debug for PlatformHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformHandle")
            .field("accessories", &self.shared.accessories.read().len())
            .field("transitions", &self.shared.transitions)
            .finish_non_exhaustive()
    }
}

/// Input of [`Platform::run`].
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// A device was discovered and its status is known.
    DeviceDiscovered(Arc<Device>),
    /// A device went away for good.
    DeviceRemoved(DeviceId),
    /// Stop the event loop.
    Shutdown,
}

/// Owner of all device delegates.
pub struct Platform {
    handle: PlatformHandle,
    options: PlatformOptions,
    registry: DelegateRegistry,
    delegates: HashMap<DeviceId, DeviceDelegate>,
}

impl Platform {
    /// Creates a platform publishing to `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostApi>, options: PlatformOptions, registry: DelegateRegistry) -> Self {
        tracing::debug!(
            mdns = options.mdns.enable,
            interface = options.mdns.interface.as_deref(),
            excluded = options.excluded_devices().count(),
            "Platform configured"
        );
        Self {
            handle: PlatformHandle::new(host),
            options,
            registry,
            delegates: HashMap::new(),
        }
    }

    /// The shared handle.
    #[must_use]
    pub fn handle(&self) -> &PlatformHandle {
        &self.handle
    }

    /// The platform options.
    #[must_use]
    pub fn options(&self) -> &PlatformOptions {
        &self.options
    }

    /// Restores a cached host object. See [`PlatformHandle::configure_accessory`].
    pub fn configure_accessory(&self, accessory: PlatformAccessory) {
        self.handle.configure_accessory(accessory);
    }

    /// Creates a delegate for a device.
    ///
    /// Returns `Ok(false)` if the device is already managed, excluded in the
    /// options or of an unknown model.
    ///
    /// # Errors
    ///
    /// Returns the error raised while wiring the device's accessories.
    pub fn add_device(&mut self, device: Arc<Device>) -> Result<bool> {
        let id = device.id().clone();
        if self.delegates.contains_key(&id) {
            tracing::debug!(device = %id, "Device already added");
            return Ok(false);
        }
        if self.options.is_excluded(&id) {
            tracing::debug!(device = %id, "Ignoring excluded device");
            return Ok(false);
        }
        let Some(model) = self.registry.get(device.model()) else {
            tracing::info!(
                device = %id,
                model = device.model(),
                "Unknown device model, ignoring"
            );
            return Ok(false);
        };

        let options = self.options.device_options(&id);
        let delegate = DeviceDelegate::new(device, options, self.handle.clone(), model)?;
        self.delegates.insert(id, delegate);
        Ok(true)
    }

    /// Destroys the delegate of a device, unregistering its host objects.
    ///
    /// Returns `false` if the device is not managed.
    pub fn remove_device(&mut self, id: &DeviceId) -> bool {
        match self.delegates.remove(id) {
            Some(delegate) => {
                delegate.destroy();
                true
            }
            None => false,
        }
    }

    /// The delegate of a device.
    #[must_use]
    pub fn delegate(&self, id: &DeviceId) -> Option<&DeviceDelegate> {
        self.delegates.get(id)
    }

    /// Number of managed devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.delegates.len()
    }

    /// Unregisters every cached host object that belongs to an excluded
    /// device.
    ///
    /// Returns the number of objects removed.
    pub fn purge_excluded_accessories(&self) -> usize {
        let stale: Vec<_> = self
            .handle
            .accessories()
            .into_iter()
            .filter(|pa| pa.device_id().is_some_and(|id| self.options.is_excluded(&id)))
            .collect();
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Removing accessories of excluded devices");
            self.handle.remove_accessories(&stale);
        }
        stale.len()
    }

    /// Runs every pending accessory transition.
    pub fn run_pending(&self) -> usize {
        self.handle.run_pending()
    }

    /// Detaches every delegate without unregistering anything.
    pub fn shutdown(&mut self) {
        for (_, delegate) in self.delegates.drain() {
            delegate.detach();
        }
    }

    fn handle_event(&mut self, event: PlatformEvent) -> bool {
        match event {
            PlatformEvent::DeviceDiscovered(device) => {
                let id = device.id().clone();
                if let Err(err) = self.add_device(device) {
                    tracing::error!(device = %id, error = %err, "Failed to add device");
                }
            }
            PlatformEvent::DeviceRemoved(id) => {
                self.remove_device(&id);
            }
            PlatformEvent::Shutdown => return false,
        }
        true
    }

    /// Processes events until [`PlatformEvent::Shutdown`] arrives or every
    /// sender is dropped, then shuts down.
    ///
    /// Pending transitions run after each event and whenever one is
    /// scheduled from a device callback.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PlatformEvent>) {
        let handle = self.handle.clone();
        self.purge_excluded_accessories();
        handle.run_pending();

        loop {
            tokio::select! {
                event = events.recv() => {
                    let keep_running = match event {
                        Some(event) => self.handle_event(event),
                        None => false,
                    };
                    handle.run_pending();
                    if !keep_running {
                        break;
                    }
                }
                () = handle.transitions().scheduled() => {
                    handle.run_pending();
                }
            }
        }

        self.shutdown();
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("handle", &self.handle)
            .field("devices", &self.delegates.len())
            .finish_non_exhaustive()
    }
}
