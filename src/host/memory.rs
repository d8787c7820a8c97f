// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory host.

use parking_lot::Mutex;
use uuid::Uuid;

use super::{HostApi, PlatformAccessory};

/// A call made against [`InMemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOperation {
    /// Accessories were registered.
    Register(Vec<Uuid>),
    /// Accessories were unregistered.
    Unregister(Vec<Uuid>),
}

/// Host that keeps published accessories in memory and logs every call.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    published: Mutex<Vec<PlatformAccessory>>,
    operations: Mutex<Vec<HostOperation>>,
}

impl InMemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently published accessories.
    #[must_use]
    pub fn published(&self) -> Vec<PlatformAccessory> {
        self.published.lock().clone()
    }

    /// The published accessory with the given UUID.
    #[must_use]
    pub fn accessory(&self, uuid: Uuid) -> Option<PlatformAccessory> {
        self.published.lock().iter().find(|a| a.uuid() == uuid).cloned()
    }

    /// Returns true if an accessory with the given UUID is published.
    #[must_use]
    pub fn is_published(&self, uuid: Uuid) -> bool {
        self.published.lock().iter().any(|a| a.uuid() == uuid)
    }

    /// Every call made so far.
    #[must_use]
    pub fn operations(&self) -> Vec<HostOperation> {
        self.operations.lock().clone()
    }

    /// Forgets the call log.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }
}

impl HostApi for InMemoryHost {
    fn register_accessories(&self, accessories: &[PlatformAccessory]) {
        let mut published = self.published.lock();
        for accessory in accessories {
            if !published.iter().any(|a| a.uuid() == accessory.uuid()) {
                published.push(accessory.clone());
            }
        }
        self.operations.lock().push(HostOperation::Register(
            accessories.iter().map(PlatformAccessory::uuid).collect(),
        ));
    }

    fn unregister_accessories(&self, accessories: &[PlatformAccessory]) {
        self.published
            .lock()
            .retain(|a| !accessories.iter().any(|r| r.uuid() == a.uuid()));
        self.operations.lock().push(HostOperation::Unregister(
            accessories.iter().map(PlatformAccessory::uuid).collect(),
        ));
    }
}
