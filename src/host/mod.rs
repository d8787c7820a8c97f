// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host accessory API.
//!
//! The object graph (accessory → services → characteristics) that a
//! HomeKit bridge publishes, plus the [`HostApi`] trait through which the
//! platform registers and unregisters accessory objects. Pairing and the
//! HAP wire encoding live in the host, not here.

mod accessory;
mod characteristic;
mod memory;
mod service;

pub use accessory::{AccessoryContext, DeviceContext, PlatformAccessory, accessory_uuid};
pub use characteristic::{Characteristic, WriteFuture, WriteHandler};
pub use memory::{HostOperation, InMemoryHost};
pub use service::Service;

/// Registration side of the host.
pub trait HostApi: Send + Sync {
    /// Publishes accessory objects.
    fn register_accessories(&self, accessories: &[PlatformAccessory]);

    /// Withdraws accessory objects.
    fn unregister_accessories(&self, accessories: &[PlatformAccessory]);
}
