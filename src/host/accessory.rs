// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side accessory object.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Service;
use crate::device::DeviceId;
use crate::hap::ServiceType;

/// Namespace for accessory UUIDs.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6f3c_1d2e_9a4b_5c8d_a1e2_f3b4_c5d6_e7f8);

/// Derives the UUID of an accessory from its device and local role ID.
///
/// The same pair always yields the same UUID, which is what lets the host
/// restore a persisted accessory across restarts.
#[must_use]
pub fn accessory_uuid(device_id: &DeviceId, local_id: &str) -> Uuid {
    Uuid::new_v5(&ACCESSORY_NAMESPACE, format!("{device_id}-{local_id}").as_bytes())
}

/// Device reference stored in an accessory context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceContext {
    /// The device ID.
    pub id: DeviceId,
}

/// Data persisted with an accessory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryContext {
    /// The device that owns the accessory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceContext>,
}

struct Inner {
    uuid: Uuid,
    display_name: String,
    context: RwLock<AccessoryContext>,
    services: RwLock<Vec<Service>>,
}

/// The accessory object registered with the host.
///
/// Every accessory carries an `AccessoryInformation` service from the start.
#[derive(Clone)]
pub struct PlatformAccessory {
    inner: Arc<Inner>,
}

impl PlatformAccessory {
    /// Creates an accessory object.
    #[must_use]
    pub fn new(display_name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            inner: Arc::new(Inner {
                uuid,
                display_name: display_name.into(),
                context: RwLock::new(AccessoryContext::default()),
                services: RwLock::new(vec![Service::new(
                    ServiceType::AccessoryInformation,
                    None,
                    None,
                )]),
            }),
        }
    }

    /// The accessory UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    /// The display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    /// A copy of the persisted context.
    #[must_use]
    pub fn context(&self) -> AccessoryContext {
        self.inner.context.read().clone()
    }

    /// Replaces the persisted context.
    pub fn set_context(&self, context: AccessoryContext) {
        *self.inner.context.write() = context;
    }

    /// The ID of the owning device, read from the context.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        self.inner.context.read().device.as_ref().map(|d| d.id.clone())
    }

    /// All services, in insertion order.
    #[must_use]
    pub fn services(&self) -> Vec<Service> {
        self.inner.services.read().clone()
    }

    /// The first service of the given type.
    #[must_use]
    pub fn service(&self, kind: ServiceType) -> Option<Service> {
        self.inner
            .services
            .read()
            .iter()
            .find(|s| s.kind() == kind)
            .cloned()
    }

    /// The service with the given type and subtype.
    #[must_use]
    pub fn service_by_subtype(&self, kind: ServiceType, subtype: &str) -> Option<Service> {
        self.inner
            .services
            .read()
            .iter()
            .find(|s| s.kind() == kind && s.subtype() == Some(subtype))
            .cloned()
    }

    /// Adds a service and returns it.
    pub fn add_service(
        &self,
        kind: ServiceType,
        name: Option<&str>,
        subtype: Option<&str>,
    ) -> Service {
        let service = Service::new(kind, name.map(str::to_string), subtype.map(str::to_string));
        self.inner.services.write().push(service.clone());
        service
    }

    /// Removes a service; returns true if it was present.
    pub fn remove_service(&self, service: &Service) -> bool {
        let mut services = self.inner.services.write();
        let before = services.len();
        services.retain(|s| !s.ptr_eq(service));
        services.len() != before
    }

    /// Returns true if both handles refer to the same accessory object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for PlatformAccessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformAccessory")
            .field("uuid", &self.inner.uuid)
            .field("display_name", &self.inner.display_name)
            .field("services", &self.inner.services.read().len())
            .finish_non_exhaustive()
    }
}
