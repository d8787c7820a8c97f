// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side service.

use std::sync::Arc;

use parking_lot::RwLock;

use super::Characteristic;
use crate::hap::{CharacteristicType, CharacteristicValue, ServiceType};

struct Inner {
    kind: ServiceType,
    name: Option<String>,
    subtype: Option<String>,
    characteristics: RwLock<Vec<Characteristic>>,
}

/// A service on a [`PlatformAccessory`](super::PlatformAccessory).
///
/// Characteristics are created on first access. A named service starts
/// with a `Name` characteristic holding its name.
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

impl Service {
    pub(crate) fn new(kind: ServiceType, name: Option<String>, subtype: Option<String>) -> Self {
        let service = Self {
            inner: Arc::new(Inner {
                kind,
                name,
                subtype,
                characteristics: RwLock::new(Vec::new()),
            }),
        };
        if let Some(name) = service.inner.name.clone() {
            service.set_characteristic(CharacteristicType::Name, name);
        }
        service
    }

    /// The service type.
    #[must_use]
    pub fn kind(&self) -> ServiceType {
        self.inner.kind
    }

    /// The display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The subtype distinguishing several services of the same type.
    #[must_use]
    pub fn subtype(&self) -> Option<&str> {
        self.inner.subtype.as_deref()
    }

    /// Returns the characteristic of the given type, adding it if needed.
    pub fn characteristic(&self, kind: CharacteristicType) -> Characteristic {
        if let Some(existing) = self.find_characteristic(kind) {
            return existing;
        }

        let mut characteristics = self.inner.characteristics.write();
        // another thread may have added it in between
        if let Some(existing) = characteristics.iter().find(|c| c.kind() == kind) {
            return existing.clone();
        }
        let created = Characteristic::new(kind);
        characteristics.push(created.clone());
        created
    }

    /// Returns the characteristic of the given type without adding it.
    #[must_use]
    pub fn find_characteristic(&self, kind: CharacteristicType) -> Option<Characteristic> {
        self.inner
            .characteristics
            .read()
            .iter()
            .find(|c| c.kind() == kind)
            .cloned()
    }

    /// Returns true if the service has a characteristic of the given type.
    #[must_use]
    pub fn has_characteristic(&self, kind: CharacteristicType) -> bool {
        self.inner
            .characteristics
            .read()
            .iter()
            .any(|c| c.kind() == kind)
    }

    /// All characteristics, in insertion order.
    #[must_use]
    pub fn characteristics(&self) -> Vec<Characteristic> {
        self.inner.characteristics.read().clone()
    }

    /// Removes the characteristic of the given type; returns true if it existed.
    pub fn remove_characteristic(&self, kind: CharacteristicType) -> bool {
        let mut characteristics = self.inner.characteristics.write();
        let before = characteristics.len();
        characteristics.retain(|c| c.kind() != kind);
        characteristics.len() != before
    }

    /// Sets a characteristic value, adding the characteristic if needed.
    pub fn set_characteristic(
        &self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> &Self {
        self.characteristic(kind).update_value(value);
        self
    }

    /// Alias of [`set_characteristic`](Self::set_characteristic) used for
    /// values reported by the device.
    pub fn update_characteristic(
        &self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> &Self {
        self.set_characteristic(kind, value)
    }

    /// The value of a characteristic, if present.
    #[must_use]
    pub fn value(&self, kind: CharacteristicType) -> Option<CharacteristicValue> {
        self.find_characteristic(kind).map(|c| c.value())
    }

    /// Returns true if both handles refer to the same service.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("kind", &self.inner.kind)
            .field("name", &self.inner.name)
            .field("subtype", &self.inner.subtype)
            .field("characteristics", &*self.inner.characteristics.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_service_has_name_characteristic() {
        let s = Service::new(ServiceType::Switch, Some("Switch 1".into()), Some("switch-0".into()));
        assert_eq!(
            s.value(CharacteristicType::Name),
            Some(CharacteristicValue::from("Switch 1"))
        );
        assert_eq!(s.subtype(), Some("switch-0"));
    }

    #[test]
    fn characteristic_is_created_once() {
        let s = Service::new(ServiceType::Switch, None, None);
        let a = s.characteristic(CharacteristicType::On);
        let b = s.characteristic(CharacteristicType::On);
        assert!(a.ptr_eq(&b));
        assert_eq!(s.characteristics().len(), 1);
    }

    #[test]
    fn remove_characteristic_reports_presence() {
        let s = Service::new(ServiceType::PowerMeter, None, None);
        s.set_characteristic(CharacteristicType::Voltage, 230.0);

        assert!(s.remove_characteristic(CharacteristicType::Voltage));
        assert!(!s.remove_characteristic(CharacteristicType::Voltage));
        assert!(!s.has_characteristic(CharacteristicType::Voltage));
    }
}
