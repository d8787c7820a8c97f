// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessories: a set of abilities behind one host accessory object.
//!
//! The host object of an accessory exists exactly while the accessory is
//! active. Changes of the `active` flag do not take effect immediately:
//! they mark the accessory as pending and enqueue it on the platform's
//! [`TransitionQueue`], which activates or deactivates it on the next
//! drain. An accessory that is created and deactivated right away
//! therefore never shows up in the host.

mod transition;

pub use transition::TransitionQueue;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Span;
use uuid::Uuid;

use crate::ability::Ability;
use crate::device::DeviceId;
use crate::host::{AccessoryContext, DeviceContext, PlatformAccessory, accessory_uuid};
use crate::platform::PlatformHandle;

/// Identifier of an accessory, unique within its device (e.g. `switch-0`).
pub type AccessoryId = String;

struct AccessoryState {
    active: bool,
    pending: bool,
    platform_accessory: Option<PlatformAccessory>,
}

pub(crate) struct AccessoryInner {
    id: AccessoryId,
    device_id: DeviceId,
    uuid: Uuid,
    name: String,
    span: Span,
    abilities: Vec<Ability>,
    platform: PlatformHandle,
    state: Mutex<AccessoryState>,
}

impl AccessoryInner {
    /// Runs the pending transition, if it has not been cancelled.
    ///
    /// Returns true if a transition ran.
    pub(crate) fn run_pending(&self) -> bool {
        let active = {
            let mut state = self.state.lock();
            if !state.pending {
                return false;
            }
            state.pending = false;
            state.active
        };

        if active {
            self.activate();
        } else {
            self.deactivate();
        }
        true
    }

    fn activate(&self) {
        let pa = {
            let mut state = self.state.lock();
            match &state.platform_accessory {
                Some(pa) => pa.clone(),
                None => {
                    let pa = self
                        .platform
                        .accessory(self.uuid)
                        .unwrap_or_else(|| self.create_platform_accessory());
                    state.platform_accessory = Some(pa.clone());
                    tracing::debug!(parent: &self.span, accessory = %self.id, "Accessory activated");
                    pa
                }
            }
        };

        for ability in &self.abilities {
            if let Err(err) = ability.setup(&pa, &self.span) {
                tracing::error!(parent: &self.span, error = %err, "Failed to setup ability");
                tracing::debug!(parent: &self.span, accessory = %self.id, error = ?err, "Ability setup failed");
            }
        }

        self.platform.add_accessory(&pa);
    }

    fn deactivate(&self) {
        for ability in &self.abilities {
            ability.destroy();
        }

        let pa = self.state.lock().platform_accessory.take();
        if let Some(pa) = pa {
            self.platform.remove_accessories(std::slice::from_ref(&pa));
            tracing::debug!(parent: &self.span, accessory = %self.id, "Accessory deactivated");
        }
    }

    fn create_platform_accessory(&self) -> PlatformAccessory {
        let pa = PlatformAccessory::new(self.name.clone(), self.uuid);
        pa.set_context(AccessoryContext {
            device: Some(DeviceContext {
                id: self.device_id.clone(),
            }),
        });
        pa
    }
}

/// Handle to an accessory.
///
/// Cloning yields another handle to the same accessory.
#[derive(Clone)]
pub struct Accessory {
    inner: Arc<AccessoryInner>,
}

impl Accessory {
    /// Creates an active accessory and schedules its first transition.
    ///
    /// A host object cached under the accessory's UUID is picked up.
    pub(crate) fn new(
        id: impl Into<AccessoryId>,
        device_id: DeviceId,
        name: impl Into<String>,
        platform: PlatformHandle,
        span: Span,
        abilities: Vec<Ability>,
    ) -> Self {
        let id = id.into();
        let uuid = accessory_uuid(&device_id, &id);

        let cached = platform.accessory(uuid);
        if cached.is_some() {
            tracing::debug!(parent: &span, accessory = %id, "Accessory loaded from cache");
        }

        let accessory = Self {
            inner: Arc::new(AccessoryInner {
                id,
                device_id,
                uuid,
                name: name.into(),
                span,
                abilities,
                platform,
                state: Mutex::new(AccessoryState {
                    active: true,
                    pending: false,
                    platform_accessory: cached,
                }),
            }),
        };
        accessory.update();
        accessory
    }

    /// Local ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// ID of the owning device.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    /// UUID derived from device ID and local ID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Abilities in declaration order.
    #[must_use]
    pub fn abilities(&self) -> &[Ability] {
        &self.inner.abilities
    }

    /// The ability whose service has the given subtype.
    #[must_use]
    pub fn find_ability(&self, subtype: &str) -> Option<&Ability> {
        self.inner
            .abilities
            .iter()
            .find(|a| a.identity().is_some_and(|i| i.subtype == subtype))
    }

    /// The `active` flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    /// Returns true while a transition is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending
    }

    /// The host object; present while the accessory is active.
    #[must_use]
    pub fn platform_accessory(&self) -> Option<PlatformAccessory> {
        self.inner.state.lock().platform_accessory.clone()
    }

    /// Changes the `active` flag. Setting the current value does nothing.
    pub fn set_active(&self, active: bool) {
        {
            let mut state = self.inner.state.lock();
            if state.active == active {
                return;
            }
            state.active = active;
        }
        self.update();
    }

    /// Sets `active` and returns the accessory, for chaining.
    #[must_use]
    pub fn with_active(self, active: bool) -> Self {
        self.set_active(active);
        self
    }

    /// Schedules a transition to the current `active` state.
    fn update(&self) {
        let newly_pending = {
            let mut state = self.inner.state.lock();
            !std::mem::replace(&mut state.pending, true)
        };
        if newly_pending {
            self.inner.platform.transitions().schedule(&self.inner);
        }
    }

    /// Cancels a pending transition and detaches every ability.
    ///
    /// The host object is kept.
    pub fn detach(&self) {
        self.inner.state.lock().pending = false;
        for ability in &self.inner.abilities {
            ability.detach();
        }
    }

    /// Removes the host object from the accessory without unregistering it.
    pub(crate) fn take_platform_accessory(&self) -> Option<PlatformAccessory> {
        self.inner.state.lock().platform_accessory.take()
    }
}

impl std::fmt::Debug for Accessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Accessory")
            .field("id", &self.inner.id)
            .field("uuid", &self.inner.uuid)
            .field("name", &self.inner.name)
            .field("active", &state.active)
            .field("pending", &state.pending)
            .field("abilities", &self.inner.abilities.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
    use crate::error::AbilityError;
    use crate::hap::ServiceType;
    use crate::host::{HostApi, InMemoryHost};

    struct Failing;

    impl Sealed for Failing {}

    impl Capability for Failing {
        fn service_type(&self) -> ServiceType {
            ServiceType::Outlet
        }

        fn initialize(&self, _ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
            Err(AbilityError::Component("boom".into()))
        }
    }

    struct Plain(&'static str);

    impl Sealed for Plain {}

    impl Capability for Plain {
        fn service_type(&self) -> ServiceType {
            ServiceType::Switch
        }

        fn identity(&self) -> Option<ServiceIdentity> {
            Some(ServiceIdentity::new(self.0, self.0))
        }

        fn initialize(&self, _ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
            Ok(Bindings::new())
        }
    }

    fn platform() -> (Arc<InMemoryHost>, PlatformHandle) {
        let host = Arc::new(InMemoryHost::new());
        let handle = PlatformHandle::new(Arc::clone(&host) as Arc<dyn HostApi>);
        (host, handle)
    }

    fn accessory(handle: &PlatformHandle, abilities: Vec<Ability>) -> Accessory {
        Accessory::new(
            "switch",
            DeviceId::new("dev"),
            "Test",
            handle.clone(),
            Span::none(),
            abilities,
        )
    }

    #[test]
    fn activation_is_deferred() {
        let (host, handle) = platform();
        let acc = accessory(&handle, vec![Ability::new(Plain("a"))]);

        assert!(acc.platform_accessory().is_none());
        assert!(acc.is_pending());
        assert!(host.published().is_empty());

        assert_eq!(handle.run_pending(), 1);
        let pa = acc.platform_accessory().unwrap();
        assert!(host.is_published(pa.uuid()));
        assert_eq!(pa.device_id(), Some(DeviceId::new("dev")));
        assert!(acc.abilities()[0].service().is_some());
    }

    #[test]
    fn immediate_deactivation_never_reaches_host() {
        let (host, handle) = platform();
        let acc = accessory(&handle, vec![]).with_active(false);

        handle.run_pending();

        assert!(acc.platform_accessory().is_none());
        assert!(host.operations().is_empty());
    }

    #[test]
    fn last_toggle_wins() {
        let (host, handle) = platform();
        let acc = accessory(&handle, vec![]);
        acc.set_active(false);
        acc.set_active(true);

        assert_eq!(handle.run_pending(), 1);
        assert!(acc.platform_accessory().is_some());
        assert_eq!(host.operations().len(), 1);
    }

    #[test]
    fn deactivation_unregisters_and_reactivation_recreates() {
        let (host, handle) = platform();
        let acc = accessory(&handle, vec![Ability::new(Plain("a"))]);
        handle.run_pending();
        let first = acc.platform_accessory().unwrap();

        acc.set_active(false);
        handle.run_pending();
        assert!(acc.platform_accessory().is_none());
        assert!(!host.is_published(first.uuid()));
        assert!(!acc.abilities()[0].is_set_up());

        acc.set_active(true);
        handle.run_pending();
        let second = acc.platform_accessory().unwrap();
        assert!(!second.ptr_eq(&first));
        assert_eq!(second.uuid(), first.uuid());
        assert!(host.is_published(second.uuid()));
    }

    #[test]
    fn failing_ability_does_not_stop_siblings() {
        let (host, handle) = platform();
        let acc = accessory(
            &handle,
            vec![
                Ability::new(Failing),
                Ability::new(Plain("b")),
            ],
        );

        handle.run_pending();

        assert!(acc.abilities()[1].service().is_some());
        assert_eq!(host.published().len(), 1);
    }

    #[test]
    fn detach_cancels_pending_transition() {
        let (host, handle) = platform();
        let acc = accessory(&handle, vec![]);
        acc.detach();

        assert_eq!(handle.run_pending(), 0);
        assert!(host.operations().is_empty());
    }

    #[test]
    fn cached_object_is_reused() {
        let (host, handle) = platform();
        let uuid = accessory_uuid(&DeviceId::new("dev"), "switch");
        let cached = PlatformAccessory::new("Test", uuid);
        handle.configure_accessory(cached.clone());

        let acc = accessory(&handle, vec![]);
        assert!(acc.platform_accessory().unwrap().ptr_eq(&cached));

        handle.run_pending();
        // already known to the host: not registered again
        assert!(host.operations().is_empty());
    }

    #[test]
    fn find_ability_by_subtype() {
        let (_host, handle) = platform();
        let acc = accessory(
            &handle,
            vec![Ability::new(Plain("x")), Ability::new(Plain("y"))],
        );
        assert!(acc.find_ability("y").unwrap().ptr_eq(&acc.abilities()[1]));
        assert!(acc.find_ability("z").is_none());
    }
}
