// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Abilities: one host service bound to one device component.
//!
//! An [`Ability`] owns the lifecycle (setup, activation toggles, detach,
//! destroy) and delegates the service-specific work to a [`Capability`].
//! The set of capabilities is closed; each variant lives in its own module.
//!
//! The service of an ability exists exactly when the ability is active and
//! has been set up against an accessory object. Toggling `active` in
//! between adds or removes the service immediately.

mod accessory_information;
mod cover;
mod outlet;
mod power_meter;
mod readonly_switch;
mod service_label;
mod stateless_programmable_switch;
mod switch;

pub use accessory_information::AccessoryInformationAbility;
pub use cover::CoverAbility;
pub use outlet::OutletAbility;
pub use power_meter::PowerMeterAbility;
pub use readonly_switch::ReadonlySwitchAbility;
pub use service_label::{ServiceLabelAbility, ServiceLabelNamespace};
pub use stateless_programmable_switch::StatelessProgrammableSwitchAbility;
pub use switch::SwitchAbility;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Span;

use crate::error::AbilityError;
use crate::hap::{CharacteristicType, ServiceType};
use crate::host::{Characteristic, PlatformAccessory, Service};
use crate::subscription::Subscription;

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// Name and subtype that single out a service among others of its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// Display name of the service.
    pub name: String,
    /// Subtype, unique per service type within an accessory.
    pub subtype: String,
}

impl ServiceIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtype: subtype.into(),
        }
    }
}

/// What a capability gets to work with while initializing its service.
#[derive(Debug)]
pub struct AbilityContext<'a> {
    /// The accessory object the service belongs to.
    pub accessory: &'a PlatformAccessory,
    /// The service, freshly created or restored from cache.
    pub service: &'a Service,
    /// Device-scoped span to log under.
    pub span: &'a Span,
}

/// Event subscriptions and write handlers installed by a capability.
///
/// Dropping the bindings releases every subscription and removes every
/// registered write handler.
#[derive(Default)]
#[must_use]
pub struct Bindings {
    subscriptions: Vec<Subscription>,
    handlers: Vec<Characteristic>,
    service_handlers: Vec<(Service, CharacteristicType)>,
}

impl Bindings {
    /// Creates empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device event subscription.
    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Adds a characteristic whose write handler must be removed on release.
    pub fn write_handler(mut self, characteristic: Characteristic) -> Self {
        self.handlers.push(characteristic);
        self
    }

    /// Adds a write handler that may come and go with the characteristic.
    ///
    /// Whatever `kind` characteristic the service holds on release has its
    /// handler removed.
    pub fn service_write_handler(mut self, service: Service, kind: CharacteristicType) -> Self {
        self.service_handlers.push((service, kind));
        self
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.handlers.is_empty() && self.service_handlers.is_empty()
    }
}

impl Drop for Bindings {
    fn drop(&mut self) {
        for characteristic in &self.handlers {
            characteristic.clear_on_set();
        }
        for (service, kind) in &self.service_handlers {
            if let Some(characteristic) = service.find_characteristic(*kind) {
                characteristic.clear_on_set();
            }
        }
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindings")
            .field("subscriptions", &self.subscriptions.len())
            .field("handlers", &(self.handlers.len() + self.service_handlers.len()))
            .finish()
    }
}

/// Service-specific part of an ability.
pub trait Capability: Send + Sealed {
    /// The host service type.
    fn service_type(&self) -> ServiceType;

    /// Name and subtype of the service, for types that may occur more than
    /// once per accessory.
    fn identity(&self) -> Option<ServiceIdentity> {
        None
    }

    /// Extra condition on top of the `active` flag.
    fn is_available(&self) -> bool {
        true
    }

    /// Publishes initial values and binds the service to the component.
    ///
    /// # Errors
    ///
    /// Returns an [`AbilityError`] if the service cannot be bound.
    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError>;
}

struct HostBinding {
    accessory: PlatformAccessory,
    span: Span,
}

struct AbilityState {
    capability: Box<dyn Capability>,
    active: bool,
    host: Option<HostBinding>,
    service: Option<Service>,
    bindings: Option<Bindings>,
}

impl AbilityState {
    fn update(&mut self) -> Result<(), AbilityError> {
        let Self {
            capability,
            active,
            host,
            service,
            bindings,
        } = self;

        let Some(host) = host.as_ref() else {
            return Ok(());
        };

        if *active && capability.is_available() {
            if service.is_none() {
                let created = obtain_service(capability.as_ref(), &host.accessory);
                *service = Some(created.clone());

                let ctx = AbilityContext {
                    accessory: &host.accessory,
                    service: &created,
                    span: &host.span,
                };
                *bindings = Some(capability.initialize(&ctx)?);
            }
        } else {
            bindings.take();

            // the accessory object may come from cache with a matching service
            let existing = service
                .take()
                .or_else(|| find_service(capability.as_ref(), &host.accessory));
            if let Some(existing) = existing {
                host.accessory.remove_service(&existing);
            }
        }

        Ok(())
    }
}

fn find_service(capability: &dyn Capability, accessory: &PlatformAccessory) -> Option<Service> {
    let kind = capability.service_type();
    match capability.identity() {
        Some(identity) => accessory.service_by_subtype(kind, &identity.subtype),
        None => accessory.service(kind),
    }
}

fn obtain_service(capability: &dyn Capability, accessory: &PlatformAccessory) -> Service {
    if let Some(existing) = find_service(capability, accessory) {
        return existing;
    }

    let kind = capability.service_type();
    match capability.identity() {
        Some(identity) => {
            accessory.add_service(kind, Some(&identity.name), Some(&identity.subtype))
        }
        None => accessory.add_service(kind, None, None),
    }
}

/// Handle to an ability.
///
/// Cloning yields another handle to the same ability.
#[derive(Clone)]
pub struct Ability {
    state: Arc<Mutex<AbilityState>>,
}

impl Ability {
    /// Creates an active ability.
    pub fn new(capability: impl Capability + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(AbilityState {
                capability: Box::new(capability),
                active: true,
                host: None,
                service: None,
                bindings: None,
            })),
        }
    }

    /// Sets `active` and returns the ability, for chaining.
    #[must_use]
    pub fn with_active(self, active: bool) -> Self {
        self.set_active(active);
        self
    }

    /// The raw `active` flag.
    #[must_use]
    pub fn active(&self) -> bool {
        self.state.lock().active
    }

    /// Whether the ability should currently have a service.
    #[must_use]
    pub fn is_active(&self) -> bool {
        let state = self.state.lock();
        state.active && state.capability.is_available()
    }

    /// Changes the `active` flag. Setting the current value does nothing.
    ///
    /// Once set up, the service is added or removed before this returns.
    pub fn set_active(&self, active: bool) {
        let mut state = self.state.lock();
        if state.active == active {
            return;
        }
        state.active = active;

        if let Err(err) = state.update() {
            let span = state.host.as_ref().map_or_else(Span::none, |h| h.span.clone());
            tracing::error!(parent: &span, error = %err, "Failed to update ability");
        }
    }

    /// Attaches the ability to an accessory object.
    ///
    /// Called every time the owning accessory becomes active.
    ///
    /// # Errors
    ///
    /// Returns the error raised while initializing the service.
    pub fn setup(&self, accessory: &PlatformAccessory, span: &Span) -> Result<(), AbilityError> {
        let mut state = self.state.lock();
        state.host = Some(HostBinding {
            accessory: accessory.clone(),
            span: span.clone(),
        });
        state.update()
    }

    /// Releases subscriptions and write handlers; the service stays.
    pub fn detach(&self) {
        self.state.lock().bindings.take();
    }

    /// Detaches and forgets the accessory object and service.
    ///
    /// The service is left on the accessory object, which is about to be
    /// discarded as a whole.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        state.bindings.take();
        state.host = None;
        state.service = None;
    }

    /// Returns true once set up and not yet destroyed.
    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.state.lock().host.is_some()
    }

    /// The current service, if any.
    #[must_use]
    pub fn service(&self) -> Option<Service> {
        self.state.lock().service.clone()
    }

    /// The service type of the capability.
    #[must_use]
    pub fn service_type(&self) -> ServiceType {
        self.state.lock().capability.service_type()
    }

    /// Name and subtype of the capability's service.
    #[must_use]
    pub fn identity(&self) -> Option<ServiceIdentity> {
        self.state.lock().capability.identity()
    }

    /// Returns true if both handles refer to the same ability.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for Ability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Ability")
            .field("service_type", &state.capability.service_type())
            .field("active", &state.active)
            .field("set_up", &state.host.is_some())
            .field("has_service", &state.service.is_some())
            .finish()
    }
}
