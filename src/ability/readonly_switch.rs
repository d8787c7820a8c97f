// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
use crate::device::{ComponentEvent, Input, Property};
use crate::error::AbilityError;
use crate::hap::{CharacteristicType, Perm, ServiceType};

/// Mirrors a digital input as a switch that cannot be toggled from HomeKit.
#[derive(Debug)]
pub struct ReadonlySwitchAbility {
    component: Arc<Input>,
}

impl ReadonlySwitchAbility {
    /// Creates the ability for `component`.
    #[must_use]
    pub fn new(component: Arc<Input>) -> Self {
        Self { component }
    }
}

impl Sealed for ReadonlySwitchAbility {}

impl Capability for ReadonlySwitchAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::Switch
    }

    fn identity(&self) -> Option<ServiceIdentity> {
        let id = self.component.id();
        Some(ServiceIdentity::new(
            format!("Switch {}", id + 1),
            format!("readonly-switch-{id}"),
        ))
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let on = ctx.service.characteristic(CharacteristicType::On);
        on.set_perms(&[Perm::Notify, Perm::PairedRead])
            .update_value(self.component.state().unwrap_or(false));

        let weak = Arc::downgrade(&self.component);
        let subscription = self.component.subscribe(move |event| {
            if *event == ComponentEvent::Changed(Property::InputState)
                && let Some(input) = weak.upgrade()
            {
                on.update_value(input.state().unwrap_or(false));
            }
        });

        Ok(Bindings::new().subscription(subscription))
    }
}
