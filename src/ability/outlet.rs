// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::switch::bind_output;
use super::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
use crate::device::{ComponentEvent, PowerReadings, Property, Switch};
use crate::error::AbilityError;
use crate::hap::{CharacteristicType, ServiceType};

/// Exposes a relay output as a HomeKit outlet.
#[derive(Debug)]
pub struct OutletAbility {
    component: Arc<Switch>,
}

impl OutletAbility {
    /// Creates the ability for `component`.
    #[must_use]
    pub fn new(component: Arc<Switch>) -> Self {
        Self { component }
    }
}

fn in_use(readings: &PowerReadings) -> bool {
    readings.apower.is_some_and(|p| p != 0.0)
}

impl Sealed for OutletAbility {}

impl Capability for OutletAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::Outlet
    }

    fn identity(&self) -> Option<ServiceIdentity> {
        let id = self.component.id();
        Some(ServiceIdentity::new(
            format!("Outlet {}", id + 1),
            format!("outlet-{id}"),
        ))
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let bindings = bind_output(ctx, &self.component);

        let in_use_char = ctx.service.characteristic(CharacteristicType::OutletInUse);
        in_use_char.update_value(in_use(&self.component.status().meter));

        let weak = Arc::downgrade(&self.component);
        let subscription = self.component.subscribe(move |event| {
            if *event == ComponentEvent::Changed(Property::Apower)
                && let Some(switch) = weak.upgrade()
            {
                in_use_char.update_value(in_use(&switch.status().meter));
            }
        });

        Ok(bindings.subscription(subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::device::{MemoryTransport, SwitchStatus};
    use crate::hap::CharacteristicValue;
    use crate::host::PlatformAccessory;
    use tracing::Span;
    use uuid::Uuid;

    #[test]
    fn outlet_in_use_follows_power() {
        let switch = Arc::new(Switch::new(
            1,
            SwitchStatus::new(true),
            Arc::new(MemoryTransport::new()),
        ));
        let ability = Ability::new(OutletAbility::new(Arc::clone(&switch)));
        let pa = PlatformAccessory::new("Plug", Uuid::nil());
        ability.setup(&pa, &Span::none()).unwrap();

        let service = pa.service_by_subtype(ServiceType::Outlet, "outlet-1").unwrap();
        assert_eq!(service.name(), Some("Outlet 2"));
        assert_eq!(
            service.value(CharacteristicType::OutletInUse),
            Some(CharacteristicValue::Bool(false))
        );

        switch.update_status(|s| s.meter.apower = Some(40.5));
        assert_eq!(
            service.value(CharacteristicType::OutletInUse),
            Some(CharacteristicValue::Bool(true))
        );
        assert_eq!(
            service.value(CharacteristicType::On),
            Some(CharacteristicValue::Bool(true))
        );
    }
}
