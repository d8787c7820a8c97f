// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
use crate::device::{ComponentEvent, Property, Switch};
use crate::error::{AbilityError, HapStatus};
use crate::hap::{CharacteristicType, ServiceType};

/// Exposes a relay output as a HomeKit switch.
#[derive(Debug)]
pub struct SwitchAbility {
    component: Arc<Switch>,
}

impl SwitchAbility {
    /// Creates the ability for `component`.
    #[must_use]
    pub fn new(component: Arc<Switch>) -> Self {
        Self { component }
    }
}

impl Sealed for SwitchAbility {}

impl Capability for SwitchAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::Switch
    }

    fn identity(&self) -> Option<ServiceIdentity> {
        let id = self.component.id();
        Some(ServiceIdentity::new(
            format!("Switch {}", id + 1),
            format!("switch-{id}"),
        ))
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        Ok(bind_output(ctx, &self.component))
    }
}

/// Binds the `On` characteristic to a switch output in both directions.
///
/// Controller writes equal to the current output are dropped; a failed
/// command is reported as a communication failure and leaves the value
/// unchanged.
pub(super) fn bind_output(ctx: &AbilityContext<'_>, component: &Arc<Switch>) -> Bindings {
    let on = ctx.service.characteristic(CharacteristicType::On);
    on.update_value(component.output());

    let weak = Arc::downgrade(component);
    let span = ctx.span.clone();
    on.on_set(move |value| {
        let weak = weak.clone();
        let span = span.clone();
        async move {
            let Some(switch) = weak.upgrade() else {
                return Err(HapStatus::ServiceCommunicationFailure);
            };
            let Some(wanted) = value.as_bool() else {
                return Err(HapStatus::InvalidValueInRequest);
            };
            if wanted == switch.output() {
                return Ok(());
            }

            switch.set(wanted).await.map_err(|err| {
                tracing::error!(parent: &span, switch = switch.id(), error = %err, "Failed to set switch");
                HapStatus::ServiceCommunicationFailure
            })
        }
    });

    let weak = Arc::downgrade(component);
    let target = on.clone();
    let subscription = component.subscribe(move |event| {
        if *event == ComponentEvent::Changed(Property::Output)
            && let Some(switch) = weak.upgrade()
        {
            target.update_value(switch.output());
        }
    });

    Bindings::new().write_handler(on).subscription(subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::device::{MemoryTransport, SwitchStatus};
    use crate::error::CommandError;
    use crate::hap::CharacteristicValue;
    use crate::host::PlatformAccessory;
    use tracing::Span;
    use uuid::Uuid;

    fn setup(output: bool) -> (Arc<MemoryTransport>, Arc<Switch>, Ability, PlatformAccessory) {
        let transport = Arc::new(MemoryTransport::new());
        let switch = Arc::new(Switch::new(
            0,
            SwitchStatus::new(output),
            Arc::clone(&transport) as _,
        ));
        let ability = Ability::new(SwitchAbility::new(Arc::clone(&switch)));
        let pa = PlatformAccessory::new("Plug", Uuid::nil());
        ability.setup(&pa, &Span::none()).unwrap();
        (transport, switch, ability, pa)
    }

    #[tokio::test]
    async fn write_equal_to_output_sends_nothing() {
        let (transport, _switch, ability, _pa) = setup(true);
        let on = ability.service().unwrap().characteristic(CharacteristicType::On);

        on.handle_write(true.into()).await.unwrap();

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn write_different_value_sends_one_command() {
        let (transport, switch, ability, _pa) = setup(false);
        let on = ability.service().unwrap().characteristic(CharacteristicType::On);

        on.handle_write(true.into()).await.unwrap();

        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].method, "Switch.Set");
        assert!(!switch.output());
    }

    #[tokio::test]
    async fn failed_command_reports_communication_failure() {
        let (transport, switch, ability, _pa) = setup(false);
        transport.fail_with(Some(CommandError::Timeout(5000)));
        let on = ability.service().unwrap().characteristic(CharacteristicType::On);

        let result = on.handle_write(true.into()).await;

        assert_eq!(result, Err(HapStatus::ServiceCommunicationFailure));
        assert_eq!(on.value(), CharacteristicValue::Bool(false));
        assert!(!switch.output());
    }

    #[test]
    fn device_changes_update_characteristic_without_commands() {
        let (transport, switch, ability, _pa) = setup(false);

        switch.update_status(|s| s.output = true);

        let service = ability.service().unwrap();
        assert_eq!(service.value(CharacteristicType::On), Some(true.into()));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn detach_stops_following_device() {
        let (_transport, switch, ability, _pa) = setup(false);
        let on = ability.service().unwrap().characteristic(CharacteristicType::On);

        ability.detach();
        switch.update_status(|s| s.output = true);

        assert_eq!(on.value(), CharacteristicValue::Bool(false));
        assert!(!on.has_on_set());
    }
}
