// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
use crate::device::{ButtonPress, ComponentEvent, Input};
use crate::error::AbilityError;
use crate::hap::{CharacteristicType, ServiceType, programmable_switch_event};

/// Reports button presses of an input.
#[derive(Debug)]
pub struct StatelessProgrammableSwitchAbility {
    component: Arc<Input>,
}

impl StatelessProgrammableSwitchAbility {
    /// Creates the ability for `component`.
    #[must_use]
    pub fn new(component: Arc<Input>) -> Self {
        Self { component }
    }
}

fn event_value(press: ButtonPress) -> i64 {
    match press {
        ButtonPress::Single => programmable_switch_event::SINGLE_PRESS,
        ButtonPress::Double => programmable_switch_event::DOUBLE_PRESS,
        ButtonPress::Long => programmable_switch_event::LONG_PRESS,
    }
}

impl Sealed for StatelessProgrammableSwitchAbility {}

impl Capability for StatelessProgrammableSwitchAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::StatelessProgrammableSwitch
    }

    fn identity(&self) -> Option<ServiceIdentity> {
        let id = self.component.id();
        Some(ServiceIdentity::new(
            format!("Button {}", id + 1),
            format!("stateless-programmable-switch-{id}"),
        ))
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let id = self.component.id();
        ctx.service
            .set_characteristic(CharacteristicType::ServiceLabelIndex, id + 1);

        let event = ctx.service.characteristic(CharacteristicType::ProgrammableSwitchEvent);
        let span = ctx.span.clone();
        let subscription = self.component.subscribe(move |e| {
            if let ComponentEvent::Push(press) = *e {
                tracing::debug!(parent: &span, input = id, ?press, "Button press");
                event.update_value(event_value(press));
            }
        });

        Ok(Bindings::new().subscription(subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::device::InputType;
    use crate::hap::CharacteristicValue;
    use crate::host::PlatformAccessory;
    use tracing::Span;
    use uuid::Uuid;

    #[tokio::test]
    async fn each_press_is_one_update() {
        let input = Arc::new(Input::new(1, InputType::Button, None));
        let ability = Ability::new(StatelessProgrammableSwitchAbility::new(Arc::clone(&input)));
        let pa = PlatformAccessory::new("I4", Uuid::nil());
        ability.setup(&pa, &Span::none()).unwrap();

        let service = ability.service().unwrap();
        assert_eq!(
            service.value(CharacteristicType::ServiceLabelIndex),
            Some(CharacteristicValue::Int(2))
        );

        let mut rx = service
            .characteristic(CharacteristicType::ProgrammableSwitchEvent)
            .subscribe();
        input.push(ButtonPress::Double);
        input.push(ButtonPress::Long);

        assert_eq!(
            rx.recv().await.unwrap(),
            CharacteristicValue::Int(programmable_switch_event::DOUBLE_PRESS)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            CharacteristicValue::Int(programmable_switch_event::LONG_PRESS)
        );
        assert!(rx.try_recv().is_err());
    }
}
