// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
use crate::device::{ComponentEvent, MeteredComponent, PowerReadings, Property};
use crate::error::AbilityError;
use crate::hap::{CharacteristicType, ServiceType};
use crate::host::Service;

/// Reports power readings through the custom power meter service.
///
/// `CurrentConsumption` is always present. `Voltage`, `ElectricCurrent`
/// and `TotalConsumption` exist only while the component reports them.
pub struct PowerMeterAbility {
    component: Arc<dyn MeteredComponent>,
}

impl PowerMeterAbility {
    /// Creates the ability for a switch or cover.
    #[must_use]
    pub fn new(component: Arc<dyn MeteredComponent>) -> Self {
        Self { component }
    }
}

impl std::fmt::Debug for PowerMeterAbility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerMeterAbility")
            .field("component", &self.component.id())
            .finish()
    }
}

fn sync_optional(service: &Service, kind: CharacteristicType, value: Option<f64>) {
    match value {
        Some(v) => {
            service.update_characteristic(kind, v);
        }
        None => {
            service.remove_characteristic(kind);
        }
    }
}

fn total_kwh(readings: &PowerReadings) -> Option<f64> {
    readings.aenergy.as_ref().map(|e| e.total / 1000.0)
}

impl Sealed for PowerMeterAbility {}

impl Capability for PowerMeterAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::PowerMeter
    }

    fn identity(&self) -> Option<ServiceIdentity> {
        let id = self.component.id();
        Some(ServiceIdentity::new(
            format!("Power Meter {}", id + 1),
            format!("power-meter-{id}"),
        ))
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let readings = self.component.readings();
        let service = ctx.service;

        service.set_characteristic(
            CharacteristicType::CurrentConsumption,
            readings.apower.unwrap_or(0.0),
        );
        sync_optional(service, CharacteristicType::Voltage, readings.voltage);
        sync_optional(service, CharacteristicType::ElectricCurrent, readings.current);
        sync_optional(service, CharacteristicType::TotalConsumption, total_kwh(&readings));

        let weak = Arc::downgrade(&self.component);
        let service = service.clone();
        let subscription = self.component.subscribe_events(Box::new(move |event: &ComponentEvent| {
            let ComponentEvent::Changed(property) = *event else {
                return;
            };
            let Some(component) = weak.upgrade() else {
                return;
            };
            let readings = component.readings();

            match property {
                Property::Apower => {
                    service.update_characteristic(
                        CharacteristicType::CurrentConsumption,
                        readings.apower.unwrap_or(0.0),
                    );
                }
                Property::Voltage => {
                    sync_optional(&service, CharacteristicType::Voltage, readings.voltage);
                }
                Property::Current => {
                    sync_optional(&service, CharacteristicType::ElectricCurrent, readings.current);
                }
                Property::Aenergy => {
                    sync_optional(&service, CharacteristicType::TotalConsumption, total_kwh(&readings));
                }
                _ => {}
            }
        }));

        Ok(Bindings::new().subscription(subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::device::{EnergyCounter, MemoryTransport, Switch, SwitchStatus};
    use crate::hap::CharacteristicValue;
    use crate::host::PlatformAccessory;
    use tracing::Span;
    use uuid::Uuid;

    fn metered(readings: PowerReadings) -> (Arc<Switch>, Ability, Service) {
        let switch = Arc::new(Switch::new(
            0,
            SwitchStatus::new(true).with_meter(readings),
            Arc::new(MemoryTransport::new()),
        ));
        let ability = Ability::new(PowerMeterAbility::new(Arc::clone(&switch) as _));
        let pa = PlatformAccessory::new("Plug", Uuid::nil());
        ability.setup(&pa, &Span::none()).unwrap();
        let service = ability.service().unwrap();
        (switch, ability, service)
    }

    #[test]
    fn voltage_appears_when_reported() {
        let (switch, _ability, service) = metered(PowerReadings {
            apower: Some(12.3),
            ..PowerReadings::default()
        });

        assert_eq!(
            service.value(CharacteristicType::CurrentConsumption),
            Some(CharacteristicValue::Float(12.3))
        );
        assert!(!service.has_characteristic(CharacteristicType::Voltage));

        switch.update_status(|s| s.meter.voltage = Some(230.0));

        assert_eq!(
            service.value(CharacteristicType::Voltage),
            Some(CharacteristicValue::Float(230.0))
        );
    }

    #[test]
    fn vanished_readings_are_removed() {
        let (switch, _ability, service) = metered(PowerReadings {
            apower: Some(5.0),
            current: Some(0.2),
            aenergy: Some(EnergyCounter { total: 2500.0 }),
            ..PowerReadings::default()
        });

        assert_eq!(
            service.value(CharacteristicType::TotalConsumption),
            Some(CharacteristicValue::Float(2.5))
        );

        switch.update_status(|s| s.meter.current = None);
        assert!(!service.has_characteristic(CharacteristicType::ElectricCurrent));
    }

    #[test]
    fn identity_uses_component_index() {
        let (_switch, _ability, service) = metered(PowerReadings::default());
        assert_eq!(service.name(), Some("Power Meter 1"));
        assert_eq!(service.subtype(), Some("power-meter-0"));
        assert_eq!(
            service.value(CharacteristicType::CurrentConsumption),
            Some(CharacteristicValue::Float(0.0))
        );
    }
}
