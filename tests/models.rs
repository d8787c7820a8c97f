// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the built-in device models.

use std::sync::Arc;

use serde_json::json;
use shelly_homekit::config::PlatformOptions;
use shelly_homekit::device::{Device, InputType, SwitchStatus};
use shelly_homekit::hap::{CharacteristicType, CharacteristicValue, ServiceType};
use shelly_homekit::host::{HostApi, InMemoryHost};
use shelly_homekit::{DelegateRegistry, DeviceId, Platform};

fn platform(options: PlatformOptions) -> (Arc<InMemoryHost>, Platform) {
    let host = Arc::new(InMemoryHost::new());
    let platform = Platform::new(
        Arc::clone(&host) as Arc<dyn HostApi>,
        options,
        DelegateRegistry::with_builtin_models().unwrap(),
    );
    (host, platform)
}

fn published_names(host: &InMemoryHost) -> Vec<String> {
    let mut names: Vec<_> = host
        .published()
        .iter()
        .map(|pa| pa.display_name().to_string())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Plus I4
// ============================================================================

mod plus_i4 {
    use super::*;

    fn plus_i4() -> Arc<Device> {
        Device::builder("shellyplusi4-c4d8d5", "SNSN-0024X")
            .model_name("Shelly Plus I4")
            .input(InputType::Button, None)
            .input(InputType::Switch, Some(true))
            .input(InputType::Switch, Some(false))
            .input(InputType::Switch, None)
            .build()
    }

    #[test]
    fn buttons_and_switches_are_split() {
        let (host, mut platform) = platform(PlatformOptions::new());
        platform.add_device(plus_i4()).unwrap();
        platform.run_pending();

        assert_eq!(
            published_names(&host),
            vec![
                "Shelly Plus I4",
                "Shelly Plus I4 Input 2",
                "Shelly Plus I4 Input 3",
                "Shelly Plus I4 Input 4",
            ]
        );

        let buttons = host
            .published()
            .into_iter()
            .find(|pa| pa.display_name() == "Shelly Plus I4")
            .unwrap();
        let switches: Vec<_> = buttons
            .services()
            .into_iter()
            .filter(|s| s.kind() == ServiceType::StatelessProgrammableSwitch)
            .collect();
        assert_eq!(switches.len(), 1);
        assert_eq!(
            switches[0].value(CharacteristicType::ServiceLabelIndex),
            Some(CharacteristicValue::Int(1))
        );
        assert!(buttons.service(ServiceType::ServiceLabel).is_some());
    }

    #[test]
    fn button_press_is_forwarded() {
        let (host, mut platform) = platform(PlatformOptions::new());
        let device = plus_i4();
        platform.add_device(Arc::clone(&device)).unwrap();
        platform.run_pending();

        let event = host
            .published()
            .into_iter()
            .find(|pa| pa.display_name() == "Shelly Plus I4")
            .unwrap()
            .service(ServiceType::StatelessProgrammableSwitch)
            .unwrap()
            .characteristic(CharacteristicType::ProgrammableSwitchEvent);
        let mut rx = event.subscribe();

        device
            .handle_notify_event(&json!({
                "ts": 1_700_000_000.0,
                "events": [{ "component": "input:0", "id": 0, "event": "double_push" }]
            }))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().as_i64(), Some(1));
    }

    #[test]
    fn input_type_change_moves_input_between_accessories() {
        let (host, mut platform) = platform(PlatformOptions::new());
        let device = plus_i4();
        platform.add_device(Arc::clone(&device)).unwrap();
        platform.run_pending();

        // the only button becomes a switch: the buttons accessory goes away
        assert!(device.set_input_type(0, InputType::Switch));
        platform.run_pending();
        assert_eq!(
            published_names(&host),
            vec![
                "Shelly Plus I4 Input 1",
                "Shelly Plus I4 Input 2",
                "Shelly Plus I4 Input 3",
                "Shelly Plus I4 Input 4",
            ]
        );

        device.set_input_type(2, InputType::Button);
        platform.run_pending();

        let delegate = platform
            .delegate(&DeviceId::new("shellyplusi4-c4d8d5"))
            .unwrap();
        let buttons = delegate.accessory("buttons").unwrap();
        assert!(buttons.is_active());
        assert!(buttons.find_ability("stateless-programmable-switch-2").unwrap().is_active());
        assert!(!buttons.find_ability("stateless-programmable-switch-0").unwrap().is_active());
        assert!(!delegate.accessory("switch2").unwrap().is_active());
        assert_eq!(host.published().len(), 4);
    }
}

// ============================================================================
// Relay models
// ============================================================================

mod relays {
    use super::*;
    use shelly_homekit::config::{ComponentOptions, DeviceOptions};

    #[test]
    fn single_switch_devices_have_no_suffix() {
        let (host, mut platform) = platform(PlatformOptions::new());
        let device = Device::builder("shellyplusplugus-a1", "SNPL-00116US")
            .model_name("Shelly Plus Plug US")
            .switch(SwitchStatus::new(true))
            .build();
        platform.add_device(device).unwrap();
        platform.run_pending();

        assert_eq!(published_names(&host), vec!["Shelly Plus Plug US"]);
        let pa = &host.published()[0];
        assert!(pa.service(ServiceType::PowerMeter).is_none());
        assert_eq!(
            pa.service(ServiceType::Switch)
                .unwrap()
                .value(CharacteristicType::On),
            Some(CharacteristicValue::Bool(true))
        );
    }

    #[test]
    fn component_options_apply_per_channel() {
        let options = PlatformOptions::new().with_device(
            "shellypro4pm-a1",
            DeviceOptions::new()
                .with_component("switch:0", ComponentOptions::new().with_type("Outlet"))
                .with_component("switch:1", ComponentOptions::new().with_name("Heater"))
                .with_component("switch:3", ComponentOptions::new().excluded()),
        );
        let (host, mut platform) = platform(options);
        let device = Device::builder("shellypro4pm-a1", "SPSW-004PE16EU")
            .model_name("Shelly Pro 4PM")
            .switch(SwitchStatus::new(false))
            .switch(SwitchStatus::new(false))
            .switch(SwitchStatus::new(false))
            .switch(SwitchStatus::new(false))
            .build();
        platform.add_device(device).unwrap();
        platform.run_pending();

        assert_eq!(
            published_names(&host),
            vec!["Heater", "Shelly Pro 4PM Switch 1", "Shelly Pro 4PM Switch 3"]
        );
        let outlet = host
            .published()
            .into_iter()
            .find(|pa| pa.display_name() == "Shelly Pro 4PM Switch 1")
            .unwrap();
        assert!(outlet.service(ServiceType::Outlet).is_some());
        assert!(outlet.service(ServiceType::Switch).is_none());
    }

    #[test]
    fn excluded_devices_are_ignored() {
        let options = PlatformOptions::from_value(&json!({
            "devices": [{ "id": "shellyplus1-a1", "exclude": true }]
        }))
        .unwrap();
        let (host, mut platform) = platform(options);
        let device = Device::builder("shellyplus1-a1", "SNSW-001X16EU")
            .switch(SwitchStatus::new(false))
            .build();

        assert!(!platform.add_device(device).unwrap());
        platform.run_pending();
        assert!(host.published().is_empty());
    }
}
