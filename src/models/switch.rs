// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain relay devices.

use crate::delegate::{AddSwitchOptions, DeviceDelegate, DeviceModel};
use crate::error::Result;

use super::missing;

/// Devices with exactly one switch, e.g. the Plus 1 or the Pro 1 PM.
///
/// The accessory is called `switch` and carries no name suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSwitch;

impl DeviceModel for SingleSwitch {
    fn setup(&self, delegate: &DeviceDelegate) -> Result<()> {
        let switch = delegate
            .device()
            .switch(0)
            .ok_or_else(|| missing(delegate, "switch:0".into()))?;
        delegate.add_switch(switch, AddSwitchOptions::single())?;
        Ok(())
    }
}

/// Devices with several switches, one accessory each.
#[derive(Debug, Clone, Copy)]
pub struct MultiSwitch {
    channels: u8,
}

impl MultiSwitch {
    /// Wires switches `0..channels`.
    #[must_use]
    pub const fn new(channels: u8) -> Self {
        Self { channels }
    }

    /// Number of switches.
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }
}

impl DeviceModel for MultiSwitch {
    fn setup(&self, delegate: &DeviceDelegate) -> Result<()> {
        for id in 0..self.channels {
            let switch = delegate
                .device()
                .switch(id)
                .ok_or_else(|| missing(delegate, format!("switch:{id}")))?;
            delegate.add_switch(switch, AddSwitchOptions::default())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::DeviceOptions;
    use crate::device::{Device, SwitchStatus};
    use crate::error::Error;
    use crate::host::{HostApi, InMemoryHost};
    use crate::platform::PlatformHandle;

    fn handle() -> PlatformHandle {
        PlatformHandle::new(Arc::new(InMemoryHost::new()) as Arc<dyn HostApi>)
    }

    #[test]
    fn single_switch_has_no_suffix() {
        let device = Device::builder("shellyplus1-a1", "SNSW-001X16EU")
            .model_name("Shelly Plus 1")
            .switch(SwitchStatus::new(true))
            .build();

        let delegate =
            DeviceDelegate::new(device, DeviceOptions::new(), handle(), Arc::new(SingleSwitch)).unwrap();

        let accessory = delegate.accessory("switch").unwrap();
        assert_eq!(accessory.name(), "Shelly Plus 1");
        assert_eq!(delegate.accessories().len(), 1);
    }

    #[test]
    fn multi_switch_requires_every_channel() {
        let device = Device::builder("shellypro3-a1", "SPSW-003XE16EU")
            .switch(SwitchStatus::new(false))
            .switch(SwitchStatus::new(false))
            .build();

        let err = DeviceDelegate::new(device, DeviceOptions::new(), handle(), Arc::new(MultiSwitch::new(3)))
            .unwrap_err();

        assert!(matches!(err, Error::MissingComponent { ref component, .. } if component == "switch:2"));
    }
}
