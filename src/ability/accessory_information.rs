// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{AbilityContext, Bindings, Capability, Sealed};
use crate::device::DeviceInfo;
use crate::error::AbilityError;
use crate::hap::{CharacteristicType, ServiceType};

const MANUFACTURER: &str = "Allterco";
const DEFAULT_FIRMWARE: &str = "1.0.0";

/// Publishes name, manufacturer, model, serial number and firmware.
#[derive(Debug)]
pub struct AccessoryInformationAbility {
    info: DeviceInfo,
}

impl AccessoryInformationAbility {
    /// Creates the ability from the device identity.
    #[must_use]
    pub fn new(info: DeviceInfo) -> Self {
        Self { info }
    }
}

impl Sealed for AccessoryInformationAbility {}

impl Capability for AccessoryInformationAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::AccessoryInformation
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let firmware = self
            .info
            .firmware_version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_FIRMWARE);

        ctx.service
            .set_characteristic(CharacteristicType::Name, ctx.accessory.display_name())
            .set_characteristic(CharacteristicType::Manufacturer, MANUFACTURER)
            .set_characteristic(CharacteristicType::Model, self.info.model_name.as_str())
            .set_characteristic(CharacteristicType::SerialNumber, self.info.mac_address.as_str())
            .set_characteristic(CharacteristicType::FirmwareRevision, firmware);

        Ok(Bindings::new())
    }
}
