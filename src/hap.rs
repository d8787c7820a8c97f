// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HomeKit Accessory Protocol vocabulary.
//!
//! Service and characteristic types used by this crate, their UUIDs and
//! default permissions. Standard types use the Apple base UUID
//! `0000XXXX-0000-1000-8000-0026BB765291`; the power meter types are the
//! Eve/Elgato custom ones understood by third-party HomeKit apps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const fn apple(short: u32) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_1000_8000_0026_BB76_5291)
}

/// Values of the `PositionState` characteristic.
pub mod position_state {
    /// The cover is closing.
    pub const DECREASING: i64 = 0;
    /// The cover is opening.
    pub const INCREASING: i64 = 1;
    /// The cover is not moving.
    pub const STOPPED: i64 = 2;
}

/// Values of the `ProgrammableSwitchEvent` characteristic.
pub mod programmable_switch_event {
    /// A single press.
    pub const SINGLE_PRESS: i64 = 0;
    /// A double press.
    pub const DOUBLE_PRESS: i64 = 1;
    /// A long press.
    pub const LONG_PRESS: i64 = 2;
}

/// Values of the `ServiceLabelNamespace` characteristic.
pub mod service_label_namespace {
    /// Buttons are labelled with dots.
    pub const DOTS: i64 = 0;
    /// Buttons are labelled with numbers.
    pub const ARABIC_NUMERALS: i64 = 1;
}

/// A HomeKit service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Accessory information (name, manufacturer, model, ...).
    AccessoryInformation,
    /// A switch.
    Switch,
    /// A power outlet.
    Outlet,
    /// A door.
    Door,
    /// A window.
    Window,
    /// Blinds, shades and similar.
    WindowCovering,
    /// A button that only reports presses.
    StatelessProgrammableSwitch,
    /// Groups the buttons of a multi-button accessory.
    ServiceLabel,
    /// Power meter readings (custom).
    PowerMeter,
}

impl ServiceType {
    /// The service UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::AccessoryInformation => apple(0x3E),
            Self::Switch => apple(0x49),
            Self::Outlet => apple(0x47),
            Self::Door => apple(0x81),
            Self::Window => apple(0x8B),
            Self::WindowCovering => apple(0x8C),
            Self::StatelessProgrammableSwitch => apple(0x89),
            Self::ServiceLabel => apple(0xCC),
            Self::PowerMeter => Uuid::from_u128(0xDEDB_EA44_11ED_429C_BD75_9A22_86AA_8707),
        }
    }

    /// The display name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AccessoryInformation => "Accessory Information",
            Self::Switch => "Switch",
            Self::Outlet => "Outlet",
            Self::Door => "Door",
            Self::Window => "Window",
            Self::WindowCovering => "Window Covering",
            Self::StatelessProgrammableSwitch => "Stateless Programmable Switch",
            Self::ServiceLabel => "Service Label",
            Self::PowerMeter => "Power Meter",
        }
    }
}

/// Access permission of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perm {
    /// Readable by paired controllers.
    PairedRead,
    /// Writable by paired controllers.
    PairedWrite,
    /// Controllers may subscribe to changes.
    Notify,
}

/// Value format of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `true`/`false`.
    Bool,
    /// Integer.
    Int,
    /// Floating point number.
    Float,
    /// UTF-8 string.
    String,
}

/// A HomeKit characteristic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicType {
    /// Display name.
    Name,
    /// Manufacturer.
    Manufacturer,
    /// Model.
    Model,
    /// Serial number.
    SerialNumber,
    /// Firmware revision.
    FirmwareRevision,
    /// On/off state.
    On,
    /// Whether a load is drawing power from an outlet.
    OutletInUse,
    /// Direction of a moving cover.
    PositionState,
    /// Current cover position in percent.
    CurrentPosition,
    /// Target cover position in percent.
    TargetPosition,
    /// Button press event.
    ProgrammableSwitchEvent,
    /// Index of a button within a labelled group.
    ServiceLabelIndex,
    /// Labelling scheme of a button group.
    ServiceLabelNamespace,
    /// Active power in watts (custom).
    CurrentConsumption,
    /// Voltage in volts (custom).
    Voltage,
    /// Current in amperes (custom).
    ElectricCurrent,
    /// Energy consumed in kWh (custom).
    TotalConsumption,
}

impl CharacteristicType {
    /// The characteristic UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Name => apple(0x23),
            Self::Manufacturer => apple(0x20),
            Self::Model => apple(0x21),
            Self::SerialNumber => apple(0x30),
            Self::FirmwareRevision => apple(0x52),
            Self::On => apple(0x25),
            Self::OutletInUse => apple(0x26),
            Self::PositionState => apple(0x72),
            Self::CurrentPosition => apple(0x6D),
            Self::TargetPosition => apple(0x7C),
            Self::ProgrammableSwitchEvent => apple(0x73),
            Self::ServiceLabelIndex => apple(0xCB),
            Self::ServiceLabelNamespace => apple(0xCD),
            Self::CurrentConsumption => Uuid::from_u128(0xE863_F10D_079E_48FF_8F27_9C26_05A2_9F52),
            Self::Voltage => Uuid::from_u128(0xE863_F10A_079E_48FF_8F27_9C26_05A2_9F52),
            Self::ElectricCurrent => Uuid::from_u128(0xE863_F126_079E_48FF_8F27_9C26_05A2_9F52),
            Self::TotalConsumption => Uuid::from_u128(0xE863_F10C_079E_48FF_8F27_9C26_05A2_9F52),
        }
    }

    /// The value format.
    #[must_use]
    pub const fn format(self) -> Format {
        match self {
            Self::Name
            | Self::Manufacturer
            | Self::Model
            | Self::SerialNumber
            | Self::FirmwareRevision => Format::String,
            Self::On | Self::OutletInUse => Format::Bool,
            Self::PositionState
            | Self::CurrentPosition
            | Self::TargetPosition
            | Self::ProgrammableSwitchEvent
            | Self::ServiceLabelIndex
            | Self::ServiceLabelNamespace => Format::Int,
            Self::CurrentConsumption
            | Self::Voltage
            | Self::ElectricCurrent
            | Self::TotalConsumption => Format::Float,
        }
    }

    /// Permissions a new characteristic of this type starts with.
    #[must_use]
    pub const fn default_perms(self) -> &'static [Perm] {
        match self {
            Self::On | Self::TargetPosition => &[Perm::PairedRead, Perm::PairedWrite, Perm::Notify],
            Self::Name
            | Self::Manufacturer
            | Self::Model
            | Self::SerialNumber
            | Self::FirmwareRevision
            | Self::ServiceLabelIndex
            | Self::ServiceLabelNamespace => &[Perm::PairedRead],
            Self::ProgrammableSwitchEvent => &[Perm::PairedRead, Perm::Notify],
            Self::OutletInUse
            | Self::PositionState
            | Self::CurrentPosition
            | Self::CurrentConsumption
            | Self::Voltage
            | Self::ElectricCurrent
            | Self::TotalConsumption => &[Perm::PairedRead, Perm::Notify],
        }
    }

    /// The value a new characteristic of this type starts with.
    #[must_use]
    pub fn default_value(self) -> CharacteristicValue {
        match self.format() {
            Format::Bool => CharacteristicValue::Bool(false),
            Format::Int => match self {
                Self::PositionState => CharacteristicValue::Int(position_state::STOPPED),
                Self::ServiceLabelIndex => CharacteristicValue::Int(1),
                _ => CharacteristicValue::Int(0),
            },
            Format::Float => CharacteristicValue::Float(0.0),
            Format::String => CharacteristicValue::String(String::new()),
        }
    }
}

/// A characteristic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl CharacteristicValue {
    /// Returns the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float; integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true if the value can be stored in a characteristic of `format`.
    #[must_use]
    pub fn matches(&self, format: Format) -> bool {
        matches!(
            (self, format),
            (Self::Bool(_), Format::Bool)
                | (Self::Int(_), Format::Int | Format::Float)
                | (Self::Float(_), Format::Float)
                | (Self::String(_), Format::String)
        )
    }
}

impl From<bool> for CharacteristicValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for CharacteristicValue {
    fn from(v: u8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for CharacteristicValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CharacteristicValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for CharacteristicValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_uuids_use_apple_base() {
        assert_eq!(
            ServiceType::Switch.uuid().to_string(),
            "00000049-0000-1000-8000-0026bb765291"
        );
        assert_eq!(
            CharacteristicType::TargetPosition.uuid().to_string(),
            "0000007c-0000-1000-8000-0026bb765291"
        );
    }

    #[test]
    fn custom_uuids() {
        assert_eq!(
            ServiceType::PowerMeter.uuid().to_string().to_uppercase(),
            "DEDBEA44-11ED-429C-BD75-9A2286AA8707"
        );
        assert_eq!(
            CharacteristicType::TotalConsumption.uuid().to_string().to_uppercase(),
            "E863F10C-079E-48FF-8F27-9C2605A29F52"
        );
    }

    #[test]
    fn value_format_matching() {
        assert!(CharacteristicValue::Bool(true).matches(Format::Bool));
        assert!(CharacteristicValue::Int(3).matches(Format::Float));
        assert!(!CharacteristicValue::Float(1.5).matches(Format::Int));
        assert!(!CharacteristicValue::from("x").matches(Format::Bool));
    }

    #[test]
    fn defaults() {
        assert_eq!(
            CharacteristicType::PositionState.default_value(),
            CharacteristicValue::Int(position_state::STOPPED)
        );
        assert!(!CharacteristicType::On.default_perms().is_empty());
    }
}
