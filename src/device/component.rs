// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power telemetry shared by switch and cover components.

use serde::{Deserialize, Deserializer, Serialize};

use super::{ComponentEvent, Property};
use crate::subscription::Subscription;

/// Boxed callback for component events.
pub type ComponentCallback = Box<dyn Fn(&ComponentEvent) + Send + Sync>;

/// Energy counter reported by metering components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyCounter {
    /// Total energy consumed, in watt-hours.
    pub total: f64,
}

/// Power readings of a metering component.
///
/// Every field is optional: a component only reports what its hardware
/// measures, and a reading may disappear at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerReadings {
    /// Active power in watts.
    pub apower: Option<f64>,
    /// Voltage in volts.
    pub voltage: Option<f64>,
    /// Current in amperes.
    pub current: Option<f64>,
    /// Energy counter.
    pub aenergy: Option<EnergyCounter>,
}

impl PowerReadings {
    /// Returns true if any power telemetry is available.
    #[must_use]
    pub fn is_metered(&self) -> bool {
        self.apower.is_some()
    }

    pub(crate) fn diff(&self, other: &Self, out: &mut Vec<Property>) {
        if self.apower != other.apower {
            out.push(Property::Apower);
        }
        if self.voltage != other.voltage {
            out.push(Property::Voltage);
        }
        if self.current != other.current {
            out.push(Property::Current);
        }
        if self.aenergy != other.aenergy {
            out.push(Property::Aenergy);
        }
    }
}

/// A component that reports power telemetry.
pub trait MeteredComponent: Send + Sync {
    /// The component index.
    fn id(&self) -> u8;

    /// The current power readings.
    fn readings(&self) -> PowerReadings;

    /// Subscribes to the component's events.
    fn subscribe_events(&self, callback: ComponentCallback) -> Subscription;
}

/// Partial update of [`PowerReadings`] from a status notification.
///
/// `null` clears a reading, an absent key leaves it untouched.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MeterPatch {
    #[serde(default, deserialize_with = "nullable")]
    apower: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    voltage: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    current: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    aenergy: Option<Option<EnergyCounter>>,
}

impl MeterPatch {
    pub(crate) fn apply(self, readings: &mut PowerReadings) {
        if let Some(v) = self.apower {
            readings.apower = v;
        }
        if let Some(v) = self.voltage {
            readings.voltage = v;
        }
        if let Some(v) = self.current {
            readings.current = v;
        }
        if let Some(v) = self.aenergy {
            readings.aenergy = v;
        }
    }
}

/// Distinguishes a `null` value from a missing key.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
