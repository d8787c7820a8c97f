// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and component event types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A component property that can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Switch output (on/off).
    Output,
    /// Active power in watts.
    Apower,
    /// Voltage in volts.
    Voltage,
    /// Current in amperes.
    Current,
    /// Energy counter.
    Aenergy,
    /// Cover movement state.
    State,
    /// Cover current position.
    CurrentPos,
    /// Cover target position.
    TargetPos,
    /// Cover calibration flag.
    PosControl,
    /// Digital input state.
    InputState,
}

/// Kind of button press reported by an input in button mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonPress {
    /// A single short press.
    Single,
    /// Two short presses.
    Double,
    /// A long press.
    Long,
}

impl ButtonPress {
    /// Parses a Shelly event name (`single_push`, `double_push`, `long_push`).
    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "single_push" => Some(Self::Single),
            "double_push" => Some(Self::Double),
            "long_push" => Some(Self::Long),
            _ => None,
        }
    }
}

/// Event emitted by a device component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentEvent {
    /// A property changed; read the new value from the component.
    Changed(Property),
    /// A button was pressed.
    Push(ButtonPress),
}

/// Event emitted by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A connection to the device was established.
    Connected,
    /// The connection was closed or could not be established.
    Disconnected {
        /// Close code.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
        /// Delay before the next reconnection attempt, if one is scheduled.
        reconnect_in: Option<Duration>,
    },
    /// An RPC request was sent to the device.
    Request {
        /// The RPC method name.
        method: String,
    },
    /// The device configuration changed (profile, input types).
    ConfigChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_press_from_event_name() {
        assert_eq!(ButtonPress::from_event_name("single_push"), Some(ButtonPress::Single));
        assert_eq!(ButtonPress::from_event_name("double_push"), Some(ButtonPress::Double));
        assert_eq!(ButtonPress::from_event_name("long_push"), Some(ButtonPress::Long));
        assert_eq!(ButtonPress::from_event_name("btn_down"), None);
    }
}
