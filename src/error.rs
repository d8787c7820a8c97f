// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `shelly_homekit` library.
//!
//! The hierarchy separates the failures that stay local to one ability or
//! accessory (device communication, ability faults) from the wiring errors
//! that are meant to fail fast (duplicate accessory IDs, duplicate model
//! registrations).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A delegate tried to create two accessories with the same local ID.
    #[error("an accessory with ID '{id}' already exists")]
    DuplicateAccessory {
        /// The offending accessory ID.
        id: String,
    },

    /// Error raised by the delegate registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Error raised while setting up or tearing down an ability.
    #[error("ability error: {0}")]
    Ability(#[from] AbilityError),

    /// Error raised while talking to a device.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The platform configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A device component the model relies on is missing.
    #[error("device {device} has no component '{component}'")]
    MissingComponent {
        /// The device ID.
        device: String,
        /// The component key, e.g. `switch:1`.
        component: String,
    },
}

/// Errors raised when registering device models.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A delegate has already been registered for this model.
    #[error("a device delegate for {model} has already been registered")]
    DuplicateModel {
        /// The model identifier as it was passed to the registry.
        model: String,
    },
}

/// Errors raised by an individual ability.
///
/// These never escape the owning accessory; they are logged and the
/// remaining abilities carry on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbilityError {
    /// The ability was used before `setup()` was called.
    #[error("ability has not yet been setup")]
    NotSetUp,

    /// The bound component is in a state the ability cannot represent.
    #[error("component error: {0}")]
    Component(String),
}

/// Errors returned by device commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The device could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The device did not answer in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device answered with an RPC error.
    #[error("command rejected ({code}): {message}")]
    Rejected {
        /// RPC error code.
        code: i32,
        /// RPC error message.
        message: String,
    },

    /// There is no open connection to the device.
    #[error("device is not connected")]
    NotConnected,
}

/// Status codes reported back to the HomeKit host for a failed write.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HapStatus {
    /// The accessory could not talk to the device.
    #[error("service communication failure")]
    ServiceCommunicationFailure,

    /// The characteristic does not accept writes.
    #[error("characteristic is read only")]
    ReadOnlyCharacteristic,

    /// The written value has the wrong type or range.
    #[error("invalid value in request")]
    InvalidValueInRequest,
}

impl HapStatus {
    /// Returns the numeric HAP status code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ServiceCommunicationFailure => -70402,
            Self::ReadOnlyCharacteristic => -70404,
            Self::InvalidValueInRequest => -70410,
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_accessory_display() {
        let err = Error::DuplicateAccessory {
            id: "switch".to_string(),
        };
        assert_eq!(err.to_string(), "an accessory with ID 'switch' already exists");
    }

    #[test]
    fn error_from_registry_error() {
        let err: Error = RegistryError::DuplicateModel {
            model: "SNSW-001X16EU".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::DuplicateModel { .. })
        ));
    }

    #[test]
    fn command_error_display() {
        let err = CommandError::Rejected {
            code: -103,
            message: "Invalid argument".to_string(),
        };
        assert_eq!(err.to_string(), "command rejected (-103): Invalid argument");
    }

    #[test]
    fn hap_status_codes() {
        assert_eq!(HapStatus::ServiceCommunicationFailure.code(), -70402);
        assert_eq!(HapStatus::ReadOnlyCharacteristic.code(), -70404);
        assert_eq!(HapStatus::InvalidValueInRequest.code(), -70410);
    }
}
