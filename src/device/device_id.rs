// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a Shelly device, e.g. `shellyplus2pm-a8032ab12345`.
///
/// This is a distinct type so that device IDs are not confused with
/// accessory IDs or UUIDs.
///
/// # Examples
///
/// ```
/// use shelly_homekit::device::DeviceId;
///
/// let id = DeviceId::new("shellyplus1-441793a1b2c3");
/// assert_eq!(id.as_str(), "shellyplus1-441793a1b2c3");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality() {
        assert_eq!(DeviceId::new("a"), DeviceId::from("a"));
        assert_ne!(DeviceId::new("a"), DeviceId::new("b"));
    }

    #[test]
    fn debug_format() {
        let id = DeviceId::new("shellypro3-ab12");
        assert_eq!(format!("{id:?}"), "DeviceId(shellypro3-ab12)");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DeviceId::new("shellypro3-ab12");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"shellypro3-ab12\"");
        let back: DeviceId = serde_json::from_str("\"shellypro3-ab12\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(DeviceId::new("x"));
        assert!(set.contains(&DeviceId::new("x")));
    }
}
