// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform configuration.
//!
//! Parsed from the platform block of the host configuration:
//!
//! ```
//! use shelly_homekit::config::{CoverType, PlatformOptions, SwitchType};
//! use shelly_homekit::device::DeviceId;
//!
//! let options = PlatformOptions::from_json(r#"{
//!     "platform": "Shelly",
//!     "mdns": { "interface": "eth0" },
//!     "devices": [
//!         { "id": "shellyplus2pm-a8032ab12345", "name": "Hallway",
//!           "switch:1": { "type": "Outlet" },
//!           "cover:0": { "type": "windowCovering" } }
//!     ]
//! }"#).unwrap();
//!
//! let device = options.device_options(&DeviceId::new("shellyplus2pm-a8032ab12345"));
//! assert_eq!(device.name.as_deref(), Some("Hallway"));
//! assert_eq!(device.component("switch:1").unwrap().switch_type(), SwitchType::Outlet);
//! assert_eq!(device.component("cover:0").unwrap().cover_type(), CoverType::WindowCovering);
//! assert!(options.mdns.enable);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::device::DeviceId;
use crate::error::Result;

/// Options for mDNS device discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdnsOptions {
    /// Whether discovery is enabled.
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Network interface to use; all interfaces if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for MdnsOptions {
    fn default() -> Self {
        Self {
            enable: true,
            interface: None,
        }
    }
}

/// Protocol used to talk to a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceProtocol {
    /// JSON-RPC over WebSocket.
    #[default]
    #[serde(rename = "websocket")]
    WebSocket,
}

/// How a switch component is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwitchType {
    /// A switch.
    #[default]
    Switch,
    /// A power outlet.
    Outlet,
}

impl SwitchType {
    /// Parses a configured type, case-insensitively. Unknown values map to
    /// the default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "outlet" => Self::Outlet,
            _ => Self::Switch,
        }
    }
}

/// How a cover component is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CoverType {
    /// A door.
    Door,
    /// A window.
    #[default]
    Window,
    /// Blinds or shades.
    WindowCovering,
}

impl CoverType {
    /// Parses a configured type, case-insensitively. Unknown values map to
    /// the default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "door" => Self::Door,
            "windowcovering" => Self::WindowCovering,
            _ => Self::Window,
        }
    }
}

/// Options for one component, keyed by `switch:N`, `cover:N` or `input:N`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentOptions {
    /// Hide the component.
    #[serde(default)]
    pub exclude: bool,
    /// Presentation type, interpreted per component kind.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Display name replacing the generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ComponentOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the component as excluded.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// Sets the presentation type.
    #[must_use]
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The type as a switch presentation.
    #[must_use]
    pub fn switch_type(&self) -> SwitchType {
        self.kind.as_deref().map(SwitchType::parse).unwrap_or_default()
    }

    /// The type as a cover presentation.
    #[must_use]
    pub fn cover_type(&self) -> CoverType {
        self.kind.as_deref().map(CoverType::parse).unwrap_or_default()
    }
}

/// Options for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOptions {
    /// Display name, replacing the model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ignore the device entirely.
    #[serde(default)]
    pub exclude: bool,
    /// Protocol to use.
    #[serde(default)]
    pub protocol: DeviceProtocol,
    /// Hostname or IP address, for devices that mDNS cannot find.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Per-component options.
    #[serde(flatten, deserialize_with = "component_map")]
    pub components: BTreeMap<String, ComponentOptions>,
}

/// Keeps only the `kind:N` keys of a device entry.
fn component_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, ComponentOptions>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
    entries
        .into_iter()
        .filter(|(key, _)| key.contains(':'))
        .map(|(key, value)| {
            ComponentOptions::deserialize(value)
                .map(|options| (key, options))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

impl DeviceOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the device as excluded.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// Sets the hostname.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Sets the options of one component.
    #[must_use]
    pub fn with_component(mut self, key: impl Into<String>, options: ComponentOptions) -> Self {
        self.components.insert(key.into(), options);
        self
    }

    /// The options of a component, if configured.
    #[must_use]
    pub fn component(&self, key: &str) -> Option<&ComponentOptions> {
        self.components.get(key)
    }
}

/// Platform-wide options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOptions {
    /// mDNS discovery options.
    pub mdns: MdnsOptions,
    devices: HashMap<DeviceId, DeviceOptions>,
}

#[derive(Deserialize)]
struct RawPlatformConfig {
    #[serde(default)]
    mdns: MdnsOptions,
    #[serde(default)]
    devices: Vec<Value>,
}

impl PlatformOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the platform configuration block.
    ///
    /// Device entries without an `id` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the block is malformed.
    pub fn from_value(config: &Value) -> Result<Self> {
        let raw = RawPlatformConfig::deserialize(config)?;

        let mut devices = HashMap::new();
        for entry in raw.devices {
            let Some(id) = entry.get("id").and_then(Value::as_str) else {
                continue;
            };
            let id = DeviceId::new(id);
            devices.insert(id, DeviceOptions::deserialize(&entry)?);
        }

        Ok(Self {
            mdns: raw.mdns,
            devices,
        })
    }

    /// Parses the platform configuration block from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Sets the mDNS options.
    #[must_use]
    pub fn with_mdns(mut self, mdns: MdnsOptions) -> Self {
        self.mdns = mdns;
        self
    }

    /// Sets the options of one device.
    #[must_use]
    pub fn with_device(mut self, id: impl Into<DeviceId>, options: DeviceOptions) -> Self {
        self.devices.insert(id.into(), options);
        self
    }

    /// The options of a device; defaults if it is not configured.
    #[must_use]
    pub fn device_options(&self, id: &DeviceId) -> DeviceOptions {
        self.devices.get(id).cloned().unwrap_or_default()
    }

    /// Returns true if the device is configured as excluded.
    #[must_use]
    pub fn is_excluded(&self, id: &DeviceId) -> bool {
        self.devices.get(id).is_some_and(|d| d.exclude)
    }

    /// IDs of all excluded devices.
    pub fn excluded_devices(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices
            .iter()
            .filter(|(_, options)| options.exclude)
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_for_unknown_device() {
        let options = PlatformOptions::new();
        let device = options.device_options(&DeviceId::new("unknown"));
        assert_eq!(device, DeviceOptions::default());
        assert_eq!(device.protocol, DeviceProtocol::WebSocket);
        assert!(options.mdns.enable);
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let options = PlatformOptions::from_value(&json!({
            "devices": [
                { "name": "orphan" },
                { "id": "a", "exclude": true }
            ]
        }))
        .unwrap();

        assert!(options.is_excluded(&DeviceId::new("a")));
        assert_eq!(options.excluded_devices().count(), 1);
    }

    #[test]
    fn types_are_case_insensitive_with_fallback() {
        assert_eq!(SwitchType::parse("OUTLET"), SwitchType::Outlet);
        assert_eq!(SwitchType::parse("lamp"), SwitchType::Switch);
        assert_eq!(CoverType::parse("Door"), CoverType::Door);
        assert_eq!(CoverType::parse("WindowCovering"), CoverType::WindowCovering);
        assert_eq!(CoverType::parse("garage"), CoverType::Window);
        assert_eq!(ComponentOptions::new().cover_type(), CoverType::Window);
    }

    #[test]
    fn component_options_parse() {
        let options = PlatformOptions::from_value(&json!({
            "mdns": { "enable": false },
            "devices": [{
                "id": "dev",
                "hostname": "192.168.1.20",
                "switch:0": { "exclude": true, "name": "Pump" }
            }]
        }))
        .unwrap();

        let device = options.device_options(&DeviceId::new("dev"));
        let switch = device.component("switch:0").unwrap();
        assert!(switch.exclude);
        assert_eq!(switch.name.as_deref(), Some("Pump"));
        assert_eq!(device.hostname.as_deref(), Some("192.168.1.20"));
        assert_eq!(device.components.len(), 1);
        assert!(!options.mdns.enable);
    }

    #[test]
    fn malformed_component_is_an_error() {
        let result = PlatformOptions::from_value(&json!({
            "devices": [{ "id": "dev", "switch:0": { "exclude": "yes" } }]
        }));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn builder_matches_parsed() {
        let built = DeviceOptions::new()
            .with_name("Hallway")
            .with_component("cover:0", ComponentOptions::new().with_type("door"));
        let parsed: DeviceOptions = serde_json::from_value(json!({
            "name": "Hallway",
            "cover:0": { "type": "door" }
        }))
        .unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn connection_options_parse() {
        let parsed = PlatformOptions::from_value(&json!({
            "mdns": { "enable": false, "interface": "eth0" },
            "devices": [{
                "id": "shellyplus1-a1",
                "protocol": "websocket",
                "hostname": "192.168.1.20"
            }]
        }))
        .unwrap();

        let built = PlatformOptions::new()
            .with_mdns(MdnsOptions {
                enable: false,
                interface: Some("eth0".into()),
            })
            .with_device(
                "shellyplus1-a1",
                DeviceOptions::new().with_hostname("192.168.1.20"),
            );
        assert_eq!(parsed, built);
        assert_eq!(
            parsed.device_options(&"shellyplus1-a1".into()).protocol,
            DeviceProtocol::WebSocket
        );
        assert!(PlatformOptions::new().mdns.enable);
    }
}
