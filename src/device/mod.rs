// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelly Gen2 device model.
//!
//! A [`Device`] is a passive data holder fed by a transport: the transport
//! reports connectivity with [`Device::handle_connect`] and
//! [`Device::handle_disconnect`], and forwards `NotifyStatus` /
//! `NotifyEvent` payloads to [`Device::apply_notify_status`] and
//! [`Device::handle_notify_event`]. Components emit one
//! [`ComponentEvent`] per changed property; commands go back to the device
//! through an [`RpcTransport`].
//!
//! ```
//! use std::sync::Arc;
//! use shelly_homekit::device::{Device, MemoryTransport, SwitchStatus};
//!
//! let transport = Arc::new(MemoryTransport::new());
//! let device = Device::builder("shellyplus1-441793a1b2c3", "SNSW-001X16EU")
//!     .model_name("Shelly Plus 1")
//!     .transport(transport)
//!     .switch(SwitchStatus::new(false))
//!     .build();
//!
//! device
//!     .apply_notify_status(&serde_json::json!({ "switch:0": { "output": true } }))
//!     .unwrap();
//! assert!(device.switch(0).unwrap().output());
//! ```

mod component;
mod cover;
mod device_id;
mod event;
mod input;
mod switch;
mod transport;

pub use component::{ComponentCallback, EnergyCounter, MeteredComponent, PowerReadings};
pub use cover::{Cover, CoverState, CoverStatus};
pub use device_id::DeviceId;
pub use event::{ButtonPress, ComponentEvent, DeviceEvent, Property};
pub use input::{Input, InputType};
pub use switch::{Switch, SwitchStatus};
pub use transport::{DisconnectedTransport, MemoryTransport, RpcCall, RpcTransport};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

use crate::subscription::{EventSource, Subscription};

/// Static identity of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device ID.
    pub id: DeviceId,
    /// Model identifier, e.g. `SNSW-002P16EU`.
    pub model: String,
    /// Human readable model name, e.g. `Shelly Plus 2 PM`.
    pub model_name: String,
    /// MAC address, used as the serial number.
    pub mac_address: String,
    /// Firmware version, if reported.
    pub firmware_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotifyEvent {
    #[serde(default)]
    events: Vec<ComponentNotification>,
}

#[derive(Debug, Deserialize)]
struct ComponentNotification {
    component: String,
    event: String,
}

/// A Shelly device and its components.
pub struct Device {
    info: DeviceInfo,
    profile: RwLock<Option<String>>,
    connected: AtomicBool,
    events: Arc<EventSource<DeviceEvent>>,
    switches: Vec<Arc<Switch>>,
    covers: Vec<Arc<Cover>>,
    inputs: Vec<Arc<Input>>,
}

impl Device {
    /// Starts building a device.
    #[must_use]
    pub fn builder(id: impl Into<DeviceId>, model: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::new(id.into(), model.into())
    }

    /// Static identity.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Device ID.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.info.id
    }

    /// Model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.info.model
    }

    /// Human readable model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.info.model_name
    }

    /// Active profile (`switch` or `cover`) on multi-profile devices.
    #[must_use]
    pub fn profile(&self) -> Option<String> {
        self.profile.read().clone()
    }

    /// Whether the transport currently has an open connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Switch component `switch:<id>`.
    #[must_use]
    pub fn switch(&self, id: u8) -> Option<&Arc<Switch>> {
        self.switches.iter().find(|s| s.id() == id)
    }

    /// Cover component `cover:<id>`.
    #[must_use]
    pub fn cover(&self, id: u8) -> Option<&Arc<Cover>> {
        self.covers.iter().find(|c| c.id() == id)
    }

    /// Input component `input:<id>`.
    #[must_use]
    pub fn input(&self, id: u8) -> Option<&Arc<Input>> {
        self.inputs.iter().find(|i| i.id() == id)
    }

    /// All switch components.
    #[must_use]
    pub fn switches(&self) -> &[Arc<Switch>] {
        &self.switches
    }

    /// All cover components.
    #[must_use]
    pub fn covers(&self) -> &[Arc<Cover>] {
        &self.covers
    }

    /// All input components.
    #[must_use]
    pub fn inputs(&self) -> &[Arc<Input>] {
        &self.inputs
    }

    /// Subscribes to connectivity and configuration events.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        EventSource::subscribe(&self.events, callback)
    }

    /// Records that a connection was established.
    pub fn handle_connect(&self) {
        self.connected.store(true, Ordering::Release);
        self.events.dispatch(&DeviceEvent::Connected);
    }

    /// Records that the connection was closed or could not be opened.
    pub fn handle_disconnect(
        &self,
        code: u16,
        reason: impl Into<String>,
        reconnect_in: Option<Duration>,
    ) {
        self.connected.store(false, Ordering::Release);
        self.events.dispatch(&DeviceEvent::Disconnected {
            code,
            reason: reason.into(),
            reconnect_in,
        });
    }

    /// Records an RPC request sent by the transport.
    pub fn handle_request(&self, method: impl Into<String>) {
        self.events.dispatch(&DeviceEvent::Request {
            method: method.into(),
        });
    }

    /// Changes the device profile; emits [`DeviceEvent::ConfigChanged`] if it differs.
    pub fn set_profile(&self, profile: impl Into<String>) {
        let profile = profile.into();
        let changed = {
            let mut current = self.profile.write();
            if current.as_deref() == Some(profile.as_str()) {
                false
            } else {
                *current = Some(profile);
                true
            }
        };

        if changed {
            tracing::debug!(device = %self.info.id, "Device profile changed");
            self.events.dispatch(&DeviceEvent::ConfigChanged);
        }
    }

    /// Changes an input's type; emits [`DeviceEvent::ConfigChanged`] if it differs.
    ///
    /// Returns `false` if there is no such input.
    pub fn set_input_type(&self, id: u8, input_type: InputType) -> bool {
        let Some(input) = self.input(id) else {
            return false;
        };

        if input.set_input_type(input_type) {
            self.events.dispatch(&DeviceEvent::ConfigChanged);
        }
        true
    }

    /// Applies a `NotifyStatus` payload.
    ///
    /// Keys naming unknown components are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a component status has an unexpected shape.
    pub fn apply_notify_status(&self, params: &Value) -> Result<(), serde_json::Error> {
        let Some(entries) = params.as_object() else {
            return Ok(());
        };

        for (key, status) in entries {
            let Some((kind, id)) = parse_component_key(key) else {
                continue;
            };

            match kind {
                "switch" => {
                    if let Some(switch) = self.switch(id) {
                        switch.apply_status(status)?;
                    }
                }
                "cover" => {
                    if let Some(cover) = self.cover(id) {
                        cover.apply_status(status)?;
                    }
                }
                "input" => {
                    if let Some(input) = self.input(id) {
                        input.apply_status(status)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Applies a `NotifyEvent` payload, forwarding button presses to inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload has an unexpected shape.
    pub fn handle_notify_event(&self, params: &Value) -> Result<(), serde_json::Error> {
        let notification = NotifyEvent::deserialize(params)?;

        for event in notification.events {
            let Some(("input", id)) = parse_component_key(&event.component) else {
                continue;
            };
            let Some(press) = ButtonPress::from_event_name(&event.event) else {
                tracing::trace!(component = %event.component, event = %event.event, "Ignoring event");
                continue;
            };
            if let Some(input) = self.input(id) {
                input.push(press);
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("info", &self.info)
            .field("profile", &*self.profile.read())
            .field("connected", &self.is_connected())
            .field("switches", &self.switches.len())
            .field("covers", &self.covers.len())
            .field("inputs", &self.inputs.len())
            .finish_non_exhaustive()
    }
}

fn parse_component_key(key: &str) -> Option<(&str, u8)> {
    let (kind, id) = key.split_once(':')?;
    Some((kind, id.parse().ok()?))
}

/// Builder for [`Device`].
///
/// Components are numbered in the order they are added, starting at 0.
#[must_use]
pub struct DeviceBuilder {
    info: DeviceInfo,
    profile: Option<String>,
    connected: bool,
    transport: Arc<dyn RpcTransport>,
    switches: Vec<SwitchStatus>,
    covers: Vec<CoverStatus>,
    inputs: Vec<(InputType, Option<bool>)>,
}

impl DeviceBuilder {
    fn new(id: DeviceId, model: String) -> Self {
        Self {
            info: DeviceInfo {
                id,
                model_name: model.clone(),
                model,
                mac_address: String::new(),
                firmware_version: None,
            },
            profile: None,
            connected: false,
            transport: Arc::new(DisconnectedTransport),
            switches: Vec::new(),
            covers: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Sets the human readable model name.
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.info.model_name = name.into();
        self
    }

    /// Sets the MAC address.
    pub fn mac_address(mut self, mac: impl Into<String>) -> Self {
        self.info.mac_address = mac.into();
        self
    }

    /// Sets the firmware version.
    pub fn firmware_version(mut self, version: impl Into<String>) -> Self {
        self.info.firmware_version = Some(version.into());
        self
    }

    /// Sets the active profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Sets the initial connectivity.
    pub fn connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Sets the transport used for commands.
    pub fn transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Adds a switch component.
    pub fn switch(mut self, status: SwitchStatus) -> Self {
        self.switches.push(status);
        self
    }

    /// Adds a cover component.
    pub fn cover(mut self, status: CoverStatus) -> Self {
        self.covers.push(status);
        self
    }

    /// Adds an input component.
    pub fn input(mut self, input_type: InputType, state: Option<bool>) -> Self {
        self.inputs.push((input_type, state));
        self
    }

    /// Builds the device.
    #[must_use]
    pub fn build(self) -> Arc<Device> {
        let transport = self.transport;

        let switches = (0u8..)
            .zip(self.switches)
            .map(|(id, status)| Arc::new(Switch::new(id, status, Arc::clone(&transport))))
            .collect();
        let covers = (0u8..)
            .zip(self.covers)
            .map(|(id, status)| Arc::new(Cover::new(id, status, Arc::clone(&transport))))
            .collect();
        let inputs = (0u8..)
            .zip(self.inputs)
            .map(|(id, (kind, state))| Arc::new(Input::new(id, kind, state)))
            .collect();

        Arc::new(Device {
            info: self.info,
            profile: RwLock::new(self.profile),
            connected: AtomicBool::new(self.connected),
            events: Arc::new(EventSource::new()),
            switches,
            covers,
            inputs,
        })
    }
}
