// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch component.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Value, json};

use super::component::{ComponentCallback, MeterPatch, MeteredComponent, PowerReadings};
use super::{ComponentEvent, Property, RpcTransport};
use crate::error::CommandError;
use crate::subscription::{EventSource, Subscription};

/// Status of a switch component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchStatus {
    /// Whether the output is on.
    pub output: bool,
    /// Power telemetry (PM models only).
    pub meter: PowerReadings,
}

impl SwitchStatus {
    /// Creates a status with the given output and no telemetry.
    #[must_use]
    pub fn new(output: bool) -> Self {
        Self {
            output,
            meter: PowerReadings::default(),
        }
    }

    /// Adds power telemetry.
    #[must_use]
    pub fn with_meter(mut self, meter: PowerReadings) -> Self {
        self.meter = meter;
        self
    }

    fn diff(&self, other: &Self) -> Vec<Property> {
        let mut changed = Vec::new();
        if self.output != other.output {
            changed.push(Property::Output);
        }
        self.meter.diff(&other.meter, &mut changed);
        changed
    }
}

#[derive(Debug, Deserialize)]
struct SwitchPatch {
    output: Option<bool>,
    #[serde(flatten)]
    meter: MeterPatch,
}

/// A relay output, optionally with power metering.
pub struct Switch {
    id: u8,
    status: RwLock<SwitchStatus>,
    events: Arc<EventSource<ComponentEvent>>,
    transport: Arc<dyn RpcTransport>,
}

impl Switch {
    /// Creates a switch component.
    #[must_use]
    pub fn new(id: u8, status: SwitchStatus, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            id,
            status: RwLock::new(status),
            events: Arc::new(EventSource::new()),
            transport,
        }
    }

    /// The component index.
    #[must_use]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The component key, e.g. `switch:0`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("switch:{}", self.id)
    }

    /// Whether the output is currently on.
    #[must_use]
    pub fn output(&self) -> bool {
        self.status.read().output
    }

    /// A snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> SwitchStatus {
        self.status.read().clone()
    }

    /// Subscribes to property changes.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ComponentEvent) + Send + Sync + 'static,
    {
        EventSource::subscribe(&self.events, callback)
    }

    /// Turns the output on or off.
    ///
    /// The local status is not changed; the device reports the new output
    /// through a status notification.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the device cannot be commanded.
    pub async fn set(&self, on: bool) -> Result<(), CommandError> {
        self.transport
            .call("Switch.Set", json!({ "id": self.id, "on": on }))
            .await
            .map(|_| ())
    }

    /// Mutates the status and emits one event per changed property.
    pub fn update_status(&self, f: impl FnOnce(&mut SwitchStatus)) {
        let changed = {
            let mut status = self.status.write();
            let before = status.clone();
            f(&mut status);
            before.diff(&status)
        };

        for property in changed {
            self.events.dispatch(&ComponentEvent::Changed(property));
        }
    }

    /// Applies a partial status object as sent in a `NotifyStatus` message.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the switch status schema.
    pub fn apply_status(&self, patch: &Value) -> Result<(), serde_json::Error> {
        let patch = SwitchPatch::deserialize(patch)?;
        self.update_status(|status| {
            if let Some(output) = patch.output {
                status.output = output;
            }
            patch.meter.apply(&mut status.meter);
        });
        Ok(())
    }
}

impl MeteredComponent for Switch {
    fn id(&self) -> u8 {
        self.id
    }

    fn readings(&self) -> PowerReadings {
        self.status.read().meter.clone()
    }

    fn subscribe_events(&self, callback: ComponentCallback) -> Subscription {
        EventSource::subscribe(&self.events, callback)
    }
}

impl std::fmt::Debug for Switch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switch")
            .field("id", &self.id)
            .field("status", &*self.status.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryTransport;
    use parking_lot::Mutex;

    fn switch(transport: Arc<MemoryTransport>) -> Switch {
        Switch::new(1, SwitchStatus::new(false), transport)
    }

    #[tokio::test]
    async fn set_sends_switch_set() {
        let transport = Arc::new(MemoryTransport::new());
        let sw = switch(Arc::clone(&transport));

        sw.set(true).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].method, "Switch.Set");
        assert_eq!(calls[0].params, json!({ "id": 1, "on": true }));
        // the command alone does not change the reported output
        assert!(!sw.output());
    }

    #[test]
    fn apply_status_emits_changes_once() {
        let sw = switch(Arc::new(MemoryTransport::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = sw.subscribe(move |e| s.lock().push(*e));

        sw.apply_status(&json!({ "id": 1, "output": true, "apower": 3.5 }))
            .unwrap();
        sw.apply_status(&json!({ "id": 1, "output": true })).unwrap();

        assert!(sw.output());
        assert_eq!(sw.status().meter.apower, Some(3.5));
        assert_eq!(
            *seen.lock(),
            vec![
                ComponentEvent::Changed(Property::Output),
                ComponentEvent::Changed(Property::Apower)
            ]
        );
    }

    #[test]
    fn key_format() {
        let sw = switch(Arc::new(MemoryTransport::new()));
        assert_eq!(sw.key(), "switch:1");
    }
}
