// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover (roller shutter) component.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::component::{
    ComponentCallback, MeterPatch, MeteredComponent, PowerReadings, nullable,
};
use super::{ComponentEvent, Property, RpcTransport};
use crate::error::CommandError;
use crate::subscription::{EventSource, Subscription};

/// Movement state of a cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverState {
    /// Fully open.
    Open,
    /// Fully closed.
    Closed,
    /// Moving towards open.
    Opening,
    /// Moving towards closed.
    Closing,
    /// Stopped somewhere in between.
    #[default]
    Stopped,
    /// Running the calibration procedure.
    Calibrating,
}

/// Status of a cover component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverStatus {
    /// Movement state.
    pub state: CoverState,
    /// Current position in percent, if known.
    pub current_pos: Option<u8>,
    /// Position the cover is moving towards, if any.
    pub target_pos: Option<u8>,
    /// Whether the cover has been calibrated for positioning.
    pub pos_control: bool,
    /// Power telemetry.
    pub meter: PowerReadings,
}

impl CoverStatus {
    /// Creates the status of a calibrated, stopped cover at `pos`.
    #[must_use]
    pub fn calibrated(pos: u8) -> Self {
        Self {
            state: CoverState::Stopped,
            current_pos: Some(pos),
            target_pos: None,
            pos_control: true,
            meter: PowerReadings::default(),
        }
    }

    /// Creates the status of a cover that has not been calibrated.
    #[must_use]
    pub fn uncalibrated() -> Self {
        Self::default()
    }

    fn diff(&self, other: &Self) -> Vec<Property> {
        let mut changed = Vec::new();
        if self.state != other.state {
            changed.push(Property::State);
        }
        if self.current_pos != other.current_pos {
            changed.push(Property::CurrentPos);
        }
        if self.target_pos != other.target_pos {
            changed.push(Property::TargetPos);
        }
        if self.pos_control != other.pos_control {
            changed.push(Property::PosControl);
        }
        self.meter.diff(&other.meter, &mut changed);
        changed
    }
}

#[derive(Debug, Deserialize)]
struct CoverPatch {
    state: Option<CoverState>,
    #[serde(default, deserialize_with = "nullable")]
    current_pos: Option<Option<u8>>,
    #[serde(default, deserialize_with = "nullable")]
    target_pos: Option<Option<u8>>,
    pos_control: Option<bool>,
    #[serde(flatten)]
    meter: MeterPatch,
}

/// A motorised cover (blinds, shutters, garage doors).
pub struct Cover {
    id: u8,
    status: RwLock<CoverStatus>,
    events: Arc<EventSource<ComponentEvent>>,
    transport: Arc<dyn RpcTransport>,
}

impl Cover {
    /// Creates a cover component.
    #[must_use]
    pub fn new(id: u8, status: CoverStatus, transport: Arc<dyn RpcTransport>) -> Self {
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

    /// The component key, e.g. `cover:0`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("cover:{}", self.id)
    }

    /// A snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> CoverStatus {
        self.status.read().clone()
    }

    /// Whether the cover has been calibrated.
    #[must_use]
    pub fn pos_control(&self) -> bool {
        self.status.read().pos_control
    }

    /// Subscribes to property changes.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ComponentEvent) + Send + Sync + 'static,
    {
        EventSource::subscribe(&self.events, callback)
    }

    /// Moves the cover to `pos` percent.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the device cannot be commanded.
    pub async fn go_to_position(&self, pos: u8) -> Result<(), CommandError> {
        self.transport
            .call("Cover.GoToPosition", json!({ "id": self.id, "pos": pos }))
            .await
            .map(|_| ())
    }

    /// Mutates the status and emits one event per changed property.
    pub fn update_status(&self, f: impl FnOnce(&mut CoverStatus)) {
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
    /// Returns an error if the object does not match the cover status schema.
    pub fn apply_status(&self, patch: &Value) -> Result<(), serde_json::Error> {
        let patch = CoverPatch::deserialize(patch)?;
        self.update_status(|status| {
            if let Some(state) = patch.state {
                status.state = state;
            }
            if let Some(pos) = patch.current_pos {
                status.current_pos = pos;
            }
            if let Some(pos) = patch.target_pos {
                status.target_pos = pos;
            }
            if let Some(pos_control) = patch.pos_control {
                status.pos_control = pos_control;
            }
            patch.meter.apply(&mut status.meter);
        });
        Ok(())
    }
}

impl MeteredComponent for Cover {
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

impl std::fmt::Debug for Cover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cover")
            .field("id", &self.id)
            .field("status", &*self.status.read())
            .finish_non_exhaustive()
    }
}
