// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Digital input component.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::component::nullable;
use super::{ButtonPress, ComponentEvent, Property};
use crate::subscription::{EventSource, Subscription};

/// How an input is configured on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Momentary button; reports press events.
    Button,
    /// Toggle switch; reports a boolean state.
    #[default]
    Switch,
}

#[derive(Debug, Deserialize)]
struct InputPatch {
    #[serde(default, deserialize_with = "nullable")]
    state: Option<Option<bool>>,
}

/// A digital input.
pub struct Input {
    id: u8,
    state: RwLock<Option<bool>>,
    input_type: RwLock<InputType>,
    events: Arc<EventSource<ComponentEvent>>,
}

impl Input {
    /// Creates an input component.
    #[must_use]
    pub fn new(id: u8, input_type: InputType, state: Option<bool>) -> Self {
        Self {
            id,
            state: RwLock::new(state),
            input_type: RwLock::new(input_type),
            events: Arc::new(EventSource::new()),
        }
    }

    /// The component index.
    #[must_use]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The component key, e.g. `input:0`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("input:{}", self.id)
    }

    /// The input state; `None` for button inputs.
    #[must_use]
    pub fn state(&self) -> Option<bool> {
        *self.state.read()
    }

    /// The configured input type.
    #[must_use]
    pub fn input_type(&self) -> InputType {
        *self.input_type.read()
    }

    /// Returns true if the input is configured as a button.
    #[must_use]
    pub fn is_button(&self) -> bool {
        self.input_type() == InputType::Button
    }

    /// Subscribes to state changes and press events.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ComponentEvent) + Send + Sync + 'static,
    {
        EventSource::subscribe(&self.events, callback)
    }

    /// Sets the input state, emitting a change event if it differs.
    pub fn set_state(&self, state: Option<bool>) {
        let changed = {
            let mut current = self.state.write();
            let changed = *current != state;
            *current = state;
            changed
        };

        if changed {
            self.events
                .dispatch(&ComponentEvent::Changed(Property::InputState));
        }
    }

    /// Reports a button press.
    pub fn push(&self, press: ButtonPress) {
        self.events.dispatch(&ComponentEvent::Push(press));
    }

    /// Changes the input type; returns true if it changed.
    pub(crate) fn set_input_type(&self, input_type: InputType) -> bool {
        let mut current = self.input_type.write();
        let changed = *current != input_type;
        *current = input_type;
        changed
    }

    /// Applies a partial status object as sent in a `NotifyStatus` message.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the input status schema.
    pub fn apply_status(&self, patch: &Value) -> Result<(), serde_json::Error> {
        let patch = InputPatch::deserialize(patch)?;
        if let Some(state) = patch.state {
            self.set_state(state);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("input_type", &self.input_type())
            .finish_non_exhaustive()
    }
}
