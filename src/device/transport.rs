// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RPC transport used by components to send commands to a device.
//!
//! The actual wire protocol (WebSocket JSON-RPC for Shelly Gen2 devices)
//! lives outside this crate. Components only need something that can send
//! a method call with JSON parameters and either succeed or fail with a
//! [`CommandError`].

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::CommandError;

/// Sends RPC calls to a device.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Calls `method` with `params` and returns the result object.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the device cannot be reached, does not
    /// answer in time or rejects the call.
    async fn call(&self, method: &str, params: Value) -> Result<Value, CommandError>;
}

/// A call recorded by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    /// The RPC method name.
    pub method: String,
    /// The call parameters.
    pub params: Value,
}

/// In-process transport that records every call.
///
/// Calls succeed with `null` unless a failure has been configured with
/// [`fail_with`](Self::fail_with). Useful for simulations and tests.
///
/// # Examples
///
/// ```
/// use shelly_homekit::device::{MemoryTransport, RpcTransport};
///
/// # async fn example() {
/// let transport = MemoryTransport::new();
/// transport
///     .call("Switch.Set", serde_json::json!({ "id": 0, "on": true }))
///     .await
///     .unwrap();
/// assert_eq!(transport.calls().len(), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    calls: Mutex<Vec<RpcCall>>,
    failure: Mutex<Option<CommandError>>,
}

impl MemoryTransport {
    /// Creates a transport that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `error`; `None` restores success.
    pub fn fail_with(&self, error: Option<CommandError>) {
        *self.failure.lock() = error;
    }

    /// Returns the calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RpcCall> {
        self.calls.lock().clone()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl RpcTransport for MemoryTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, CommandError> {
        self.calls.lock().push(RpcCall {
            method: method.to_string(),
            params,
        });

        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(Value::Null),
        }
    }
}

/// Transport for devices without an open connection; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedTransport;

#[async_trait]
impl RpcTransport for DisconnectedTransport {
    async fn call(&self, _method: &str, _params: Value) -> Result<Value, CommandError> {
        Err(CommandError::NotConnected)
    }
}
