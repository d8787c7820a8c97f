// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wiring of the supported Shelly Plus and Pro devices.
//!
//! Every model creates all of its accessories up front. Devices whose
//! presentation depends on their configuration (the cover/switch profile
//! of the 2PM family, the input types of the Plus I4) pre-wire every
//! variant and toggle them on [`DeviceModel::refresh`].

mod cover;
mod input;
mod switch;

pub use cover::DualChannelCover;
pub use input::InputBox;
pub use switch::{MultiSwitch, SingleSwitch};

use std::sync::Arc;

use crate::delegate::{DelegateRegistry, DeviceDelegate, DeviceModel};
use crate::error::{Error, RegistryError};

/// Shelly Plus 1, Plus 1 UL and Plus 1 Mini.
pub const PLUS_1: &[&str] = &["SNSW-001X16EU", "SNSW-001X15UL", "SNSW-001X8EU"];
/// Shelly Plus 1 PM, Plus 1 PM UL and Plus 1 PM Mini.
pub const PLUS_1_PM: &[&str] = &["SNSW-001P16EU", "SNSW-001P15UL", "SNSW-001P8EU"];
/// Shelly Plus 2 PM and its first revision.
pub const PLUS_2_PM: &[&str] = &["SNSW-002P16EU", "SNSW-102P16EU"];
/// Shelly Plus I4.
pub const PLUS_I4: &[&str] = &["SNSN-0024X"];
/// Shelly Plus Plug US.
pub const PLUS_PLUG_US: &[&str] = &["SNPL-00116US"];
/// Shelly Pro 1 and its revisions.
pub const PRO_1: &[&str] = &["SPSW-001XE16EU", "SPSW-101XE16EU", "SPSW-201XE16EU"];
/// Shelly Pro 1 PM and its revisions.
pub const PRO_1_PM: &[&str] = &["SPSW-001PE16EU", "SPSW-101PE16EU", "SPSW-201PE16EU"];
/// Shelly Pro 2 and its revisions.
pub const PRO_2: &[&str] = &["SPSW-002XE16EU", "SPSW-102XE16EU", "SPSW-202XE16EU"];
/// Shelly Pro 2 PM and its revisions.
pub const PRO_2_PM: &[&str] = &["SPSW-002PE16EU", "SPSW-102PE16EU", "SPSW-202PE16EU"];
/// Shelly Pro 3.
pub const PRO_3: &[&str] = &["SPSW-003XE16EU"];
/// Shelly Pro 4 PM and its first revision.
pub const PRO_4_PM: &[&str] = &["SPSW-004PE16EU", "SPSW-104PE16EU"];

/// Registers every built-in model.
///
/// # Errors
///
/// Returns an error if an identifier is already registered.
pub fn register_builtin(registry: &mut DelegateRegistry) -> Result<(), RegistryError> {
    let single: Arc<dyn DeviceModel> = Arc::new(SingleSwitch);
    for ids in [PLUS_1, PLUS_1_PM, PLUS_PLUG_US, PRO_1, PRO_1_PM] {
        registry.register(Arc::clone(&single), ids)?;
    }

    registry.register(Arc::new(MultiSwitch::new(2)), PRO_2)?;
    registry.register(Arc::new(MultiSwitch::new(3)), PRO_3)?;
    registry.register(Arc::new(MultiSwitch::new(4)), PRO_4_PM)?;

    let dual: Arc<dyn DeviceModel> = Arc::new(DualChannelCover);
    registry.register(Arc::clone(&dual), PLUS_2_PM)?;
    registry.register(dual, PRO_2_PM)?;

    registry.register(Arc::new(InputBox), PLUS_I4)?;
    Ok(())
}

fn missing(delegate: &DeviceDelegate, component: String) -> Error {
    Error::MissingComponent {
        device: delegate.device().id().to_string(),
        component,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_is_registered_once() {
        let registry = DelegateRegistry::with_builtin_models().unwrap();

        let total: usize = [
            PLUS_1, PLUS_1_PM, PLUS_2_PM, PLUS_I4, PLUS_PLUG_US, PRO_1, PRO_1_PM, PRO_2, PRO_2_PM,
            PRO_3, PRO_4_PM,
        ]
        .iter()
        .map(|ids| ids.len())
        .sum();
        assert_eq!(registry.len(), total);
        assert!(registry.contains("SPSW-104PE16EU"));
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = DelegateRegistry::with_builtin_models().unwrap();
        let err = register_builtin(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateModel { .. }));
    }
}
