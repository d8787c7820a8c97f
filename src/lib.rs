// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `shelly_homekit` - expose Shelly Gen2 devices as HomeKit accessories.
//!
//! A device is bridged by a [`DeviceDelegate`] that creates one or more
//! [`Accessory`] objects. Each accessory is a list of [`Ability`] values,
//! and each ability binds one device component (a switch, a cover, an
//! input) to one HomeKit service.
//!
//! # Lifecycle
//!
//! - Abilities and accessories carry an `active` flag. Toggling it is
//!   cheap and may happen at any time; the host objects follow.
//! - An accessory owns a host object exactly while it is active. Its
//!   transitions are deferred to the platform's transition queue, so
//!   toggling back and forth within one turn never reaches the host.
//! - An ability owns a service exactly while it and its accessory are
//!   active. Services survive accessory restarts through the host cache.
//! - Delegates wire every presentation variant of a device up front;
//!   configuration changes only flip `active` flags.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use shelly_homekit::config::{ComponentOptions, DeviceOptions, PlatformOptions};
//! use shelly_homekit::device::{Device, MemoryTransport, SwitchStatus};
//! use shelly_homekit::hap::ServiceType;
//! use shelly_homekit::host::{HostApi, InMemoryHost};
//! use shelly_homekit::{DelegateRegistry, Platform};
//!
//! let options = PlatformOptions::new().with_device(
//!     "shellypro2-aabbcc",
//!     DeviceOptions::new()
//!         .with_name("Hallway")
//!         .with_component("switch:1", ComponentOptions::new().with_type("outlet")),
//! );
//!
//! let host = Arc::new(InMemoryHost::new());
//! let mut platform = Platform::new(
//!     Arc::clone(&host) as Arc<dyn HostApi>,
//!     options,
//!     DelegateRegistry::with_builtin_models()?,
//! );
//!
//! let device = Device::builder("shellypro2-aabbcc", "SPSW-002XE16EU")
//!     .transport(Arc::new(MemoryTransport::new()))
//!     .switch(SwitchStatus::new(false))
//!     .switch(SwitchStatus::new(true))
//!     .build();
//! platform.add_device(device)?;
//! platform.run_pending();
//!
//! let published = host.published();
//! assert_eq!(published.len(), 2);
//! assert!(published.iter().any(|pa| pa.service(ServiceType::Outlet).is_some()));
//! # Ok::<(), shelly_homekit::Error>(())
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`]. Every line emitted on behalf of a
//! device is recorded inside a `device` span carrying the device ID and
//! name. No subscriber is installed by the library.

pub mod ability;
pub mod accessory;
pub mod config;
pub mod delegate;
pub mod device;
pub mod error;
pub mod hap;
pub mod host;
pub mod models;
pub mod platform;
pub mod subscription;

pub use ability::{Ability, Capability};
pub use accessory::{Accessory, AccessoryId};
pub use config::{DeviceOptions, PlatformOptions};
pub use delegate::{AddCoverOptions, AddSwitchOptions, DelegateRegistry, DeviceDelegate, DeviceModel};
pub use device::{Device, DeviceEvent, DeviceId};
pub use error::{AbilityError, CommandError, Error, HapStatus, RegistryError, Result};
pub use platform::{Platform, PlatformEvent, PlatformHandle};
pub use subscription::{EventSource, Subscription, SubscriptionId};
