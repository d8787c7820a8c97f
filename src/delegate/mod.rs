// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device delegates.
//!
//! A [`DeviceDelegate`] owns the accessories of one physical device. The
//! per-model wiring lives in a [`DeviceModel`], which creates accessories
//! in [`DeviceModel::setup`] and toggles them in [`DeviceModel::refresh`]
//! when the device configuration changes. Accessories are never
//! re-created after setup.

mod registry;

pub use registry::DelegateRegistry;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::Span;

use crate::ability::{
    Ability, AccessoryInformationAbility, CoverAbility, OutletAbility, PowerMeterAbility,
    SwitchAbility,
};
use crate::accessory::{Accessory, AccessoryId};
use crate::config::{CoverType, DeviceOptions, SwitchType};
use crate::device::{Cover, Device, DeviceEvent, MeteredComponent, Switch};
use crate::error::{Error, Result};
use crate::platform::PlatformHandle;
use crate::subscription::Subscription;

/// Per-model wiring of a device.
pub trait DeviceModel: Send + Sync {
    /// Creates the accessories of a newly added device.
    ///
    /// # Errors
    ///
    /// Returns an error on a wiring fault such as a duplicate accessory ID
    /// or a missing component.
    fn setup(&self, delegate: &DeviceDelegate) -> Result<()>;

    /// Re-evaluates which accessories and abilities are active after the
    /// device configuration changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a component the model relies on is missing.
    fn refresh(&self, _delegate: &DeviceDelegate) -> Result<()> {
        Ok(())
    }
}

/// Options for [`DeviceDelegate::add_switch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddSwitchOptions {
    /// Whether the accessory should be active.
    pub active: bool,
    /// Whether this is the only switch of the device.
    pub single: bool,
}

impl Default for AddSwitchOptions {
    fn default() -> Self {
        Self {
            active: true,
            single: false,
        }
    }
}

impl AddSwitchOptions {
    /// Options for the only switch of a device.
    #[must_use]
    pub fn single() -> Self {
        Self {
            single: true,
            ..Self::default()
        }
    }

    /// Sets whether the accessory should be active.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Options for [`DeviceDelegate::add_cover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddCoverOptions {
    /// Whether the accessory should be active.
    pub active: bool,
}

impl Default for AddCoverOptions {
    fn default() -> Self {
        Self { active: true }
    }
}

impl AddCoverOptions {
    /// Sets whether the accessory should be active.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Formats a reconnection delay, rounding down to the largest whole unit.
pub(crate) fn reconnect_message(delay: Duration) -> String {
    let ms = delay.as_millis();
    if ms < 60 * 1000 {
        format!("Reconnecting in {} second(s)", ms / 1000)
    } else if ms < 60 * 60 * 1000 {
        format!("Reconnecting in {} minute(s)", ms / (60 * 1000))
    } else {
        format!("Reconnecting in {} hour(s)", ms / (60 * 60 * 1000))
    }
}

struct DelegateInner {
    device: Arc<Device>,
    options: DeviceOptions,
    platform: PlatformHandle,
    model: Arc<dyn DeviceModel>,
    span: Span,
    accessories: RwLock<Vec<Accessory>>,
    excluded: RwLock<HashSet<AccessoryId>>,
    connected: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
}

/// Owner of the accessories of one device.
///
/// Cloning yields another handle to the same delegate.
#[derive(Clone)]
pub struct DeviceDelegate {
    inner: Arc<DelegateInner>,
}

impl DeviceDelegate {
    /// Creates the delegate and runs the model's setup.
    ///
    /// # Errors
    ///
    /// Returns the error raised by [`DeviceModel::setup`]. The accessories
    /// created up to that point are detached before any of them reached
    /// the host.
    pub fn new(
        device: Arc<Device>,
        options: DeviceOptions,
        platform: PlatformHandle,
        model: Arc<dyn DeviceModel>,
    ) -> Result<Self> {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| device.model_name().to_string());
        let span = tracing::info_span!("device", id = %device.id(), name = %name);

        tracing::info!(
            parent: &span,
            protocol = ?options.protocol,
            hostname = options.hostname.as_deref(),
            "Device added"
        );
        let connected = device.is_connected();
        if connected {
            tracing::debug!(parent: &span, "Device is connected");
        } else {
            tracing::debug!(parent: &span, "Device is disconnected");
        }

        let delegate = Self {
            inner: Arc::new(DelegateInner {
                device: Arc::clone(&device),
                options,
                platform,
                model: Arc::clone(&model),
                span,
                accessories: RwLock::new(Vec::new()),
                excluded: RwLock::new(HashSet::new()),
                connected: AtomicBool::new(connected),
                subscription: Mutex::new(None),
            }),
        };

        let weak = Arc::downgrade(&delegate.inner);
        let subscription = device.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                DeviceDelegate { inner }.handle_event(event);
            }
        });
        *delegate.inner.subscription.lock() = Some(subscription);

        if let Err(err) = model.setup(&delegate) {
            delegate.detach();
            return Err(err);
        }

        Ok(delegate)
    }

    /// The device.
    #[must_use]
    pub fn device(&self) -> &Arc<Device> {
        &self.inner.device
    }

    /// The resolved device options.
    #[must_use]
    pub fn options(&self) -> &DeviceOptions {
        &self.inner.options
    }

    /// The device-scoped span every log line is recorded under.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.inner.span
    }

    /// Connectivity as last reported by the device.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// All accessories, in creation order.
    #[must_use]
    pub fn accessories(&self) -> Vec<Accessory> {
        self.inner.accessories.read().clone()
    }

    /// The accessory with the given local ID.
    #[must_use]
    pub fn accessory(&self, id: &str) -> Option<Accessory> {
        self.inner
            .accessories
            .read()
            .iter()
            .find(|a| a.id() == id)
            .cloned()
    }

    fn display_name(&self, suffix: Option<&str>) -> String {
        let base = self
            .inner
            .options
            .name
            .as_deref()
            .unwrap_or_else(|| self.inner.device.model_name());
        match suffix {
            Some(suffix) => format!("{base} {suffix}"),
            None => base.to_string(),
        }
    }

    fn insert_accessory(&self, id: &str, name: String, abilities: Vec<Ability>) -> Result<Accessory> {
        let mut accessories = self.inner.accessories.write();
        if accessories.iter().any(|a| a.id() == id) {
            return Err(Error::DuplicateAccessory { id: id.to_string() });
        }

        let mut all = Vec::with_capacity(abilities.len() + 1);
        all.push(Ability::new(AccessoryInformationAbility::new(
            self.inner.device.info().clone(),
        )));
        all.extend(abilities);

        let accessory = Accessory::new(
            id,
            self.inner.device.id().clone(),
            name,
            self.inner.platform.clone(),
            self.inner.span.clone(),
            all,
        );
        accessories.push(accessory.clone());
        Ok(accessory)
    }

    /// Creates an accessory; an `AccessoryInformation` ability is prepended.
    ///
    /// The display name is the configured device name (or model name)
    /// followed by `name_suffix`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccessory`] if `id` is already taken.
    pub fn create_accessory(
        &self,
        id: &str,
        name_suffix: Option<&str>,
        abilities: Vec<Ability>,
    ) -> Result<Accessory> {
        self.insert_accessory(id, self.display_name(name_suffix), abilities)
    }

    /// Creates the accessory for a switch.
    ///
    /// Switch and outlet presentations are both wired; the configured
    /// `type` decides which one is active. A power meter is active if the
    /// switch reports power.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccessory`] if the switch was already added.
    pub fn add_switch(&self, switch: &Arc<Switch>, opts: AddSwitchOptions) -> Result<Accessory> {
        let config = self
            .inner
            .options
            .component(&switch.key())
            .cloned()
            .unwrap_or_default();
        let outlet = config.switch_type() == SwitchType::Outlet;

        let (id, suffix) = if opts.single {
            ("switch".to_string(), None)
        } else {
            (
                format!("switch-{}", switch.id()),
                Some(format!("Switch {}", switch.id() + 1)),
            )
        };
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| self.display_name(suffix.as_deref()));

        let metered = switch.status().meter.is_metered();
        let abilities = vec![
            Ability::new(OutletAbility::new(Arc::clone(switch))).with_active(outlet),
            Ability::new(SwitchAbility::new(Arc::clone(switch))).with_active(!outlet),
            Ability::new(PowerMeterAbility::new(
                Arc::clone(switch) as Arc<dyn MeteredComponent>
            ))
            .with_active(metered),
        ];

        let accessory = self.insert_accessory(&id, name, abilities)?;
        if config.exclude {
            self.inner.excluded.write().insert(id);
        }
        accessory.set_active(!config.exclude && opts.active);
        Ok(accessory)
    }

    /// Creates the accessory for a cover.
    ///
    /// Door, window and window covering presentations are all wired; the
    /// configured `type` decides which one is active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccessory`] if the cover was already added.
    pub fn add_cover(&self, cover: &Arc<Cover>, opts: AddCoverOptions) -> Result<Accessory> {
        let config = self
            .inner
            .options
            .component(&cover.key())
            .cloned()
            .unwrap_or_default();
        let kind = config.cover_type();

        let (id, suffix) = match cover.id() {
            0 => ("cover".to_string(), "Cover".to_string()),
            n => (format!("cover-{n}"), format!("Cover {}", n + 1)),
        };
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| self.display_name(Some(&suffix)));

        let metered = cover.status().meter.is_metered();
        let abilities = vec![
            Ability::new(CoverAbility::new(Arc::clone(cover), CoverType::Door))
                .with_active(kind == CoverType::Door),
            Ability::new(CoverAbility::new(Arc::clone(cover), CoverType::WindowCovering))
                .with_active(kind == CoverType::WindowCovering),
            Ability::new(CoverAbility::new(Arc::clone(cover), CoverType::Window))
                .with_active(kind == CoverType::Window),
            Ability::new(PowerMeterAbility::new(
                Arc::clone(cover) as Arc<dyn MeteredComponent>
            ))
            .with_active(metered),
        ];

        let accessory = self.insert_accessory(&id, name, abilities)?;
        if config.exclude {
            self.inner.excluded.write().insert(id);
        }
        accessory.set_active(!config.exclude && opts.active);
        Ok(accessory)
    }

    /// Sets an accessory active unless its component is excluded.
    ///
    /// Returns `false` if there is no such accessory.
    pub fn set_accessory_active(&self, id: &str, active: bool) -> bool {
        let Some(accessory) = self.accessory(id) else {
            return false;
        };
        let excluded = self.inner.excluded.read().contains(id);
        accessory.set_active(active && !excluded);
        true
    }

    fn handle_event(&self, event: &DeviceEvent) {
        let span = &self.inner.span;
        match event {
            DeviceEvent::Connected => {
                tracing::info!(parent: span, "Device connected");
                self.inner.connected.store(true, Ordering::Release);
            }
            DeviceEvent::Disconnected {
                code,
                reason,
                reconnect_in,
            } => {
                let details = if reason.is_empty() {
                    format!("code: {code}")
                } else {
                    format!("reason: {reason}")
                };
                if self.inner.connected.swap(false, Ordering::AcqRel) {
                    tracing::warn!(parent: span, "Device disconnected ({details})");
                } else {
                    tracing::warn!(parent: span, "Connection failed ({details})");
                }

                if let Some(delay) = reconnect_in {
                    tracing::info!(parent: span, "{}", reconnect_message(*delay));
                }
            }
            DeviceEvent::Request { method } => {
                tracing::debug!(parent: span, method = %method, "WebSocket request");
            }
            DeviceEvent::ConfigChanged => {
                tracing::debug!(parent: span, "Device configuration changed");
                if let Err(err) = self.inner.model.refresh(self) {
                    tracing::error!(parent: span, error = %err, "Failed to apply configuration change");
                }
            }
        }
    }

    /// Stops listening to the device and detaches every accessory.
    ///
    /// Host objects stay registered.
    pub fn detach(&self) {
        self.inner.subscription.lock().take();
        for accessory in self.inner.accessories.read().iter() {
            accessory.detach();
        }
    }

    /// Detaches and unregisters every host object of the device.
    pub fn destroy(self) {
        self.detach();

        let objects: Vec<_> = self
            .inner
            .accessories
            .read()
            .iter()
            .filter_map(Accessory::take_platform_accessory)
            .collect();
        if !objects.is_empty() {
            self.inner.platform.remove_accessories(&objects);
        }

        tracing::info!(parent: &self.inner.span, "Device removed");
    }
}

impl std::fmt::Debug for DeviceDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDelegate")
            .field("device", self.inner.device.id())
            .field("accessories", &self.inner.accessories.read().len())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
