// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::{Arc, Weak};

use tracing::Span;

use super::{AbilityContext, Bindings, Capability, Sealed, ServiceIdentity};
use crate::config::CoverType;
use crate::device::{ComponentEvent, Cover, CoverState, CoverStatus, Property};
use crate::error::{AbilityError, HapStatus};
use crate::hap::{CharacteristicType, ServiceType, position_state};
use crate::host::Service;

/// Exposes a cover as a HomeKit door, window or window covering.
///
/// Only calibrated covers can be positioned; for an uncalibrated one the
/// service is created but left without position characteristics. The
/// characteristics come and go as the cover gains or loses calibration.
#[derive(Debug)]
pub struct CoverAbility {
    component: Arc<Cover>,
    kind: CoverType,
}

impl CoverAbility {
    /// Creates the ability for `component`, presented as `kind`.
    #[must_use]
    pub fn new(component: Arc<Cover>, kind: CoverType) -> Self {
        Self { component, kind }
    }

    /// The presentation type.
    #[must_use]
    pub fn kind(&self) -> CoverType {
        self.kind
    }
}

fn movement(status: &CoverStatus) -> i64 {
    match status.state {
        CoverState::Opening => position_state::INCREASING,
        CoverState::Closing => position_state::DECREASING,
        _ => position_state::STOPPED,
    }
}

fn current_position(status: &CoverStatus) -> u8 {
    status.current_pos.unwrap_or(0)
}

fn target_position(status: &CoverStatus) -> u8 {
    status.target_pos.unwrap_or_else(|| current_position(status))
}

/// Publishes all three position characteristics.
///
/// The device reports state, current and target position in separate
/// notifications; HomeKit needs them to agree.
fn publish(service: &Service, status: &CoverStatus) {
    service
        .update_characteristic(CharacteristicType::PositionState, movement(status))
        .update_characteristic(CharacteristicType::TargetPosition, target_position(status))
        .update_characteristic(CharacteristicType::CurrentPosition, current_position(status));
}

const POSITION_CHARACTERISTICS: [CharacteristicType; 3] = [
    CharacteristicType::PositionState,
    CharacteristicType::TargetPosition,
    CharacteristicType::CurrentPosition,
];

/// Service side of a cover binding; follows the calibration state.
struct Positioning {
    cover: Weak<Cover>,
    service: Service,
    span: Span,
}

impl Positioning {
    /// Publishes the position characteristics and accepts target writes.
    fn calibrated(&self, status: &CoverStatus) {
        publish(&self.service, status);

        let cover = self.cover.clone();
        let span = self.span.clone();
        self.service
            .characteristic(CharacteristicType::TargetPosition)
            .on_set(move |value| {
                let cover = cover.clone();
                let span = span.clone();
                async move {
                    let Some(cover) = cover.upgrade() else {
                        return Err(HapStatus::ServiceCommunicationFailure);
                    };
                    if !cover.pos_control() {
                        return Err(HapStatus::InvalidValueInRequest);
                    }
                    let pos = value
                        .as_i64()
                        .and_then(|v| u8::try_from(v).ok())
                        .filter(|v| *v <= 100)
                        .ok_or(HapStatus::InvalidValueInRequest)?;
                    if Some(pos) == cover.status().target_pos {
                        return Ok(());
                    }

                    cover.go_to_position(pos).await.map_err(|err| {
                        tracing::error!(parent: &span, cover = cover.id(), error = %err, "Failed to set target position");
                        HapStatus::ServiceCommunicationFailure
                    })
                }
            });
    }

    /// Withdraws the position characteristics.
    fn uncalibrated(&self, id: u8) {
        tracing::warn!(parent: &self.span, cover = id, "Only calibrated covers are supported.");
        if let Some(target) = self.service.find_characteristic(CharacteristicType::TargetPosition) {
            target.clear_on_set();
        }
        for kind in POSITION_CHARACTERISTICS {
            self.service.remove_characteristic(kind);
        }
    }
}

impl Sealed for CoverAbility {}

impl Capability for CoverAbility {
    fn service_type(&self) -> ServiceType {
        match self.kind {
            CoverType::Door => ServiceType::Door,
            CoverType::Window => ServiceType::Window,
            CoverType::WindowCovering => ServiceType::WindowCovering,
        }
    }

    fn identity(&self) -> Option<ServiceIdentity> {
        let id = self.component.id();
        let (name, subtype) = match self.kind {
            CoverType::Door => ("Door", "door"),
            CoverType::Window => ("Window", "window"),
            CoverType::WindowCovering => ("Window Covering", "windowCovering"),
        };
        Some(ServiceIdentity::new(
            format!("{name} {}", id + 1),
            format!("{subtype}-{id}"),
        ))
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let positioning = Positioning {
            cover: Arc::downgrade(&self.component),
            service: ctx.service.clone(),
            span: ctx.span.clone(),
        };

        let status = self.component.status();
        if status.pos_control {
            positioning.calibrated(&status);
        } else {
            positioning.uncalibrated(self.component.id());
        }

        let bindings = Bindings::new()
            .service_write_handler(ctx.service.clone(), CharacteristicType::TargetPosition);

        let subscription = self.component.subscribe(move |event| {
            let ComponentEvent::Changed(property) = *event else {
                return;
            };
            let Some(cover) = positioning.cover.upgrade() else {
                return;
            };
            let status = cover.status();

            match property {
                Property::PosControl if status.pos_control => {
                    tracing::info!(parent: &positioning.span, cover = cover.id(), "Cover calibrated");
                    positioning.calibrated(&status);
                }
                Property::PosControl => positioning.uncalibrated(cover.id()),
                Property::State | Property::CurrentPos | Property::TargetPos if status.pos_control => {
                    tracing::debug!(
                        parent: &positioning.span,
                        cover = cover.id(),
                        ?property,
                        state = movement(&status),
                        current = current_position(&status),
                        target = target_position(&status),
                        "Cover changed"
                    );
                    publish(&positioning.service, &status);
                }
                _ => {}
            }
        });

        Ok(bindings.subscription(subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::device::MemoryTransport;
    use crate::hap::CharacteristicValue;
    use crate::host::PlatformAccessory;
    use tracing::Span;
    use uuid::Uuid;

    fn setup(status: CoverStatus) -> (Arc<MemoryTransport>, Arc<Cover>, Ability) {
        let transport = Arc::new(MemoryTransport::new());
        let cover = Arc::new(Cover::new(0, status, Arc::clone(&transport) as _));
        let ability = Ability::new(CoverAbility::new(Arc::clone(&cover), CoverType::Window));
        let pa = PlatformAccessory::new("Shutter", Uuid::nil());
        ability.setup(&pa, &Span::none()).unwrap();
        (transport, cover, ability)
    }

    #[test]
    fn uncalibrated_cover_publishes_no_position() {
        let (_t, _cover, ability) = setup(CoverStatus::uncalibrated());
        let service = ability.service().unwrap();

        assert!(!service.has_characteristic(CharacteristicType::CurrentPosition));
        assert!(!service.has_characteristic(CharacteristicType::TargetPosition));
        assert!(!service.has_characteristic(CharacteristicType::PositionState));
    }

    #[test]
    fn any_change_refreshes_all_three() {
        let (_t, cover, ability) = setup(CoverStatus::calibrated(0));
        let service = ability.service().unwrap();

        cover.update_status(|s| {
            s.state = CoverState::Opening;
            s.target_pos = Some(100);
        });
        cover.update_status(|s| s.current_pos = Some(40));

        assert_eq!(
            service.value(CharacteristicType::CurrentPosition),
            Some(CharacteristicValue::Int(40))
        );
        assert_eq!(
            service.value(CharacteristicType::PositionState),
            Some(CharacteristicValue::Int(position_state::INCREASING))
        );
        assert_eq!(
            service.value(CharacteristicType::TargetPosition),
            Some(CharacteristicValue::Int(100))
        );
    }

    #[test]
    fn target_defaults_to_current() {
        let (_t, _cover, ability) = setup(CoverStatus::calibrated(30));
        let service = ability.service().unwrap();
        assert_eq!(
            service.value(CharacteristicType::TargetPosition),
            Some(CharacteristicValue::Int(30))
        );
        assert_eq!(service.name(), Some("Window 1"));
        assert_eq!(service.subtype(), Some("window-0"));
    }

    #[tokio::test]
    async fn calibration_at_runtime_publishes_position() {
        let (transport, cover, ability) = setup(CoverStatus::uncalibrated());
        let service = ability.service().unwrap();

        cover
            .apply_status(&serde_json::json!({ "pos_control": true, "current_pos": 40 }))
            .unwrap();

        assert_eq!(
            service.value(CharacteristicType::CurrentPosition),
            Some(CharacteristicValue::Int(40))
        );
        assert_eq!(
            service.value(CharacteristicType::TargetPosition),
            Some(CharacteristicValue::Int(40))
        );
        let target = service.characteristic(CharacteristicType::TargetPosition);
        assert!(target.has_on_set());
        target.handle_write(CharacteristicValue::Int(70)).await.unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn losing_calibration_withdraws_position() {
        let (transport, cover, ability) = setup(CoverStatus::calibrated(20));
        let service = ability.service().unwrap();
        let stale_target = service.characteristic(CharacteristicType::TargetPosition);

        cover.update_status(|s| s.pos_control = false);

        assert!(!service.has_characteristic(CharacteristicType::CurrentPosition));
        assert!(!service.has_characteristic(CharacteristicType::TargetPosition));
        assert!(!service.has_characteristic(CharacteristicType::PositionState));
        assert!(!stale_target.has_on_set());

        cover.update_status(|s| s.current_pos = Some(60));
        assert!(!service.has_characteristic(CharacteristicType::CurrentPosition));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn detach_releases_handler_installed_after_calibration() {
        let (_t, cover, ability) = setup(CoverStatus::uncalibrated());
        cover.update_status(|s| {
            s.pos_control = true;
            s.current_pos = Some(10);
        });
        let target = ability
            .service()
            .unwrap()
            .characteristic(CharacteristicType::TargetPosition);
        assert!(target.has_on_set());

        ability.detach();

        assert!(!target.has_on_set());
    }

    #[tokio::test]
    async fn target_write_moves_cover_unless_already_targeted() {
        let mut status = CoverStatus::calibrated(0);
        status.target_pos = Some(50);
        let (transport, _cover, ability) = setup(status);
        let target = ability
            .service()
            .unwrap()
            .characteristic(CharacteristicType::TargetPosition);

        target.handle_write(CharacteristicValue::Int(50)).await.unwrap();
        assert!(transport.calls().is_empty());

        target.handle_write(CharacteristicValue::Int(80)).await.unwrap();
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].method, "Cover.GoToPosition");

        assert_eq!(
            target.handle_write(CharacteristicValue::Int(180)).await,
            Err(HapStatus::InvalidValueInRequest)
        );
    }
}
