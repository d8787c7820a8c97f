// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input-only devices.

use std::sync::Arc;

use crate::ability::{
    Ability, ReadonlySwitchAbility, ServiceLabelAbility, ServiceLabelNamespace,
    StatelessProgrammableSwitchAbility,
};
use crate::delegate::{DeviceDelegate, DeviceModel};
use crate::device::Input;
use crate::error::Result;

use super::missing;

const INPUTS: u8 = 4;

/// The Plus I4.
///
/// Inputs configured as buttons become programmable switches on a shared
/// `buttons` accessory; the other inputs each get a read-only switch
/// accessory (`switch0` to `switch3`).
#[derive(Debug, Clone, Copy, Default)]
pub struct InputBox;

fn inputs(delegate: &DeviceDelegate) -> Result<Vec<Arc<Input>>> {
    (0..INPUTS)
        .map(|id| {
            delegate
                .device()
                .input(id)
                .cloned()
                .ok_or_else(|| missing(delegate, format!("input:{id}")))
        })
        .collect()
}

fn button_subtype(id: u8) -> String {
    format!("stateless-programmable-switch-{id}")
}

impl DeviceModel for InputBox {
    fn setup(&self, delegate: &DeviceDelegate) -> Result<()> {
        let inputs = inputs(delegate)?;

        let mut buttons: Vec<Ability> = inputs
            .iter()
            .map(|input| {
                Ability::new(StatelessProgrammableSwitchAbility::new(Arc::clone(input)))
                    .with_active(input.is_button())
            })
            .collect();
        buttons.push(Ability::new(ServiceLabelAbility::new(
            ServiceLabelNamespace::ArabicNumerals,
        )));
        let any_button = inputs.iter().any(|input| input.is_button());
        delegate
            .create_accessory("buttons", None, buttons)?
            .set_active(any_button);

        for input in &inputs {
            let suffix = format!("Input {}", input.id() + 1);
            delegate
                .create_accessory(
                    &format!("switch{}", input.id()),
                    Some(&suffix),
                    vec![Ability::new(ReadonlySwitchAbility::new(Arc::clone(input)))],
                )?
                .set_active(!input.is_button());
        }
        Ok(())
    }

    fn refresh(&self, delegate: &DeviceDelegate) -> Result<()> {
        let inputs = inputs(delegate)?;

        if let Some(buttons) = delegate.accessory("buttons") {
            for input in &inputs {
                if let Some(ability) = buttons.find_ability(&button_subtype(input.id())) {
                    ability.set_active(input.is_button());
                }
            }
        }
        let any_button = inputs.iter().any(|input| input.is_button());
        delegate.set_accessory_active("buttons", any_button);

        for input in &inputs {
            delegate.set_accessory_active(&format!("switch{}", input.id()), !input.is_button());
        }
        Ok(())
    }
}
