// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{AbilityContext, Bindings, Capability, Sealed};
use crate::error::AbilityError;
use crate::hap::{CharacteristicType, ServiceType, service_label_namespace};

/// How the buttons of a multi-button accessory are labelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceLabelNamespace {
    /// Dots.
    Dots,
    /// Numbers.
    #[default]
    ArabicNumerals,
}

/// Groups the buttons of an accessory.
#[derive(Debug, Default)]
pub struct ServiceLabelAbility {
    namespace: ServiceLabelNamespace,
}

impl ServiceLabelAbility {
    /// Creates the ability.
    #[must_use]
    pub fn new(namespace: ServiceLabelNamespace) -> Self {
        Self { namespace }
    }
}

impl Sealed for ServiceLabelAbility {}

impl Capability for ServiceLabelAbility {
    fn service_type(&self) -> ServiceType {
        ServiceType::ServiceLabel
    }

    fn initialize(&self, ctx: &AbilityContext<'_>) -> Result<Bindings, AbilityError> {
        let value = match self.namespace {
            ServiceLabelNamespace::Dots => service_label_namespace::DOTS,
            ServiceLabelNamespace::ArabicNumerals => service_label_namespace::ARABIC_NUMERALS,
        };
        ctx.service
            .set_characteristic(CharacteristicType::ServiceLabelNamespace, value);
        Ok(Bindings::new())
    }
}
