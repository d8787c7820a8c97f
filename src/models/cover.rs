// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-channel devices that run either as a cover or as two switches.

use crate::delegate::{AddCoverOptions, AddSwitchOptions, DeviceDelegate, DeviceModel};
use crate::error::Result;

use super::missing;

const COVER_PROFILE: &str = "cover";

/// The Plus 2 PM and Pro 2 PM.
///
/// The cover accessory and both switch accessories always exist; the
/// device profile decides which side is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualChannelCover;

fn is_cover(delegate: &DeviceDelegate) -> bool {
    delegate.device().profile().as_deref() == Some(COVER_PROFILE)
}

impl DeviceModel for DualChannelCover {
    fn setup(&self, delegate: &DeviceDelegate) -> Result<()> {
        let device = delegate.device();
        let cover = is_cover(delegate);

        let cover0 = device
            .cover(0)
            .ok_or_else(|| missing(delegate, "cover:0".into()))?;
        delegate.add_cover(cover0, AddCoverOptions::default().active(cover))?;

        for id in 0..2 {
            let switch = device
                .switch(id)
                .ok_or_else(|| missing(delegate, format!("switch:{id}")))?;
            delegate.add_switch(switch, AddSwitchOptions::default().active(!cover))?;
        }
        Ok(())
    }

    fn refresh(&self, delegate: &DeviceDelegate) -> Result<()> {
        let cover = is_cover(delegate);
        tracing::debug!(
            parent: delegate.span(),
            profile = if cover { "cover" } else { "switch" },
            "Applying device profile"
        );

        delegate.set_accessory_active("cover", cover);
        delegate.set_accessory_active("switch-0", !cover);
        delegate.set_accessory_active("switch-1", !cover);
        Ok(())
    }
}
