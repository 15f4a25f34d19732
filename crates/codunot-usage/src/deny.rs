// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use codunot_core::{ResourceKind, Tier};

/// User-facing text for a failed limit check.
pub fn deny_message(tier: Tier, kind: ResourceKind, upgrade_contact: Option<&str>) -> String {
    let tier = tier.to_string().to_uppercase();
    match upgrade_contact {
        Some(contact) => format!(
            "🚫 **{tier}** limit hit for `{kind}`.\nContact **{contact}** for an upgrade."
        ),
        None => format!("🚫 **{tier}** limit hit for `{kind}`."),
    }
}
