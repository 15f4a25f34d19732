// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The narrow capability every inbound event is adapted to before it reaches
//! quota accounting.

use async_trait::async_trait;

use crate::error::CodunotError;
use crate::types::{ChannelId, EntityKey};

/// Something that can be charged against a quota and answered.
///
/// Platform message and interaction types are adapted to this trait
/// explicitly instead of probing for attributes at runtime.
#[async_trait]
pub trait QuotaSubject: Send + Sync {
    /// Channel the event arrived on.
    fn channel_id(&self) -> &ChannelId;

    /// Server the channel belongs to, `None` for direct messages.
    fn guild_id(&self) -> Option<&str>;

    /// Identifier of the author, checked against the owner list.
    fn author_id(&self) -> &str;

    /// Whether the platform already marked the author as privileged.
    fn is_privileged(&self) -> bool {
        false
    }

    /// Key usage is tracked under: the server when there is one, otherwise
    /// the channel.
    fn quota_key(&self) -> EntityKey {
        match self.guild_id() {
            Some(guild) => EntityKey::from(guild),
            None => EntityKey::from(self.channel_id()),
        }
    }

    /// Send a reply into the originating conversation.
    async fn reply(&self, text: &str) -> Result<(), CodunotError>;
}
