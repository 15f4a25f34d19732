// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock inbound event for deterministic testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use codunot_core::{ChannelId, CodunotError, QuotaSubject};
use tokio::sync::Mutex;

/// An inbound event whose replies are captured instead of sent.
///
/// Clones share the captured replies.
#[derive(Debug, Clone)]
pub struct MockSubject {
    channel: ChannelId,
    guild: Option<String>,
    author: String,
    privileged: bool,
    replies: Arc<Mutex<Vec<String>>>,
    fail_replies: Arc<AtomicBool>,
}

impl MockSubject {
    /// A server message from `author` in `channel` of `guild`.
    pub fn guild(guild: &str, channel: &str, author: &str) -> Self {
        Self {
            guild: Some(guild.to_string()),
            ..Self::direct(channel, author)
        }
    }

    /// A direct message from `author`; usage is keyed by the channel.
    pub fn direct(channel: &str, author: &str) -> Self {
        Self {
            channel: ChannelId::from(channel),
            guild: None,
            author: author.to_string(),
            privileged: false,
            replies: Arc::new(Mutex::new(Vec::new())),
            fail_replies: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Make every later `reply` fail with a channel error.
    pub fn fail_replies(&self) {
        self.fail_replies.store(true, Ordering::SeqCst);
    }

    pub async fn replies(&self) -> Vec<String> {
        self.replies.lock().await.clone()
    }

    pub async fn last_reply(&self) -> Option<String> {
        self.replies.lock().await.last().cloned()
    }

    pub async fn reply_count(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait]
impl QuotaSubject for MockSubject {
    fn channel_id(&self) -> &ChannelId {
        &self.channel
    }

    fn guild_id(&self) -> Option<&str> {
        self.guild.as_deref()
    }

    fn author_id(&self) -> &str {
        &self.author
    }

    fn is_privileged(&self) -> bool {
        self.privileged
    }

    async fn reply(&self, text: &str) -> Result<(), CodunotError> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(CodunotError::Channel {
                message: "mock reply failure".to_string(),
                source: None,
            });
        }
        self.replies.lock().await.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_replies_across_clones() {
        let subject = MockSubject::guild("g1", "c1", "alice");
        let clone = subject.clone();
        clone.reply("hello").await.unwrap();
        assert_eq!(subject.replies().await, vec!["hello"]);
        assert_eq!(subject.quota_key().0, "g1");
    }

    #[tokio::test]
    async fn direct_messages_key_by_channel() {
        let subject = MockSubject::direct("dm1", "bob");
        assert_eq!(subject.quota_key().0, "dm1");
        subject.fail_replies();
        assert!(subject.reply("x").await.is_err());
    }
}
