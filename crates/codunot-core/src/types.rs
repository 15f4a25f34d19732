// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the state stores, the usage ledger, and the glue.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::CodunotError;

/// Opaque identifier of a conversation channel (server text channel or DM thread).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

/// Key under which usage is tracked: a server id, or a channel id when the
/// conversation has no server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_string())
    }
}

impl From<&str> for EntityKey {
    fn from(s: &str) -> Self {
        EntityKey(s.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(s: String) -> Self {
        EntityKey(s)
    }
}

impl From<&ChannelId> for EntityKey {
    fn from(id: &ChannelId) -> Self {
        EntityKey(id.0.clone())
    }
}

/// Persona selector for a channel. Interpreted by prompt construction,
/// which lives outside this workspace.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    #[strum(to_string = "default", serialize = "funny")]
    #[serde(alias = "funny")]
    Default,
    #[strum(to_string = "serious")]
    Serious,
    #[strum(to_string = "roast")]
    Roast,
    #[strum(to_string = "code", serialize = "codemode")]
    #[serde(alias = "codemode")]
    Code,
    #[strum(to_string = "game", serialize = "chess")]
    #[serde(alias = "chess")]
    Game,
}

impl Mode {
    /// Parse a user-supplied mode name, rejecting anything outside the
    /// closed set instead of falling back to a default.
    pub fn parse(name: &str) -> Result<Self, CodunotError> {
        Mode::from_str(name.trim()).map_err(|_| CodunotError::InvalidMode {
            value: name.trim().to_string(),
        })
    }

    /// Canonical names of every mode, in declaration order.
    pub fn names() -> Vec<String> {
        Mode::iter().map(|m| m.to_string()).collect()
    }
}

/// Rough tone of a speaker's latest message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    #[default]
    Neutral,
}

impl Mood {
    /// Classify a message by keyword. Words are compared whole and without
    /// case; the first category with a hit wins, in the order happy, sad,
    /// angry.
    pub fn detect(text: &str) -> Self {
        const TABLE: [(Mood, &[&str]); 3] = [
            (Mood::Happy, &["lol", "lmao", "xd"]),
            (Mood::Sad, &["sad", "upset", "cry"]),
            (Mood::Angry, &["angry", "mad", "wtf"]),
        ];
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        TABLE
            .iter()
            .find(|(_, keys)| words.iter().any(|w| keys.contains(&w.as_str())))
            .map_or(Mood::Neutral, |(mood, _)| *mood)
    }
}

/// Service level of a tracked entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Premium,
    Gold,
}

/// A quota-limited resource.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Messages,
    Attachments,
}

impl ResourceKind {
    /// Whether this kind is also limited over the rolling window.
    pub fn is_rolling_limited(self) -> bool {
        matches!(self, ResourceKind::Attachments)
    }
}

/// A usage ceiling. Positive infinity means unlimited and makes every
/// comparison pass.
///
/// Deserializes from a number or the word `"unlimited"`; serializes
/// unlimited back to that word so JSON output stays valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit(pub f64);

impl Limit {
    pub const UNLIMITED: Limit = Limit(f64::INFINITY);

    pub fn new(max: u32) -> Self {
        Limit(f64::from(max))
    }

    pub fn is_unlimited(self) -> bool {
        self.0 == f64::INFINITY
    }

    /// Whether one more unit may be used when `used` units are already spent.
    pub fn allows(self, used: u64) -> bool {
        if self.is_unlimited() {
            return true;
        }
        (used as f64) < self.0
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            f.write_str("unlimited")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_unlimited() {
            serializer.serialize_str("unlimited")
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Limit(n)),
            Raw::Word(w)
                if w.eq_ignore_ascii_case("unlimited") || w.eq_ignore_ascii_case("inf") =>
            {
                Ok(Limit::UNLIMITED)
            }
            Raw::Word(w) => Err(serde::de::Error::custom(format!(
                "invalid limit `{w}`, expected a number or \"unlimited\""
            ))),
        }
    }
}

/// Everything the generator needs to build a prompt for one reply.
///
/// Carries selectors only; persona text is owned by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub channel_id: ChannelId,
    pub mode: Mode,
    pub roast_target: Option<String>,
    /// Recent history as `"speaker: text"` lines, oldest first.
    pub recent: Vec<String>,
    pub speaker: String,
    pub message: String,
    /// Channel topics, oldest first.
    pub topics: Vec<String>,
    /// Latest mood per speaker in the channel.
    pub moods: BTreeMap<String, Mood>,
}

/// Content of an inbound chat message. Identity and reply capability come
/// from the [`QuotaSubject`](crate::traits::QuotaSubject) it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Display name used as the speaker in history.
    pub author_name: String,
    pub text: String,
    /// Number of attachments (images, files) on the message.
    pub attachments: usize,
}

impl InboundMessage {
    pub fn text(author_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            text: text.into(),
            attachments: 0,
        }
    }
}
