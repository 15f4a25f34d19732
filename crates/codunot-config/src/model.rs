// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Codunot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error instead of a silently ignored setting.

use codunot_core::{Limit, Mode, ResourceKind, Tier};
use serde::{Deserialize, Serialize};

/// Top-level Codunot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodunotConfig {
    /// Bot identity and message-handling settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Per-channel conversation memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Usage accounting and persistence settings.
    #[serde(default)]
    pub usage: UsageConfig,

    /// Tier allow-lists and per-tier limits.
    #[serde(default)]
    pub tiers: TiersConfig,
}

/// Bot identity and message-handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Speaker name recorded in history for the bot's own replies.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of history entries handed to the generator per reply.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Timeout for a single generation call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Extra attempts after a failed generation call.
    #[serde(default = "default_generation_retries")]
    pub generation_retries: u32,

    /// Base delay between attempts; doubled after each failure.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Prefix that marks a chat message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            history_window: default_history_window(),
            generation_timeout_secs: default_generation_timeout_secs(),
            generation_retries: default_generation_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_agent_name() -> String {
    "codunot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_window() -> usize {
    20
}

fn default_generation_timeout_secs() -> u64 {
    30
}

fn default_generation_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Per-channel conversation memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum history entries kept per channel; oldest are evicted first.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum topics remembered per channel; oldest are evicted first.
    #[serde(default = "default_topic_limit")]
    pub topic_limit: usize,

    /// Mode a channel starts in until a mode command changes it.
    #[serde(default)]
    pub initial_mode: Mode,

    /// Save channel state on the autosave cadence and reload it at start.
    #[serde(default)]
    pub persist: bool,

    /// Path of the channel state JSON file.
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            topic_limit: default_topic_limit(),
            initial_mode: Mode::Default,
            persist: false,
            state_file: default_state_file(),
        }
    }
}

fn default_history_limit() -> usize {
    60
}

fn default_topic_limit() -> usize {
    10
}

fn default_state_file() -> String {
    "channel_state.json".to_string()
}

/// Usage accounting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    /// Path of the daily usage JSON file.
    #[serde(default = "default_daily_file")]
    pub daily_file: String,

    /// Path of the rolling usage JSON file.
    #[serde(default = "default_rolling_file")]
    pub rolling_file: String,

    /// Length of the rolling window in days.
    #[serde(default = "default_rolling_window_days")]
    pub rolling_window_days: u32,

    /// Seconds between background saves of usage and channel state.
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,

    /// Author ids that bypass every limit.
    #[serde(default)]
    pub owner_ids: Vec<String>,

    /// Who to contact for an upgrade, appended to denial messages.
    #[serde(default)]
    pub upgrade_contact: Option<String>,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            daily_file: default_daily_file(),
            rolling_file: default_rolling_file(),
            rolling_window_days: default_rolling_window_days(),
            autosave_interval_secs: default_autosave_interval_secs(),
            owner_ids: Vec::new(),
            upgrade_contact: None,
        }
    }
}

fn default_daily_file() -> String {
    "daily_usage.json".to_string()
}

fn default_rolling_file() -> String {
    "total_usage.json".to_string()
}

fn default_rolling_window_days() -> u32 {
    60
}

fn default_autosave_interval_secs() -> u64 {
    300 // 5 minutes
}

/// Tier allow-lists and limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// Allow-list file of premium entity ids.
    #[serde(default = "default_premium_file")]
    pub premium_file: String,

    /// Allow-list file of gold entity ids.
    #[serde(default = "default_gold_file")]
    pub gold_file: String,

    #[serde(default = "TierLimits::basic")]
    pub basic: TierLimits,

    #[serde(default = "TierLimits::premium")]
    pub premium: TierLimits,

    #[serde(default = "TierLimits::gold")]
    pub gold: TierLimits,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            premium_file: default_premium_file(),
            gold_file: default_gold_file(),
            basic: TierLimits::basic(),
            premium: TierLimits::premium(),
            gold: TierLimits::gold(),
        }
    }
}

impl TiersConfig {
    /// Limits that apply to `tier`.
    pub fn limits_for(&self, tier: Tier) -> &TierLimits {
        match tier {
            Tier::Basic => &self.basic,
            Tier::Premium => &self.premium,
            Tier::Gold => &self.gold,
        }
    }
}

fn default_premium_file() -> String {
    "tiers_premium.txt".to_string()
}

fn default_gold_file() -> String {
    "tiers_gold.txt".to_string()
}

/// Limits for a single tier. Every field accepts a number or `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierLimits {
    pub daily_messages: Limit,
    pub daily_attachments: Limit,
    /// Attachments allowed across the rolling window.
    pub rolling_attachments: Limit,
}

impl TierLimits {
    pub fn basic() -> Self {
        Self {
            daily_messages: Limit::new(50),
            daily_attachments: Limit::new(7),
            rolling_attachments: Limit::new(30),
        }
    }

    pub fn premium() -> Self {
        Self {
            daily_messages: Limit::new(100),
            daily_attachments: Limit::new(15),
            rolling_attachments: Limit::new(50),
        }
    }

    pub fn gold() -> Self {
        Self {
            daily_messages: Limit::UNLIMITED,
            daily_attachments: Limit::new(25),
            rolling_attachments: Limit::new(100),
        }
    }

    /// Daily ceiling for `kind`.
    pub fn daily(&self, kind: ResourceKind) -> Limit {
        match kind {
            ResourceKind::Messages => self.daily_messages,
            ResourceKind::Attachments => self.daily_attachments,
        }
    }

    /// Rolling-window ceiling for `kind`, `None` when the kind is only
    /// limited per day.
    pub fn rolling(&self, kind: ResourceKind) -> Option<Limit> {
        match kind {
            ResourceKind::Attachments => Some(self.rolling_attachments),
            ResourceKind::Messages => None,
        }
    }

    /// Named limits, for validation messages.
    pub(crate) fn named(&self) -> [(&'static str, Limit); 3] {
        [
            ("daily_messages", self.daily_messages),
            ("daily_attachments", self.daily_attachments),
            ("rolling_attachments", self.rolling_attachments),
        ]
    }
}
