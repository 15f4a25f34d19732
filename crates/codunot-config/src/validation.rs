// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use codunot_core::Tier;
use strum::IntoEnumIterator;

use crate::diagnostic::ConfigError;
use crate::model::CodunotConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &CodunotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(
            "agent.log_level",
            format!(
                "must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.agent.log_level
            ),
        ));
    }

    if config.agent.name.trim().is_empty() {
        errors.push(ConfigError::validation("agent.name", "must not be empty"));
    }

    if config.agent.command_prefix.trim().is_empty() {
        errors.push(ConfigError::validation(
            "agent.command_prefix",
            "must not be empty",
        ));
    }

    let positive: [(&str, u64); 6] = [
        ("agent.history_window", config.agent.history_window as u64),
        (
            "agent.generation_timeout_secs",
            config.agent.generation_timeout_secs,
        ),
        ("memory.history_limit", config.memory.history_limit as u64),
        ("memory.topic_limit", config.memory.topic_limit as u64),
        (
            "usage.rolling_window_days",
            u64::from(config.usage.rolling_window_days),
        ),
        (
            "usage.autosave_interval_secs",
            config.usage.autosave_interval_secs,
        ),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(ConfigError::validation(key, "must be greater than zero"));
        }
    }

    let paths = [
        ("memory.state_file", &config.memory.state_file),
        ("usage.daily_file", &config.usage.daily_file),
        ("usage.rolling_file", &config.usage.rolling_file),
        ("tiers.premium_file", &config.tiers.premium_file),
        ("tiers.gold_file", &config.tiers.gold_file),
    ];
    for (key, path) in paths {
        if path.trim().is_empty() {
            errors.push(ConfigError::validation(key, "must not be empty"));
        }
    }

    if config.usage.daily_file == config.usage.rolling_file {
        errors.push(ConfigError::validation(
            "usage.rolling_file",
            "must differ from usage.daily_file",
        ));
    }

    for tier in Tier::iter() {
        for (name, limit) in config.tiers.limits_for(tier).named() {
            if limit.0.is_nan() || limit.0 < 0.0 {
                errors.push(ConfigError::validation(
                    format!("tiers.{tier}.{name}"),
                    format!("must be a non-negative number or \"unlimited\", got {}", limit.0),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
