// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./codunot.toml` > `~/.config/codunot/codunot.toml` >
//! `/etc/codunot/codunot.toml`, with `CODUNOT_*` environment overrides on top.

// figment::Error is external and cannot be boxed without a wrapper.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CodunotConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/codunot/codunot.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "codunot.toml";

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("codunot").join(LOCAL_CONFIG_FILE))
}

/// Build the layered Figment without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/codunot/codunot.toml`
/// 3. `~/.config/codunot/codunot.toml`
/// 4. `./codunot.toml`
/// 5. `CODUNOT_*` environment variables
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(CodunotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<CodunotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults.
///
/// Environment variables are not consulted, which keeps tests hermetic.
pub fn load_config_from_str(toml_content: &str) -> Result<CodunotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CodunotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CodunotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CodunotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Map `CODUNOT_<SECTION>_<KEY>` onto `section.key`.
///
/// Figment passes the key with its original case, so it is lowercased before
/// matching. Only the first underscore after a known section is turned into a
/// dot, so `CODUNOT_USAGE_OWNER_IDS` becomes `usage.owner_ids`.
fn env_provider() -> Env {
    Env::prefixed("CODUNOT_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = ["agent", "memory", "usage", "tiers"]
            .iter()
            .find_map(|section| {
                key_str
                    .as_str()
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key_str);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_maps_section_prefix_to_dotted_key() {
        Jail::expect_with(|jail| {
            jail.set_env("CODUNOT_USAGE_OWNER_IDS", "[\"42\", \"7\"]");
            jail.set_env("CODUNOT_MEMORY_HISTORY_LIMIT", "12");
            jail.set_env("CODUNOT_AGENT_NAME", "envbot");

            let config: CodunotConfig = Figment::new()
                .merge(Serialized::defaults(CodunotConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.usage.owner_ids, vec!["42", "7"]);
            assert_eq!(config.memory.history_limit, 12);
            assert_eq!(config.agent.name, "envbot");
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
[usage]
rolling_window_days = 30
"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.usage.rolling_window_days, 30);
            assert_eq!(config.usage.autosave_interval_secs, 300);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[agent]\nname = \"from-file\"\n")?;
            jail.set_env("CODUNOT_AGENT_NAME", "from-env");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.agent.name, "from-env");
            Ok(())
        });
    }
}
