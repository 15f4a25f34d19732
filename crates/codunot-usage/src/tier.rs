// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static tier membership from allow-list files.

use std::collections::HashSet;
use std::path::Path;

use codunot_config::TiersConfig;
use codunot_core::{CodunotError, EntityKey, Tier};
use tracing::info;

/// Resolves an entity key to its tier. Built once; there is no way to
/// change membership short of constructing a new resolver.
#[derive(Debug, Clone, Default)]
pub struct TierResolver {
    premium: HashSet<String>,
    gold: HashSet<String>,
}

impl TierResolver {
    pub fn new(
        premium: impl IntoIterator<Item = String>,
        gold: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            premium: premium.into_iter().collect(),
            gold: gold.into_iter().collect(),
        }
    }

    /// Read both allow-lists named in the tiers config.
    pub fn from_config(config: &TiersConfig) -> Result<Self, CodunotError> {
        let resolver = Self {
            premium: load_allow_list(Path::new(&config.premium_file))?,
            gold: load_allow_list(Path::new(&config.gold_file))?,
        };
        info!(
            premium = resolver.premium.len(),
            gold = resolver.gold.len(),
            "tier allow-lists loaded"
        );
        Ok(resolver)
    }

    /// Gold wins over premium; anything unlisted is basic.
    pub fn tier_of(&self, key: &EntityKey) -> Tier {
        if self.gold.contains(&key.0) {
            Tier::Gold
        } else if self.premium.contains(&key.0) {
            Tier::Premium
        } else {
            Tier::Basic
        }
    }

    /// Members of `tier`'s list, sorted. Basic has no list and is empty.
    pub fn members(&self, tier: Tier) -> Vec<&str> {
        let set = match tier {
            Tier::Gold => &self.gold,
            Tier::Premium => &self.premium,
            Tier::Basic => return Vec::new(),
        };
        let mut ids: Vec<&str> = set.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Parse allow-list text: one id per line, `#` starts a comment anywhere on
/// the line, surrounding whitespace and blank lines are ignored.
pub fn parse_allow_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .filter_map(|line| {
            let id = line.split('#').next().unwrap_or_default().trim();
            (!id.is_empty()).then(|| id.to_string())
        })
        .collect()
}

/// Read an allow-list file. A missing file is an empty list.
pub fn load_allow_list(path: &Path) -> Result<HashSet<String>, CodunotError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_allow_list(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(CodunotError::Config(format!(
            "cannot read allow-list {}: {e}",
            path.display()
        ))),
    }
}
