// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage files on disk.
//!
//! Daily file: `{ "<entity>": { "day": "YYYY-MM-DD", "messages": n, "attachments": n } }`.
//! Rolling file: `{ "attachments": { "<entity>": [unix_seconds, ...] } }`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use codunot_core::persist::{read_json, write_json_atomic};
use codunot_core::{CodunotError, EntityKey, ResourceKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One entity's counters for a single UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub day: NaiveDate,
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub attachments: u64,
}

impl DailyUsage {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            messages: 0,
            attachments: 0,
        }
    }

    pub fn count(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Messages => self.messages,
            ResourceKind::Attachments => self.attachments,
        }
    }

    pub(crate) fn count_mut(&mut self, kind: ResourceKind) -> &mut u64 {
        match kind {
            ResourceKind::Messages => &mut self.messages,
            ResourceKind::Attachments => &mut self.attachments,
        }
    }
}

/// Event timestamps (UNIX seconds) per rolling-limited kind, then per entity.
pub type RollingLog = BTreeMap<ResourceKind, BTreeMap<EntityKey, Vec<f64>>>;

/// Contents of both usage files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageFiles {
    pub daily: BTreeMap<EntityKey, DailyUsage>,
    pub rolling: RollingLog,
}

impl UsageFiles {
    /// Load both files. Each one that is missing or unreadable starts empty;
    /// unreadable ones are logged.
    pub fn load(daily_path: &Path, rolling_path: &Path) -> Self {
        Self {
            daily: load_or_empty(daily_path, "daily usage"),
            rolling: load_or_empty(rolling_path, "rolling usage"),
        }
    }

    /// Write both files atomically. The rolling file is attempted even when
    /// the daily write fails; the first error is returned.
    pub fn save(&self, daily_path: &Path, rolling_path: &Path) -> Result<(), CodunotError> {
        let daily = write_json_atomic(daily_path, &self.daily);
        let rolling = write_json_atomic(rolling_path, &self.rolling);
        daily.and(rolling)
    }
}

fn load_or_empty<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    match read_json(path) {
        Ok(Some(value)) => {
            info!(path = %path.display(), "{what} loaded");
            value
        }
        Ok(None) => T::default(),
        Err(e) => {
            warn!(error = %e, "{what} unreadable, starting empty");
            T::default()
        }
    }
}
