// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk form of the channel store.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use codunot_core::persist::{read_json, write_json_atomic};
use codunot_core::{ChannelId, CodunotError, Mode, Mood};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::history::HistoryEntry;

/// Everything [`ChannelStore`](crate::ChannelStore) needs to come back after
/// a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub channels: BTreeMap<ChannelId, ChannelSnapshot>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roast_target: Option<String>,
    /// `None` when the file predates per-channel modes; restore then uses
    /// the configured initial mode.
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub moods: BTreeMap<String, Mood>,
}

impl StoreSnapshot {
    /// Load the channel state file.
    ///
    /// A missing file is a fresh start. A corrupt or unreadable file is
    /// logged and also treated as a fresh start.
    pub fn load(path: &Path) -> Self {
        match read_json::<StoreSnapshot>(path) {
            Ok(Some(snapshot)) => {
                info!(
                    path = %path.display(),
                    channels = snapshot.channels.len(),
                    "channel state restored"
                );
                snapshot
            }
            Ok(None) => StoreSnapshot::default(),
            Err(e) => {
                warn!(error = %e, "channel state unreadable, starting empty");
                StoreSnapshot::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CodunotError> {
        write_json_atomic(path, self)
    }
}
