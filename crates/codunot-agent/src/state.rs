// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide conversation and usage state behind one lock.

use std::path::PathBuf;

use codunot_config::CodunotConfig;
use codunot_core::CodunotError;
use codunot_memory::{ChannelStore, StoreSnapshot};
use codunot_usage::{TierResolver, UsageFiles, UsageLedger};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// The stores guarded by [`StateManager`].
///
/// All methods on both stores are synchronous, so a guard is never held
/// across an await by the code in this crate.
#[derive(Debug)]
pub struct State {
    pub channels: ChannelStore,
    pub usage: UsageLedger,
}

/// Where [`StateManager::save`] writes.
#[derive(Debug, Clone)]
pub struct PersistPaths {
    pub daily_file: PathBuf,
    pub rolling_file: PathBuf,
    /// `None` keeps channel state in memory only.
    pub state_file: Option<PathBuf>,
}

impl PersistPaths {
    pub fn from_config(config: &CodunotConfig) -> Self {
        Self {
            daily_file: PathBuf::from(&config.usage.daily_file),
            rolling_file: PathBuf::from(&config.usage.rolling_file),
            state_file: config
                .memory
                .persist
                .then(|| PathBuf::from(&config.memory.state_file)),
        }
    }
}

/// What a save actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub usage: bool,
    pub channels: bool,
}

/// Owns the channel store and usage ledger for the whole process.
///
/// Construct one per process (or per test) and share it via `Arc`.
#[derive(Debug)]
pub struct StateManager {
    state: Mutex<State>,
    /// Held for a whole save so snapshots reach disk in the order taken.
    save_lock: Mutex<()>,
    paths: PersistPaths,
}

impl StateManager {
    pub fn new(channels: ChannelStore, usage: UsageLedger, paths: PersistPaths) -> Self {
        Self {
            state: Mutex::new(State { channels, usage }),
            save_lock: Mutex::new(()),
            paths,
        }
    }

    /// Build from configuration: read allow-lists, restore usage files, and
    /// restore channel state when persistence is on.
    ///
    /// Unreadable state files are logged and replaced by empty state; only an
    /// unreadable allow-list is an error.
    pub fn from_config(config: &CodunotConfig) -> Result<Self, CodunotError> {
        let paths = PersistPaths::from_config(config);

        let tiers = TierResolver::from_config(&config.tiers)?;
        let mut usage = UsageLedger::from_config(tiers, config.tiers.clone(), &config.usage);
        usage.restore(UsageFiles::load(&paths.daily_file, &paths.rolling_file));

        let memory = &config.memory;
        let channels = match &paths.state_file {
            Some(path) => ChannelStore::restore(
                memory.history_limit,
                memory.initial_mode,
                StoreSnapshot::load(path),
            ),
            None => ChannelStore::new(memory.history_limit, memory.initial_mode),
        }
        .with_topic_limit(memory.topic_limit);

        info!(
            channels = channels.channel_count(),
            persist_channels = paths.state_file.is_some(),
            "state manager ready"
        );
        Ok(Self::new(channels, usage, paths))
    }

    pub async fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().await
    }

    pub fn paths(&self) -> &PersistPaths {
        &self.paths
    }

    /// Write whatever changed since the last save.
    ///
    /// Copies dirty state under the lock, releases it, then writes on a
    /// blocking thread. A failed write flags the store dirty again so the
    /// next save retries it. Concurrent saves run one after another.
    pub async fn save(&self) -> Result<SaveSummary, CodunotError> {
        let _saving = self.save_lock.lock().await;
        let (usage, channels) = {
            let mut state = self.state.lock().await;
            let usage = state.usage.is_dirty().then(|| state.usage.files());
            let channels = match self.paths.state_file {
                Some(_) if state.channels.is_dirty() => Some(state.channels.snapshot()),
                _ => None,
            };
            if usage.is_some() {
                state.usage.mark_clean();
            }
            if channels.is_some() {
                state.channels.mark_clean();
            }
            (usage, channels)
        };

        if usage.is_none() && channels.is_none() {
            debug!("nothing to save");
            return Ok(SaveSummary::default());
        }

        let summary = SaveSummary {
            usage: usage.is_some(),
            channels: channels.is_some(),
        };
        let paths = self.paths.clone();
        let (usage_result, channel_result) = tokio::task::spawn_blocking(move || {
            let usage_result = usage
                .map(|files| files.save(&paths.daily_file, &paths.rolling_file))
                .unwrap_or(Ok(()));
            let channel_result = match (channels, &paths.state_file) {
                (Some(snapshot), Some(path)) => snapshot.save(path),
                _ => Ok(()),
            };
            (usage_result, channel_result)
        })
        .await
        .map_err(|e| CodunotError::Internal(format!("save task failed: {e}")))?;

        if usage_result.is_err() || channel_result.is_err() {
            let mut state = self.state.lock().await;
            if usage_result.is_err() {
                state.usage.mark_dirty();
            }
            if channel_result.is_err() {
                state.channels.mark_dirty();
            }
        }
        usage_result.and(channel_result)?;

        debug!(usage = summary.usage, channels = summary.channels, "state saved");
        Ok(summary)
    }
}
