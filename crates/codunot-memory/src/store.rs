// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory channel state.
//!
//! Every method is synchronous. Callers that share a store between tasks wrap
//! it in a lock and never hold that lock across an await.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use codunot_core::{ChannelId, CodunotError, Mode, Mood};
use tracing::debug;

use crate::history::{History, HistoryEntry};
use crate::snapshot::{ChannelSnapshot, StoreSnapshot};

#[derive(Debug, Clone)]
struct ChannelState {
    history: History,
    last_activity: Option<DateTime<Utc>>,
    roast_target: Option<String>,
    mode: Mode,
    topics: VecDeque<String>,
    moods: BTreeMap<String, Mood>,
}

/// Topics kept per channel unless [`ChannelStore::with_topic_limit`] says otherwise.
pub const DEFAULT_TOPIC_LIMIT: usize = 10;

/// Conversation state for every channel the bot has seen.
///
/// Channels are created on first write. Reads of an unknown channel return
/// empty values and do not create it.
///
/// The roast target is sticky: nothing here clears it except
/// [`clear_target`](Self::clear_target). Clearing it on a mode change is up
/// to the caller.
#[derive(Debug)]
pub struct ChannelStore {
    channels: HashMap<ChannelId, ChannelState>,
    flags: BTreeSet<String>,
    history_limit: usize,
    topic_limit: usize,
    initial_mode: Mode,
    dirty: bool,
}

impl ChannelStore {
    pub fn new(history_limit: usize, initial_mode: Mode) -> Self {
        Self {
            channels: HashMap::new(),
            flags: BTreeSet::new(),
            history_limit,
            topic_limit: DEFAULT_TOPIC_LIMIT,
            initial_mode,
            dirty: false,
        }
    }

    /// Cap the topics kept per channel. Channels already over the cap drop
    /// their oldest topics.
    pub fn with_topic_limit(mut self, limit: usize) -> Self {
        self.topic_limit = limit;
        for state in self.channels.values_mut() {
            while state.topics.len() > limit {
                state.topics.pop_front();
            }
        }
        self
    }

    fn channel_mut(&mut self, channel: &ChannelId) -> &mut ChannelState {
        self.dirty = true;
        let (limit, mode) = (self.history_limit, self.initial_mode);
        self.channels
            .entry(channel.clone())
            .or_insert_with(|| {
                debug!(channel = %channel, "channel state created");
                ChannelState {
                    history: History::new(limit),
                    last_activity: None,
                    roast_target: None,
                    mode,
                    topics: VecDeque::new(),
                    moods: BTreeMap::new(),
                }
            })
    }

    /// Append to the channel's history and stamp its activity time.
    pub fn append(&mut self, channel: &ChannelId, speaker: &str, text: &str) {
        self.append_at(channel, speaker, text, Utc::now());
    }

    /// [`append`](Self::append) with an explicit clock reading.
    ///
    /// `last_activity` never moves backwards: an earlier `now` keeps the
    /// stored value.
    pub fn append_at(
        &mut self,
        channel: &ChannelId,
        speaker: &str,
        text: &str,
        now: DateTime<Utc>,
    ) {
        let state = self.channel_mut(channel);
        state.history.push(HistoryEntry::new(speaker, text));
        state.last_activity = Some(match state.last_activity {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    /// The last `min(n, len)` entries as `"speaker: text"`, oldest first.
    pub fn recent(&self, channel: &ChannelId, n: usize) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|s| s.history.recent(n))
            .unwrap_or_default()
    }

    pub fn last_activity(&self, channel: &ChannelId) -> Option<DateTime<Utc>> {
        self.channels.get(channel).and_then(|s| s.last_activity)
    }

    pub fn history_len(&self, channel: &ChannelId) -> usize {
        self.channels.get(channel).map_or(0, |s| s.history.len())
    }

    pub fn set_target(&mut self, channel: &ChannelId, name: &str) {
        self.channel_mut(channel).roast_target = Some(name.to_string());
    }

    pub fn get_target(&self, channel: &ChannelId) -> Option<&str> {
        self.channels
            .get(channel)
            .and_then(|s| s.roast_target.as_deref())
    }

    /// Remove the pinned subject, returning it if one was set.
    pub fn clear_target(&mut self, channel: &ChannelId) -> Option<String> {
        let state = self.channels.get_mut(channel)?;
        let previous = state.roast_target.take();
        if previous.is_some() {
            self.dirty = true;
        }
        previous
    }

    pub fn set_mode(&mut self, channel: &ChannelId, mode: Mode) {
        self.channel_mut(channel).mode = mode;
    }

    /// Parse `name` and set it as the channel's mode.
    ///
    /// An unknown name is rejected and leaves the current mode untouched.
    pub fn set_mode_named(
        &mut self,
        channel: &ChannelId,
        name: &str,
    ) -> Result<Mode, CodunotError> {
        let mode = Mode::parse(name)?;
        self.set_mode(channel, mode);
        Ok(mode)
    }

    pub fn get_mode(&self, channel: &ChannelId) -> Mode {
        self.channels
            .get(channel)
            .map_or(self.initial_mode, |s| s.mode)
    }

    /// Remember a topic for the channel. Past the topic limit the oldest
    /// topic is dropped.
    pub fn add_topic(&mut self, channel: &ChannelId, topic: &str) {
        let limit = self.topic_limit;
        let state = self.channel_mut(channel);
        state.topics.push_back(topic.to_string());
        while state.topics.len() > limit {
            state.topics.pop_front();
        }
    }

    /// The channel's topics, oldest first.
    pub fn topics(&self, channel: &ChannelId) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|s| s.topics.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Record the latest mood seen from `user`, replacing any earlier one.
    pub fn set_mood(&mut self, channel: &ChannelId, user: &str, mood: Mood) {
        self.channel_mut(channel)
            .moods
            .insert(user.to_string(), mood);
    }

    /// Latest mood per user, ordered by user name.
    pub fn moods(&self, channel: &ChannelId) -> BTreeMap<String, Mood> {
        self.channels
            .get(channel)
            .map(|s| s.moods.clone())
            .unwrap_or_default()
    }

    /// Set a process-wide flag. Returns `true` if it was not already set.
    pub fn set_flag(&mut self, name: &str) -> bool {
        let inserted = self.flags.insert(name.to_string());
        if inserted {
            self.dirty = true;
        }
        inserted
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether anything changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Flag the store for the next save, e.g. after a failed write.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let channels = self
            .channels
            .iter()
            .map(|(id, state)| {
                (
                    id.clone(),
                    ChannelSnapshot {
                        history: state.history.entries().cloned().collect(),
                        last_activity: state.last_activity,
                        roast_target: state.roast_target.clone(),
                        mode: Some(state.mode),
                        topics: state.topics.iter().cloned().collect(),
                        moods: state.moods.clone(),
                    },
                )
            })
            .collect();
        StoreSnapshot {
            channels,
            flags: self.flags.clone(),
        }
    }

    /// Rebuild a store from a snapshot. Histories longer than
    /// `history_limit` keep their newest entries. A channel saved without a
    /// mode starts in `initial_mode`.
    pub fn restore(history_limit: usize, initial_mode: Mode, snapshot: StoreSnapshot) -> Self {
        let channels = snapshot
            .channels
            .into_iter()
            .map(|(id, snap)| {
                (
                    id,
                    ChannelState {
                        history: History::from_entries(history_limit, snap.history),
                        last_activity: snap.last_activity,
                        roast_target: snap.roast_target,
                        mode: snap.mode.unwrap_or(initial_mode),
                        topics: snap.topics.into(),
                        moods: snap.moods,
                    },
                )
            })
            .collect();
        Self {
            channels,
            flags: snapshot.flags,
            history_limit,
            topic_limit: DEFAULT_TOPIC_LIMIT,
            initial_mode,
            dirty: false,
        }
        .with_topic_limit(DEFAULT_TOPIC_LIMIT)
    }
}
