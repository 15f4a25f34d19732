// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capped conversation history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One remembered utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: String,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// Flattened `"speaker: text"` form handed to prompt construction.
    pub fn line(&self) -> String {
        format!("{}: {}", self.speaker, self.text)
    }
}

/// FIFO buffer holding at most `limit` entries. The oldest entry is dropped
/// first when a push would exceed the cap.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Rebuild from stored entries, keeping only the newest `limit`.
    ///
    /// A lowered limit in config therefore trims restored history on load.
    pub fn from_entries(limit: usize, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut history = Self::new(limit);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// The last `min(n, len)` entries as lines, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).map(HistoryEntry::line).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn evicts_oldest_first() {
        let mut history = History::new(2);
        history.push(HistoryEntry::new("A", "1"));
        history.push(HistoryEntry::new("B", "2"));
        history.push(HistoryEntry::new("C", "3"));
        let kept: Vec<_> = history.entries().cloned().collect();
        assert_eq!(
            kept,
            vec![HistoryEntry::new("B", "2"), HistoryEntry::new("C", "3")]
        );
    }

    #[test]
    fn recent_clamps_to_length() {
        let mut history = History::new(10);
        history.push(HistoryEntry::new("A", "hi"));
        assert_eq!(history.recent(5), vec!["A: hi"]);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn from_entries_trims_to_limit() {
        let entries = (0..5).map(|i| HistoryEntry::new("u", i.to_string()));
        let history = History::from_entries(3, entries);
        assert_eq!(history.recent(10), vec!["u: 2", "u: 3", "u: 4"]);
    }

    proptest! {
        #[test]
        fn retains_most_recent_appends_in_order(
            limit in 1usize..16,
            texts in proptest::collection::vec("[a-z]{0,6}", 0..64),
        ) {
            let mut history = History::new(limit);
            for (i, text) in texts.iter().enumerate() {
                history.push(HistoryEntry::new("s", text.clone()));
                prop_assert!(history.len() <= limit);

                let expected_len = (i + 1).min(limit);
                let expected: Vec<&String> =
                    texts[..=i].iter().skip(i + 1 - expected_len).collect();
                let actual: Vec<&String> = history.entries().map(|e| &e.text).collect();
                prop_assert_eq!(actual, expected);
            }
        }

        #[test]
        fn recent_is_bounded_suffix(
            limit in 1usize..16,
            count in 0usize..40,
            n in 0usize..32,
        ) {
            let mut history = History::new(limit);
            for i in 0..count {
                history.push(HistoryEntry::new("s", i.to_string()));
            }
            let all = history.recent(usize::MAX);
            let recent = history.recent(n);
            prop_assert!(recent.len() <= n.min(limit));
            prop_assert!(all.ends_with(&recent));
        }
    }
}
