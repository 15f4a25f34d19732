// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel conversation memory.
//!
//! - **History**: capped FIFO buffer of `(speaker, text)` entries
//! - **ChannelStore**: lazily created channel state (history, last activity,
//!   sticky roast target, mode) plus process-wide flags
//! - **Snapshot**: serializable copy of the store for the channel state file

pub mod history;
pub mod snapshot;
pub mod store;

pub use history::{History, HistoryEntry};
pub use snapshot::{ChannelSnapshot, StoreSnapshot};
pub use store::{ChannelStore, DEFAULT_TOPIC_LIMIT};
