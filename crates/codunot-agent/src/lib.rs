// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message handling for Codunot.
//!
//! Ties the channel store and the usage ledger together behind a
//! [`StateManager`], runs each inbound message through [`MessageHandler`]
//! (history, quota gate, generation, reply), and keeps durable state fresh
//! with a background autosave task.

pub mod autosave;
pub mod commands;
pub mod handler;
pub mod retry;
pub mod shutdown;
pub mod state;

pub use autosave::spawn_autosave;
pub use commands::{Command, parse_command};
pub use handler::{HandleOutcome, MessageHandler};
pub use retry::{RetryPolicy, with_retry};
pub use shutdown::install_signal_handler;
pub use state::{PersistPaths, SaveSummary, State, StateManager};
