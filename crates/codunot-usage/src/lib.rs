// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage accounting for Codunot.
//!
//! Tracks per-entity daily counters and a rolling-window event log, checks
//! them against tier limits, and lets owners through untouched. Tiers come
//! from two static allow-lists loaded at startup.
//!
//! Limit checks return `bool`; the caller replies with [`deny_message`] when
//! a check fails. Consuming past a limit is refused and logged, never raised.

pub mod deny;
pub mod ledger;
pub mod store;
pub mod tier;

pub use deny::deny_message;
pub use ledger::{ConsumeOutcome, OwnerSet, Requester, UsageLedger, UsageLine, UsageReport};
pub use store::{DailyUsage, RollingLog, UsageFiles};
pub use tier::TierResolver;
