// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented outside the state core.
//!
//! Platform clients adapt their event types to [`QuotaSubject`]; generation
//! API clients implement [`Generator`].

pub mod generator;
pub mod subject;

pub use generator::Generator;
pub use subject::QuotaSubject;
