// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Codunot integration tests.
//!
//! - [`MockSubject`] - an inbound event that captures replies
//! - [`MockGenerator`] - scripted generator with captured prompt contexts
//! - [`TestHarness`] - state manager and handler over a temp directory

pub mod harness;
pub mod mock_generator;
pub mod mock_subject;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_generator::MockGenerator;
pub use mock_subject::MockSubject;
