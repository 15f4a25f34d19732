// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text generation backend trait.

use async_trait::async_trait;

use crate::error::CodunotError;
use crate::types::PromptContext;

/// A text generation backend.
///
/// Implementations own persona text and prompt layout; the state core only
/// decides whether a call is allowed and what context it receives.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Produce a reply for the given context.
    async fn generate(&self, context: &PromptContext) -> Result<String, CodunotError>;
}
