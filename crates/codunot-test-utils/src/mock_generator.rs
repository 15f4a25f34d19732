// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted generator for deterministic testing.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use codunot_core::{CodunotError, Generator, PromptContext};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Step {
    Reply(String),
    Fail(String),
    Stall(Duration),
}

/// A generator that plays back queued steps, then a default reply.
///
/// Every context it receives is recorded for assertions.
#[derive(Debug, Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<PromptContext>>,
}

impl MockGenerator {
    pub const DEFAULT_REPLY: &'static str = "mock reply";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Step::Reply).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_reply(&self, text: &str) {
        self.script.lock().await.push_back(Step::Reply(text.to_string()));
    }

    /// Queue a provider error.
    pub async fn push_failure(&self, message: &str) {
        self.script.lock().await.push_back(Step::Fail(message.to_string()));
    }

    /// Queue a call that sleeps for `delay` before replying.
    pub async fn push_stall(&self, delay: Duration) {
        self.script.lock().await.push_back(Step::Stall(delay));
    }

    pub async fn contexts(&self) -> Vec<PromptContext> {
        self.seen.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.seen.lock().await.len()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
    }

    async fn generate(&self, context: &PromptContext) -> Result<String, CodunotError> {
        self.seen.lock().await.push(context.clone());
        let step = self.script.lock().await.pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(message)) => Err(CodunotError::Provider {
                message,
                source: None,
            }),
            Some(Step::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Self::DEFAULT_REPLY.to_string())
            }
            None => Ok(Self::DEFAULT_REPLY.to_string()),
        }
    }
}
