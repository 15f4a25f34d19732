// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TestHarness builder for end-to-end handler testing.
//!
//! Wires a [`StateManager`] and [`MessageHandler`] to a [`MockGenerator`],
//! with every state file inside a temporary directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use codunot_agent::{HandleOutcome, MessageHandler, RetryPolicy, StateManager};
use codunot_config::CodunotConfig;
use codunot_core::{CodunotError, InboundMessage, QuotaSubject};
use tempfile::TempDir;
use tracing::debug;

use crate::mock_generator::MockGenerator;
use crate::mock_subject::MockSubject;

type ConfigTweak = Box<dyn FnOnce(&mut CodunotConfig)>;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    owner_ids: Vec<String>,
    premium: Vec<String>,
    gold: Vec<String>,
    persist: bool,
    tweak: Option<ConfigTweak>,
    temp_dir: Option<TempDir>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            owner_ids: Vec::new(),
            premium: Vec::new(),
            gold: Vec::new(),
            persist: false,
            tweak: None,
            temp_dir: None,
        }
    }

    /// Replies the generator returns in order before falling back to
    /// [`MockGenerator::DEFAULT_REPLY`].
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_owner(mut self, id: &str) -> Self {
        self.owner_ids.push(id.to_string());
        self
    }

    /// Write `key` into the premium allow-list file.
    pub fn with_premium(mut self, key: &str) -> Self {
        self.premium.push(key.to_string());
        self
    }

    /// Write `key` into the gold allow-list file.
    pub fn with_gold(mut self, key: &str) -> Self {
        self.gold.push(key.to_string());
        self
    }

    /// Persist channel state to the temp directory.
    pub fn with_persistence(mut self) -> Self {
        self.persist = true;
        self
    }

    /// Adjust the configuration after paths have been pointed at the temp
    /// directory.
    pub fn with_config(mut self, tweak: impl FnOnce(&mut CodunotConfig) + 'static) -> Self {
        self.tweak = Some(Box::new(tweak));
        self
    }

    /// Reuse an existing directory, e.g. to reload state written by an
    /// earlier harness.
    pub fn in_dir(mut self, dir: TempDir) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    pub fn build(self) -> Result<TestHarness, CodunotError> {
        let temp_dir = match self.temp_dir {
            Some(dir) => dir,
            None => TempDir::new().map_err(|e| CodunotError::Internal(e.to_string()))?,
        };
        let root = temp_dir.path();

        let path = |name: &str| root.join(name).to_string_lossy().into_owned();
        let mut config = CodunotConfig::default();
        config.usage.daily_file = path("daily_usage.json");
        config.usage.rolling_file = path("total_usage.json");
        config.usage.owner_ids = self.owner_ids;
        config.tiers.premium_file = path("tiers_premium.txt");
        config.tiers.gold_file = path("tiers_gold.txt");
        config.memory.state_file = path("channel_state.json");
        config.memory.persist = self.persist;
        if let Some(tweak) = self.tweak {
            tweak(&mut config);
        }

        write_allow_list(Path::new(&config.tiers.premium_file), &self.premium)?;
        write_allow_list(Path::new(&config.tiers.gold_file), &self.gold)?;

        let state = Arc::new(StateManager::from_config(&config)?);
        let generator = Arc::new(MockGenerator::with_responses(self.responses));
        let handler = MessageHandler::new(state.clone(), generator.clone(), &config)
            .with_retry_policy(RetryPolicy {
                retries: config.agent.generation_retries,
                base_delay: Duration::from_millis(1),
                timeout: Duration::from_millis(500),
            });

        debug!(dir = %root.display(), persist = config.memory.persist, "test harness ready");
        Ok(TestHarness {
            handler,
            state,
            generator,
            config,
            temp_dir,
        })
    }
}

fn write_allow_list(path: &Path, keys: &[String]) -> Result<(), CodunotError> {
    if keys.is_empty() {
        return Ok(());
    }
    let body = format!("# test allow-list\n{}\n", keys.join("\n"));
    std::fs::write(path, body).map_err(|e| CodunotError::persistence(path, e))
}

/// A handler over mock collaborators and temporary state files.
pub struct TestHarness {
    pub handler: MessageHandler,
    pub state: Arc<StateManager>,
    pub generator: Arc<MockGenerator>,
    pub config: CodunotConfig,
    temp_dir: TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send a plain text message from `subject`.
    pub async fn send(
        &self,
        subject: &MockSubject,
        text: &str,
    ) -> Result<HandleOutcome, CodunotError> {
        let message = InboundMessage::text(subject_name(subject), text);
        self.handler.handle(subject, &message).await
    }

    /// Send a message carrying `attachments` attachments.
    pub async fn send_with_attachments(
        &self,
        subject: &MockSubject,
        text: &str,
        attachments: usize,
    ) -> Result<HandleOutcome, CodunotError> {
        let mut message = InboundMessage::text(subject_name(subject), text);
        message.attachments = attachments;
        self.handler.handle(subject, &message).await
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Drop the handler and hand back the directory so a fresh harness can
    /// reload from it.
    pub fn into_dir(self) -> TempDir {
        self.temp_dir
    }
}

fn subject_name(subject: &MockSubject) -> String {
    subject.author_id().to_string()
}
