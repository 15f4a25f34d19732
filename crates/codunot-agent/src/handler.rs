// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message pipeline.
//!
//! For each message: record it in history, gate it on quota, read the mode
//! and roast target, generate a reply, send it, and record the reply. The
//! state lock is taken only around the synchronous store calls, never
//! across generation or the outbound reply.
//!
//! Quota is charged before generation and is not refunded if generation
//! fails.

use std::sync::Arc;

use codunot_config::CodunotConfig;
use codunot_core::{
    ChannelId, CodunotError, Generator, InboundMessage, Mode, Mood, PromptContext, QuotaSubject,
    ResourceKind,
};
use codunot_usage::{OwnerSet, Requester};
use tracing::{debug, info, warn};

use crate::commands::{Command, parse_command};
use crate::retry::{RetryPolicy, with_retry};
use crate::state::StateManager;

/// Sent when generation fails after all retries.
pub const GENERATION_FAILED_REPLY: &str =
    "⚠️ I couldn't come up with a reply just now. Try again in a moment.";

/// A message containing one of these words is remembered as a channel topic.
const TOPIC_WORDS: [&str; 3] = ["today", "topic", "talk"];

fn is_topic_starter(text: &str) -> bool {
    let lower = text.to_lowercase();
    TOPIC_WORDS.iter().any(|word| lower.contains(word))
}

/// What [`MessageHandler::handle`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A generated reply was sent.
    Replied(String),
    /// A chat command was answered.
    Command,
    /// A limit check failed; the denial message was sent.
    Denied(ResourceKind),
    /// Generation failed after retries; an apology was sent.
    GenerationFailed,
    /// Nothing to respond to.
    Ignored,
}

/// Drives one inbound message at a time through the state core.
pub struct MessageHandler {
    state: Arc<StateManager>,
    generator: Arc<dyn Generator>,
    owners: OwnerSet,
    bot_name: String,
    history_window: usize,
    command_prefix: String,
    retry: RetryPolicy,
}

impl MessageHandler {
    pub fn new(
        state: Arc<StateManager>,
        generator: Arc<dyn Generator>,
        config: &CodunotConfig,
    ) -> Self {
        Self {
            state,
            generator,
            owners: OwnerSet::from_config(&config.usage),
            bot_name: config.agent.name.clone(),
            history_window: config.agent.history_window,
            command_prefix: config.agent.command_prefix.clone(),
            retry: RetryPolicy::from_config(&config.agent),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    pub async fn handle(
        &self,
        subject: &dyn QuotaSubject,
        message: &InboundMessage,
    ) -> Result<HandleOutcome, CodunotError> {
        let text = message.text.trim();
        if text.is_empty() && message.attachments == 0 {
            return Ok(HandleOutcome::Ignored);
        }

        let requester = Requester::resolve(subject, &self.owners);
        let channel = subject.channel_id().clone();

        if let Some(command) = parse_command(&self.command_prefix, text) {
            let reply = self.run_command(&channel, &requester, command).await;
            subject.reply(&reply).await?;
            return Ok(HandleOutcome::Command);
        }

        let context = {
            let mut state = self.state.lock().await;
            let recent = state.channels.recent(&channel, self.history_window);
            state.channels.append(&channel, &message.author_name, text);
            if !text.is_empty() {
                state
                    .channels
                    .set_mood(&channel, &message.author_name, Mood::detect(text));
                if is_topic_starter(text) {
                    state.channels.add_topic(&channel, text);
                }
            }

            let mut gated = vec![ResourceKind::Messages];
            if message.attachments > 0 {
                gated.push(ResourceKind::Attachments);
            }
            for &kind in &gated {
                let allowed = state.usage.check_daily(&requester, kind)
                    && state.usage.check_rolling(&requester, kind);
                if !allowed {
                    let denial = state.usage.deny_message(&requester.key, kind);
                    drop(state);
                    info!(key = %requester.key, kind = %kind, "request denied by quota");
                    subject.reply(&denial).await?;
                    return Ok(HandleOutcome::Denied(kind));
                }
            }
            for &kind in &gated {
                state.usage.consume_daily(&requester, kind);
                state.usage.consume_rolling(&requester, kind);
            }

            let mode = state.channels.get_mode(&channel);
            PromptContext {
                channel_id: channel.clone(),
                mode,
                roast_target: match mode {
                    Mode::Roast => state.channels.get_target(&channel).map(str::to_string),
                    _ => None,
                },
                recent,
                speaker: message.author_name.clone(),
                message: text.to_string(),
                topics: state.channels.topics(&channel),
                moods: state.channels.moods(&channel),
            }
        };

        let generator = self.generator.clone();
        let generated = with_retry(&self.retry, generator.name(), || {
            let generator = generator.clone();
            let context = context.clone();
            async move { generator.generate(&context).await }
        })
        .await;

        let reply = match generated {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!(
                    channel = %channel,
                    generator = self.generator.name(),
                    "empty generation"
                );
                subject.reply(GENERATION_FAILED_REPLY).await?;
                return Ok(HandleOutcome::GenerationFailed);
            }
            Err(e) => {
                warn!(
                    channel = %channel,
                    generator = self.generator.name(),
                    error = %e,
                    "generation failed"
                );
                subject.reply(GENERATION_FAILED_REPLY).await?;
                return Ok(HandleOutcome::GenerationFailed);
            }
        };

        subject.reply(&reply).await?;
        self.state
            .lock()
            .await
            .channels
            .append(&channel, &self.bot_name, &reply);
        debug!(channel = %channel, mode = %context.mode, len = reply.len(), "replied");
        Ok(HandleOutcome::Replied(reply))
    }

    async fn run_command(
        &self,
        channel: &ChannelId,
        requester: &Requester,
        command: Command,
    ) -> String {
        let mut state = self.state.lock().await;
        match command {
            Command::Mode(None) => format!(
                "Current mode: **{}**. Available: {}.",
                state.channels.get_mode(channel),
                Mode::names().join(", ")
            ),
            Command::Mode(Some(name)) => match state.channels.set_mode_named(channel, &name) {
                Ok(mode) => {
                    if mode != Mode::Roast && state.channels.clear_target(channel).is_some() {
                        debug!(channel = %channel, "roast target cleared by mode change");
                    }
                    info!(channel = %channel, mode = %mode, "mode changed");
                    format!("✅ Mode set to **{mode}**.")
                }
                Err(CodunotError::InvalidMode { value }) => format!(
                    "❌ Unknown mode `{value}`. Valid modes: {}.",
                    Mode::names().join(", ")
                ),
                Err(e) => {
                    warn!(channel = %channel, error = %e, "mode change failed");
                    "❌ Could not change mode.".to_string()
                }
            },
            Command::Roast(None) => format!("Usage: {}roast <name>", self.command_prefix),
            Command::Roast(Some(name)) => {
                state.channels.set_target(channel, &name);
                state.channels.set_mode(channel, Mode::Roast);
                info!(channel = %channel, "roast target set");
                format!("🔥 Roast target locked: **{name}**.")
            }
            Command::Unroast => match state.channels.clear_target(channel) {
                Some(name) => format!("Roast target **{name}** cleared."),
                None => "No roast target set.".to_string(),
            },
            Command::Usage => {
                let mut report = state.usage.report(&requester.key).to_string();
                if requester.is_owner {
                    report.push_str("(owner: limits bypassed)\n");
                }
                report
            }
        }
    }
}
