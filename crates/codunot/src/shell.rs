// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `codunot shell` command implementation.
//!
//! Launches an interactive REPL that acts as one local console channel and
//! drives the full message handler: history, quota, modes, and commands.
//! Replies come from an offline generator that describes the context it was
//! given. State is autosaved in the background and saved once more on exit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codunot_agent::{
    HandleOutcome, MessageHandler, StateManager, install_signal_handler, spawn_autosave,
};
use codunot_config::CodunotConfig;
use codunot_core::{
    ChannelId, CodunotError, Generator, InboundMessage, Mode, Mood, PromptContext, QuotaSubject,
};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, info};

const CONSOLE_CHANNEL: &str = "console";

/// Stands in for a real model: reports what it would have been asked.
#[derive(Debug, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl Generator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, context: &PromptContext) -> Result<String, CodunotError> {
        Ok(describe(context))
    }
}

fn describe(context: &PromptContext) -> String {
    let mut out = format!(
        "[{} mode] {} said \"{}\" with {} line(s) of context",
        context.mode,
        context.speaker,
        context.message,
        context.recent.len()
    );
    if let (Mode::Roast, Some(target)) = (context.mode, context.roast_target.as_deref()) {
        out.push_str(&format!(", roasting {target}"));
    }
    match context.moods.get(&context.speaker) {
        Some(Mood::Neutral) | None => {}
        Some(mood) => out.push_str(&format!(", feeling {mood}")),
    }
    if let Some(topic) = context.topics.last() {
        out.push_str(&format!(", topic \"{topic}\""));
    }
    out
}

/// The terminal as a direct-message channel.
struct ConsoleSubject {
    channel: ChannelId,
    author: String,
    bot_name: String,
}

#[async_trait]
impl QuotaSubject for ConsoleSubject {
    fn channel_id(&self) -> &ChannelId {
        &self.channel
    }

    fn guild_id(&self) -> Option<&str> {
        None
    }

    fn author_id(&self) -> &str {
        &self.author
    }

    async fn reply(&self, text: &str) -> Result<(), CodunotError> {
        println!("{} {text}\n", format!("{}>", self.bot_name).cyan().bold());
        Ok(())
    }
}

/// Runs the `codunot shell` interactive REPL.
pub async fn run_shell(config: CodunotConfig) -> Result<(), CodunotError> {
    let state = Arc::new(StateManager::from_config(&config)?);
    let generator: Arc<dyn Generator> = Arc::new(OfflineGenerator);
    let handler = MessageHandler::new(state.clone(), generator, &config);

    let cancel = install_signal_handler();
    let autosave = spawn_autosave(
        state.clone(),
        Duration::from_secs(config.usage.autosave_interval_secs),
        cancel.clone(),
    );

    let session_id = uuid::Uuid::new_v4();
    let author = std::env::var("USER").unwrap_or_else(|_| "local".to_string());
    info!(session = %session_id, author = %author, "shell session started");

    let subject = ConsoleSubject {
        channel: ChannelId::from(CONSOLE_CHANNEL),
        author: author.clone(),
        bot_name: config.agent.name.clone(),
    };

    let (mut lines, next) = spawn_reader(format!("{}> ", author.green()))?;

    println!("{}", format!("{} shell", config.agent.name).bold().green());
    println!(
        "Type {} to exit, {} to save now. Chat commands start with {}.\n",
        "/quit".yellow(),
        "/save".yellow(),
        config.agent.command_prefix.yellow()
    );

    let mut interrupted = false;
    loop {
        let input = tokio::select! {
            _ = cancel.cancelled() => {
                interrupted = true;
                break;
            }
            input = lines.recv() => input,
        };
        let line = match input {
            Some(Input::Line(line)) => line,
            Some(Input::Closed) | None => break,
            Some(Input::Failed(e)) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        match line.as_str() {
            "/quit" | "/exit" => break,
            "/save" => match state.save().await {
                Ok(summary) => {
                    let saved = format!(
                        "saved (usage: {}, channels: {})",
                        summary.usage, summary.channels
                    );
                    println!("{}", saved.dimmed());
                }
                Err(e) => eprintln!("{}: {e}", "error".red()),
            },
            _ => {
                let message = InboundMessage::text(author.clone(), line.as_str());
                match handler.handle(&subject, &message).await {
                    Ok(HandleOutcome::Denied(kind)) => {
                        debug!(kind = %kind, "console message denied")
                    }
                    Ok(outcome) => debug!(?outcome, "console message handled"),
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
        }
        if next.send(()).is_err() {
            break;
        }
    }

    cancel.cancel();
    autosave
        .await
        .map_err(|e| CodunotError::Internal(format!("autosave task failed: {e}")))?;
    println!("{}", "goodbye".dimmed());

    if interrupted {
        // The reader thread is still blocked in readline.
        std::process::exit(0);
    }
    Ok(())
}

enum Input {
    Line(String),
    Closed,
    Failed(String),
}

/// Read lines on a dedicated thread that owns the editor.
///
/// The thread prompts again only after a unit arrives on the returned
/// sender, so replies print before the next prompt.
fn spawn_reader(
    prompt: String,
) -> Result<(mpsc::Receiver<Input>, std::sync::mpsc::Sender<()>), CodunotError> {
    let (line_tx, line_rx) = mpsc::channel(1);
    let (next_tx, next_rx) = std::sync::mpsc::channel::<()>();

    std::thread::Builder::new()
        .name("shell-readline".to_string())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    let _ = line_tx.blocking_send(Input::Failed(format!(
                        "failed to initialize readline: {e}"
                    )));
                    return;
                }
            };
            loop {
                let input = match editor.readline(&prompt) {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        let _ = editor.add_history_entry(trimmed);
                        Input::Line(trimmed.to_string())
                    }
                    Err(ReadlineError::Interrupted | ReadlineError::Eof) => Input::Closed,
                    Err(e) => Input::Failed(e.to_string()),
                };
                let last = !matches!(input, Input::Line(_));
                if line_tx.blocking_send(input).is_err() || last || next_rx.recv().is_err() {
                    return;
                }
            }
        })
        .map_err(|e| CodunotError::Internal(format!("failed to start readline thread: {e}")))?;

    Ok((line_rx, next_tx))
}
