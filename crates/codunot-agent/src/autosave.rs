// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic background save of usage and channel state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::StateManager;

/// Spawn the autosave loop.
///
/// Saves every `period` until `cancel` fires, then performs one final save
/// and exits. Await the returned handle during shutdown so that final save
/// completes before the process ends. Save errors are logged and the loop
/// keeps going.
pub fn spawn_autosave(
    state: Arc<StateManager>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "autosave started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match state.save().await {
                        Ok(summary) => debug!(
                            usage = summary.usage,
                            channels = summary.channels,
                            "autosave tick"
                        ),
                        Err(e) => warn!(error = %e, "autosave failed"),
                    }
                }
            }
        }

        match state.save().await {
            Ok(_) => info!("final save complete"),
            Err(e) => warn!(error = %e, "final save failed"),
        }
    })
}
