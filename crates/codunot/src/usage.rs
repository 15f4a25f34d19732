// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `codunot usage` and `codunot tiers` command implementations.
//!
//! Both read the persisted files directly and never write them.

use std::path::Path;

use codunot_config::CodunotConfig;
use codunot_core::{CodunotError, EntityKey, Tier};
use codunot_usage::{TierResolver, UsageFiles, UsageLedger, UsageReport};
use serde::Serialize;

/// Structured allow-list output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct TiersResponse {
    pub premium: Vec<String>,
    pub gold: Vec<String>,
}

/// Ledger restored from the configured usage files.
fn load_ledger(config: &CodunotConfig) -> Result<UsageLedger, CodunotError> {
    let tiers = TierResolver::from_config(&config.tiers)?;
    let mut ledger = UsageLedger::from_config(tiers, config.tiers.clone(), &config.usage);
    ledger.restore(UsageFiles::load(
        Path::new(&config.usage.daily_file),
        Path::new(&config.usage.rolling_file),
    ));
    Ok(ledger)
}

pub fn usage_report(config: &CodunotConfig, key: &str) -> Result<UsageReport, CodunotError> {
    let mut ledger = load_ledger(config)?;
    Ok(ledger.report(&EntityKey::from(key)))
}

/// Run the `codunot usage <key>` command.
pub fn run_usage(config: &CodunotConfig, key: &str, json: bool) -> Result<(), CodunotError> {
    let report = usage_report(config, key)?;
    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CodunotError::Internal(format!("cannot render report: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{report}");
    }
    Ok(())
}

pub fn tiers(config: &CodunotConfig) -> Result<TiersResponse, CodunotError> {
    let resolver = TierResolver::from_config(&config.tiers)?;
    let owned = |tier| {
        resolver
            .members(tier)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    Ok(TiersResponse {
        premium: owned(Tier::Premium),
        gold: owned(Tier::Gold),
    })
}

/// Run the `codunot tiers` command.
pub fn run_tiers(config: &CodunotConfig, json: bool) -> Result<(), CodunotError> {
    let response = tiers(config)?;
    if json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| CodunotError::Internal(format!("cannot render tiers: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    for (tier, members, path) in [
        (Tier::Gold, &response.gold, &config.tiers.gold_file),
        (Tier::Premium, &response.premium, &config.tiers.premium_file),
    ] {
        println!("{} ({}, {} entries)", tier.to_string().to_uppercase(), path, members.len());
        for key in members {
            println!("  {key}");
        }
    }
    Ok(())
}
