// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily and rolling-window usage ledger.
//!
//! Daily counters reset lazily: the first access for an entity on a new UTC
//! calendar date zeroes its counters, and later accesses that day see the
//! reset record. Rolling logs are pruned on every access, so after any call
//! no timestamp older than the window remains for the touched entity.
//!
//! Every operation has an `*_at` twin taking the current time, which is what
//! the plain forms call with `Utc::now()`.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use codunot_config::{TierLimits, TiersConfig, UsageConfig};
use codunot_core::{EntityKey, Limit, QuotaSubject, ResourceKind, Tier};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::deny::deny_message;
use crate::store::{DailyUsage, UsageFiles};
use crate::tier::TierResolver;

/// Author ids that bypass every limit.
#[derive(Debug, Clone, Default)]
pub struct OwnerSet(HashSet<String>);

impl OwnerSet {
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        Self(
            ids.into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        )
    }

    pub fn from_config(config: &UsageConfig) -> Self {
        Self::new(config.owner_ids.iter().cloned())
    }

    pub fn contains(&self, author_id: &str) -> bool {
        self.0.contains(author_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Who a ledger operation is charged to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub key: EntityKey,
    /// Owners pass every check and are never charged.
    pub is_owner: bool,
}

impl Requester {
    pub fn new(key: impl Into<EntityKey>, is_owner: bool) -> Self {
        Self {
            key: key.into(),
            is_owner,
        }
    }

    /// Requester for an inbound event: charged to the event's quota key,
    /// owner when the author is listed or the platform marked them
    /// privileged.
    pub fn resolve<S: QuotaSubject + ?Sized>(subject: &S, owners: &OwnerSet) -> Self {
        Self {
            key: subject.quota_key(),
            is_owner: subject.is_privileged() || owners.contains(subject.author_id()),
        }
    }
}

/// Which branch a consume call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The counter or log was incremented.
    Consumed,
    /// Already at the limit; nothing changed. Points at a missing check
    /// before the consume.
    RefusedOverLimit,
    /// Owner request; nothing recorded.
    Bypassed,
    /// The kind is not tracked by this ledger operation.
    Skipped,
}

/// Used and allowed amounts for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageLine {
    pub kind: ResourceKind,
    pub used: u64,
    pub limit: Limit,
}

/// Snapshot of an entity's standing, for the usage command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub key: EntityKey,
    pub tier: Tier,
    pub day: NaiveDate,
    pub daily: Vec<UsageLine>,
    pub rolling: Vec<UsageLine>,
    pub rolling_window_days: i64,
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "📊 Usage for `{}` (**{}**)",
            self.key,
            self.tier.to_string().to_uppercase()
        )?;
        for line in &self.daily {
            writeln!(f, "{} today: {}/{}", line.kind, line.used, line.limit)?;
        }
        for line in &self.rolling {
            writeln!(
                f,
                "{} (last {} days): {}/{}",
                line.kind, self.rolling_window_days, line.used, line.limit
            )?;
        }
        Ok(())
    }
}

/// Per-entity usage accounting against tier limits.
#[derive(Debug)]
pub struct UsageLedger {
    tiers: TierResolver,
    limits: TiersConfig,
    window: Duration,
    upgrade_contact: Option<String>,
    files: UsageFiles,
    dirty: bool,
}

impl UsageLedger {
    /// Ledger with a 60-day rolling window and no upgrade contact.
    pub fn new(tiers: TierResolver, limits: TiersConfig) -> Self {
        Self {
            tiers,
            limits,
            window: Duration::days(60),
            upgrade_contact: None,
            files: UsageFiles::default(),
            dirty: false,
        }
    }

    pub fn from_config(tiers: TierResolver, limits: TiersConfig, usage: &UsageConfig) -> Self {
        Self::new(tiers, limits)
            .with_rolling_window_days(usage.rolling_window_days)
            .with_upgrade_contact(usage.upgrade_contact.clone())
    }

    pub fn with_rolling_window_days(mut self, days: u32) -> Self {
        self.window = Duration::days(i64::from(days));
        self
    }

    pub fn with_upgrade_contact(mut self, contact: Option<String>) -> Self {
        self.upgrade_contact = contact;
        self
    }

    /// Replace all counters with previously saved ones.
    pub fn restore(&mut self, files: UsageFiles) {
        debug!(
            daily = files.daily.len(),
            rolling = files.rolling.values().map(|m| m.len()).sum::<usize>(),
            "usage restored"
        );
        self.files = files;
        self.dirty = false;
    }

    /// Copy of the counters for saving.
    pub fn files(&self) -> UsageFiles {
        self.files.clone()
    }

    /// Whether counters changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn tier_of(&self, key: &EntityKey) -> Tier {
        self.tiers.tier_of(key)
    }

    pub fn tier_resolver(&self) -> &TierResolver {
        &self.tiers
    }

    fn limits_of(&self, key: &EntityKey) -> &TierLimits {
        self.limits.limits_for(self.tier_of(key))
    }

    /// Denial text for `key`'s tier and `kind`.
    pub fn deny_message(&self, key: &EntityKey, kind: ResourceKind) -> String {
        deny_message(self.tier_of(key), kind, self.upgrade_contact.as_deref())
    }

    // --- daily -------------------------------------------------------------

    /// Today's record for `key`, reset first if it belongs to an earlier day.
    /// `None` when the entity has never been charged.
    fn today(&mut self, key: &EntityKey, today: NaiveDate) -> Option<&mut DailyUsage> {
        let usage = self.files.daily.get_mut(key)?;
        if usage.day != today {
            debug!(key = %key, from = %usage.day, to = %today, "daily usage rolled over");
            *usage = DailyUsage::new(today);
            self.dirty = true;
        }
        Some(usage)
    }

    /// Count of `kind` used today, after rollover.
    pub fn daily_count_at(
        &mut self,
        key: &EntityKey,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> u64 {
        self.today(key, now.date_naive())
            .map_or(0, |usage| usage.count(kind))
    }

    pub fn check_daily(&mut self, req: &Requester, kind: ResourceKind) -> bool {
        self.check_daily_at(req, kind, Utc::now())
    }

    /// Whether one more `kind` is allowed today.
    pub fn check_daily_at(
        &mut self,
        req: &Requester,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> bool {
        if req.is_owner {
            return true;
        }
        let limit = self.limits_of(&req.key).daily(kind);
        let used = self.daily_count_at(&req.key, kind, now);
        limit.allows(used)
    }

    pub fn consume_daily(&mut self, req: &Requester, kind: ResourceKind) -> ConsumeOutcome {
        self.consume_daily_at(req, kind, Utc::now())
    }

    /// Charge one `kind` for today. Refuses, and logs, when already at the
    /// limit.
    pub fn consume_daily_at(
        &mut self,
        req: &Requester,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> ConsumeOutcome {
        if req.is_owner {
            return ConsumeOutcome::Bypassed;
        }
        let tier = self.tier_of(&req.key);
        let limit = self.limits.limits_for(tier).daily(kind);
        let today = now.date_naive();

        self.today(&req.key, today);
        let usage = self
            .files
            .daily
            .entry(req.key.clone())
            .or_insert_with(|| DailyUsage::new(today));

        let count = usage.count(kind);
        if !limit.allows(count) {
            warn!(
                key = %req.key,
                tier = %tier,
                kind = %kind,
                count,
                "daily limit hit but consume was called"
            );
            return ConsumeOutcome::RefusedOverLimit;
        }

        *usage.count_mut(kind) += 1;
        self.dirty = true;
        ConsumeOutcome::Consumed
    }

    // --- rolling -----------------------------------------------------------

    fn cutoff(&self, now: DateTime<Utc>) -> f64 {
        unix_seconds(now - self.window)
    }

    /// Prune `key`'s log for `kind` and return how many events remain.
    ///
    /// A log pruned to nothing is removed along with its key.
    pub fn rolling_count_at(
        &mut self,
        key: &EntityKey,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> usize {
        let cutoff = self.cutoff(now);
        let Some(per_key) = self.files.rolling.get_mut(&kind) else {
            return 0;
        };
        let Some(log) = per_key.get_mut(key) else {
            return 0;
        };
        let before = log.len();
        log.retain(|&ts| ts >= cutoff);
        let remaining = log.len();
        if remaining != before {
            debug!(key = %key, kind = %kind, pruned = before - remaining, "rolling log pruned");
            self.dirty = true;
        }
        if remaining == 0 {
            per_key.remove(key);
            if per_key.is_empty() {
                self.files.rolling.remove(&kind);
            }
            self.dirty = true;
        }
        remaining
    }

    pub fn check_rolling(&mut self, req: &Requester, kind: ResourceKind) -> bool {
        self.check_rolling_at(req, kind, Utc::now())
    }

    /// Whether one more `kind` fits in the rolling window. Kinds without a
    /// rolling limit always pass.
    pub fn check_rolling_at(
        &mut self,
        req: &Requester,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> bool {
        if req.is_owner {
            return true;
        }
        let Some(limit) = self.limits_of(&req.key).rolling(kind) else {
            return true;
        };
        let used = self.rolling_count_at(&req.key, kind, now);
        limit.allows(used as u64)
    }

    pub fn consume_rolling(&mut self, req: &Requester, kind: ResourceKind) -> ConsumeOutcome {
        self.consume_rolling_at(req, kind, Utc::now())
    }

    /// Record one `kind` event at `now`. Kinds without a rolling limit are
    /// skipped.
    pub fn consume_rolling_at(
        &mut self,
        req: &Requester,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> ConsumeOutcome {
        if req.is_owner {
            return ConsumeOutcome::Bypassed;
        }
        let tier = self.tier_of(&req.key);
        let Some(limit) = self.limits.limits_for(tier).rolling(kind) else {
            return ConsumeOutcome::Skipped;
        };

        let used = self.rolling_count_at(&req.key, kind, now);
        if !limit.allows(used as u64) {
            warn!(
                key = %req.key,
                tier = %tier,
                kind = %kind,
                count = used,
                "rolling limit hit but consume was called"
            );
            return ConsumeOutcome::RefusedOverLimit;
        }

        self.files
            .rolling
            .entry(kind)
            .or_default()
            .entry(req.key.clone())
            .or_default()
            .push(unix_seconds(now));
        self.dirty = true;

        let daily = self.daily_count_at(&req.key, kind, now);
        info!(
            key = %req.key,
            kind = %kind,
            daily,
            daily_limit = %self.limits.limits_for(tier).daily(kind),
            rolling = used + 1,
            rolling_limit = %limit,
            "rolling usage recorded"
        );
        ConsumeOutcome::Consumed
    }

    // --- reporting ---------------------------------------------------------

    pub fn report(&mut self, key: &EntityKey) -> UsageReport {
        self.report_at(key, Utc::now())
    }

    /// Tier, today's counts and rolling counts for `key`, each with its limit.
    pub fn report_at(&mut self, key: &EntityKey, now: DateTime<Utc>) -> UsageReport {
        let tier = self.tier_of(key);
        let limits = *self.limits.limits_for(tier);

        let daily = ResourceKind::iter()
            .map(|kind| UsageLine {
                kind,
                used: self.daily_count_at(key, kind, now),
                limit: limits.daily(kind),
            })
            .collect();
        let rolling = ResourceKind::iter()
            .filter_map(|kind| {
                limits.rolling(kind).map(|limit| UsageLine {
                    kind,
                    used: self.rolling_count_at(key, kind, now) as u64,
                    limit,
                })
            })
            .collect();

        UsageReport {
            key: key.clone(),
            tier,
            day: now.date_naive(),
            daily,
            rolling,
            rolling_window_days: self.window.num_days(),
        }
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}
