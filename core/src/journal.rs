//! Journal aggregation — many timestamped snapshots folded into
//! day-bucketed analytics for one reporting month.
//!
//! Snapshots come from an external paginated source, newest first. The
//! fetch loop is strictly sequential: the early-termination decision
//! for page n+1 depends on page n's contents, and a hard page cap
//! bounds the loop even against a source that never runs dry.
//!
//! Equity is a capture-time value being attributed to a day bucket, not
//! a balance history. The same client appearing in several retained
//! snapshots is counted each time; deduplicating would need client
//! state this core does not model.

use crate::error::DeskResult;
use crate::snapshot::Snapshot;
use crate::types::EpochMillis;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard upper bound on fetched pages per aggregation run.
pub const MAX_PAGES: u32 = 10;
/// Snapshots requested per page.
pub const PAGE_SIZE: u32 = 50;

// ── Snapshot source ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotPage {
    pub snapshots: Vec<Snapshot>,
}

/// External paginated snapshot store. Pages are 1-based and ordered
/// newest first; a page shorter than `limit` signals end of data.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, page: u32, limit: u32) -> DeskResult<SnapshotPage>;
}

// ── Output ───────────────────────────────────────────────────────────────────

/// Calendar-date-keyed accumulator for one day's activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub new_users: u32,
    pub first_deposits: u32,
    pub deposits: u32,
    pub total_deposits: f64,
    pub trading_activity: u32,
    pub total_volume: f64,
    pub equity: f64,
}

impl DayBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            new_users: 0,
            first_deposits: 0,
            deposits: 0,
            total_deposits: 0.0,
            trading_activity: 0,
            total_volume: 0.0,
            equity: 0.0,
        }
    }

    fn has_activity(&self) -> bool {
        self.new_users > 0 || self.deposits > 0 || self.trading_activity > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub total_equity: f64,
    pub total_deposits: f64,
    pub total_volume: f64,
    pub new_users: u32,
    /// Days with at least one new-user, deposit, or trade event.
    pub active_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthJournal {
    pub year: i32,
    pub month: u32,
    pub snapshots_considered: usize,
    pub days: Vec<DayBucket>,
    pub totals: MonthlyTotals,
}

// ── Aggregation ──────────────────────────────────────────────────────────────

/// Fetch and fold one reporting month. Fetch failures propagate; the
/// fold itself has no failure mode and an out-of-range month simply
/// yields an all-zero journal.
pub async fn aggregate_month<S: SnapshotSource + ?Sized>(
    source: &S,
    year: i32,
    month: u32,
) -> DeskResult<MonthJournal> {
    let Some((month_start, month_end)) = month_bounds_millis(year, month) else {
        return Ok(MonthJournal {
            year,
            month,
            ..Default::default()
        });
    };

    let snapshots = fetch_month_snapshots(source, month_start, month_end).await?;
    log::info!(
        "journal: {year}-{month:02} retained {} snapshots",
        snapshots.len()
    );

    Ok(fold_snapshots(&snapshots, year, month, month_start, month_end))
}

/// `[monthStart, monthEnd]` in epoch millis, or None for an invalid
/// year/month.
fn month_bounds_millis(year: i32, month: u32) -> Option<(EpochMillis, EpochMillis)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let start_ms = start.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
    let end_ms = next.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() - 1;
    Some((start_ms, end_ms))
}

/// Sequential pagination with data-driven termination: stop on a short
/// page (source exhausted), on a page whose oldest snapshot predates
/// the month (further pages are guaranteed older), or at the hard cap.
async fn fetch_month_snapshots<S: SnapshotSource + ?Sized>(
    source: &S,
    month_start: EpochMillis,
    month_end: EpochMillis,
) -> DeskResult<Vec<Snapshot>> {
    let mut retained = Vec::new();

    for page in 1..=MAX_PAGES {
        let batch = source.fetch(page, PAGE_SIZE).await?;
        let fetched = batch.snapshots.len();
        let oldest = batch.snapshots.iter().map(|s| s.timestamp).min();

        for snapshot in batch.snapshots {
            if snapshot.timestamp >= month_start && snapshot.timestamp <= month_end {
                retained.push(snapshot);
            }
        }

        if (fetched as u32) < PAGE_SIZE {
            break;
        }
        if oldest.is_some_and(|ts| ts < month_start) {
            break;
        }
    }

    Ok(retained)
}

fn fold_snapshots(
    snapshots: &[Snapshot],
    year: i32,
    month: u32,
    month_start: EpochMillis,
    month_end: EpochMillis,
) -> MonthJournal {
    let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    let in_month = |ts: EpochMillis| ts >= month_start && ts <= month_end;

    for snapshot in snapshots {
        for client in &snapshot.all_clients {
            if in_month(client.register_date) {
                if let Some(bucket) = bucket_mut(&mut buckets, client.register_date) {
                    bucket.new_users += 1;
                }
            }
            if let Some(ts) = client.first_deposit_date.filter(|ts| in_month(*ts)) {
                if let Some(bucket) = bucket_mut(&mut buckets, ts) {
                    bucket.first_deposits += 1;
                }
            }
            if let Some(ts) = client.last_deposit_time.filter(|ts| in_month(*ts)) {
                if let Some(bucket) = bucket_mut(&mut buckets, ts) {
                    bucket.deposits += 1;
                    bucket.total_deposits += client.last_deposit_amount.unwrap_or(0.0);
                }
            }
            if let Some(ts) = client.last_trade_time.filter(|ts| in_month(*ts)) {
                if let Some(bucket) = bucket_mut(&mut buckets, ts) {
                    bucket.trading_activity += 1;
                    bucket.total_volume += client.last_trade_volume.unwrap_or(0.0);
                }
            }

            // Equity rides on the most recent in-month activity
            // timestamp; registration wins ties over later event kinds.
            let activity = [
                Some(client.register_date),
                client.first_deposit_date,
                client.last_deposit_time,
                client.last_trade_time,
            ]
            .into_iter()
            .flatten()
            .filter(|ts| in_month(*ts))
            .fold(None::<EpochMillis>, |best, ts| match best {
                Some(b) if ts <= b => Some(b),
                _ => Some(ts),
            });
            if let Some(ts) = activity {
                if let Some(bucket) = bucket_mut(&mut buckets, ts) {
                    bucket.equity += client.equity;
                }
            }
        }
    }

    let mut totals = MonthlyTotals::default();
    for bucket in buckets.values() {
        totals.total_equity += bucket.equity;
        totals.total_deposits += bucket.total_deposits;
        totals.total_volume += bucket.total_volume;
        totals.new_users += bucket.new_users;
        if bucket.has_activity() {
            totals.active_days += 1;
        }
    }

    MonthJournal {
        year,
        month,
        snapshots_considered: snapshots.len(),
        days: buckets.into_values().collect(),
        totals,
    }
}

/// The bucket for `ts`'s calendar date, created on first touch.
/// Timestamps chrono cannot place on a date contribute nothing.
fn bucket_mut(
    buckets: &mut BTreeMap<NaiveDate, DayBucket>,
    ts: EpochMillis,
) -> Option<&mut DayBucket> {
    let date = DateTime::from_timestamp_millis(ts)?.date_naive();
    Some(buckets.entry(date).or_insert_with(|| DayBucket::new(date)))
}
