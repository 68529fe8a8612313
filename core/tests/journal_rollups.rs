use async_trait::async_trait;
use chrono::NaiveDate;
use refdesk_core::error::DeskResult;
use refdesk_core::journal::{
    aggregate_month, SnapshotPage, SnapshotSource, MAX_PAGES, PAGE_SIZE,
};
use refdesk_core::ownership::SubIB;
use refdesk_core::record::RetailClient;
use refdesk_core::snapshot::Snapshot;
use std::sync::Mutex;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn at(year: i32, month: u32, day: u32, hour: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

fn client(owner: &str, register_date: i64) -> RetailClient {
    RetailClient {
        user_id: 1,
        account_number: 1,
        name: "c".into(),
        email: None,
        phone: None,
        account_balance: 0.0,
        equity: 0.0,
        credit: 0.0,
        platform: 1,
        account_type: 1,
        base_currency: "USD".into(),
        register_date,
        first_deposit_date: None,
        last_deposit_time: None,
        last_deposit_amount: None,
        last_deposit_currency: None,
        last_trade_time: None,
        last_trade_symbol: None,
        last_trade_volume: None,
        poi_status: None,
        poa_status: None,
        funding_status: 0,
        archive_status: 0,
        account_journey: 0,
        owner_name: owner.into(),
    }
}

fn snapshot_with(clients: Vec<RetailClient>, timestamp: i64) -> Snapshot {
    let sub = SubIB::from_clients("owner".into(), clients);
    Snapshot::assemble(vec![sub], Vec::new(), timestamp)
}

/// Serves pre-built pages (1-based) and records every page requested.
struct PagedSource {
    pages: Vec<Vec<Snapshot>>,
    calls: Mutex<Vec<u32>>,
}

impl PagedSource {
    fn new(pages: Vec<Vec<Snapshot>>) -> Self {
        Self {
            pages,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotSource for PagedSource {
    async fn fetch(&self, page: u32, _limit: u32) -> DeskResult<SnapshotPage> {
        self.calls.lock().unwrap().push(page);
        let snapshots = self
            .pages
            .get((page - 1) as usize)
            .cloned()
            .unwrap_or_default();
        Ok(SnapshotPage { snapshots })
    }
}

/// Always returns a full page of in-month snapshots — a source that
/// never signals exhaustion.
struct BottomlessSource {
    timestamp: i64,
    calls: Mutex<u32>,
}

#[async_trait]
impl SnapshotSource for BottomlessSource {
    async fn fetch(&self, _page: u32, limit: u32) -> DeskResult<SnapshotPage> {
        *self.calls.lock().unwrap() += 1;
        let snapshots = (0..limit)
            .map(|_| snapshot_with(Vec::new(), self.timestamp))
            .collect();
        Ok(SnapshotPage { snapshots })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Two captures on the same calendar date sum into a single day bucket.
#[tokio::test]
async fn same_day_snapshots_merge_into_one_bucket() {
    let mut morning = client("a", at(2025, 3, 3, 9));
    morning.last_deposit_time = Some(at(2025, 3, 3, 9));
    morning.last_deposit_amount = Some(100.0);

    let mut evening = client("a", at(2025, 3, 3, 21));
    evening.last_deposit_time = Some(at(2025, 3, 3, 21));
    evening.last_deposit_amount = Some(40.0);

    let source = PagedSource::new(vec![vec![
        snapshot_with(vec![morning], at(2025, 3, 3, 10)),
        snapshot_with(vec![evening], at(2025, 3, 3, 22)),
    ]]);

    let journal = aggregate_month(&source, 2025, 3).await.unwrap();

    assert_eq!(journal.days.len(), 1);
    let day = &journal.days[0];
    assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    assert_eq!(day.deposits, 2);
    assert_eq!(day.total_deposits, 140.0);
    assert_eq!(day.new_users, 2);
}

/// Snapshots outside the reporting month are dropped even when the page
/// that carried them is retained.
#[tokio::test]
async fn out_of_month_snapshots_are_filtered() {
    let source = PagedSource::new(vec![vec![
        snapshot_with(vec![client("a", at(2025, 3, 10, 12))], at(2025, 3, 10, 12)),
        snapshot_with(vec![client("a", at(2025, 2, 28, 12))], at(2025, 2, 28, 12)),
    ]]);

    let journal = aggregate_month(&source, 2025, 3).await.unwrap();
    assert_eq!(journal.snapshots_considered, 1);
    assert_eq!(journal.totals.new_users, 1);
}

/// A short page means the source is exhausted: no further fetches.
#[tokio::test]
async fn short_page_stops_the_fetch_loop() {
    let source = PagedSource::new(vec![vec![snapshot_with(
        vec![],
        at(2025, 3, 5, 0),
    )]]);

    aggregate_month(&source, 2025, 3).await.unwrap();
    assert_eq!(source.calls(), vec![1]);
}

/// A page whose oldest snapshot predates the month guarantees all later
/// pages are older still, so the loop stops after it.
#[tokio::test]
async fn page_older_than_month_stops_the_fetch_loop() {
    let mut first_page = Vec::new();
    for _ in 0..PAGE_SIZE - 1 {
        first_page.push(snapshot_with(Vec::new(), at(2025, 3, 20, 0)));
    }
    first_page.push(snapshot_with(Vec::new(), at(2025, 1, 1, 0)));

    let mut second_page = Vec::new();
    for _ in 0..PAGE_SIZE {
        second_page.push(snapshot_with(Vec::new(), at(2024, 12, 1, 0)));
    }

    let source = PagedSource::new(vec![first_page, second_page]);
    aggregate_month(&source, 2025, 3).await.unwrap();
    assert_eq!(source.calls(), vec![1], "second page must not be fetched");
}

/// The hard page cap bounds the loop even against a source that never
/// returns a short page.
#[tokio::test]
async fn page_cap_terminates_a_bottomless_source() {
    let source = BottomlessSource {
        timestamp: at(2025, 3, 15, 0),
        calls: Mutex::new(0),
    };

    aggregate_month(&source, 2025, 3).await.unwrap();
    assert_eq!(*source.calls.lock().unwrap(), MAX_PAGES);
}

/// Equity attaches to the most recent in-month activity date; here the
/// last trade postdates registration and the deposit.
#[tokio::test]
async fn equity_follows_the_most_recent_activity() {
    let mut c = client("a", at(2025, 3, 2, 10));
    c.equity = 900.0;
    c.last_deposit_time = Some(at(2025, 3, 8, 10));
    c.last_deposit_amount = Some(50.0);
    c.last_trade_time = Some(at(2025, 3, 14, 10));
    c.last_trade_volume = Some(2.5);

    let source = PagedSource::new(vec![vec![snapshot_with(vec![c], at(2025, 3, 15, 0))]]);
    let journal = aggregate_month(&source, 2025, 3).await.unwrap();

    let trade_day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let bucket = journal.days.iter().find(|d| d.date == trade_day).unwrap();
    assert_eq!(bucket.equity, 900.0);
    assert_eq!(bucket.total_volume, 2.5);

    // Registration and deposit days got their events but no equity.
    for day in &journal.days {
        if day.date != trade_day {
            assert_eq!(day.equity, 0.0, "equity leaked into {}", day.date);
        }
    }
}

/// The same client captured in two snapshots is counted twice — equity
/// double counting across captures is accepted behavior.
#[tokio::test]
async fn equity_double_counts_across_snapshots() {
    let mut c = client("a", at(2025, 3, 2, 10));
    c.equity = 100.0;

    let source = PagedSource::new(vec![vec![
        snapshot_with(vec![c.clone()], at(2025, 3, 2, 12)),
        snapshot_with(vec![c], at(2025, 3, 2, 18)),
    ]]);

    let journal = aggregate_month(&source, 2025, 3).await.unwrap();
    assert_eq!(journal.totals.total_equity, 200.0);
}

/// Monthly rollup sums the buckets and counts days with any new-user,
/// deposit, or trade activity.
#[tokio::test]
async fn monthly_totals_roll_up_day_buckets() {
    let mut depositor = client("a", at(2025, 3, 4, 9));
    depositor.first_deposit_date = Some(at(2025, 3, 6, 9));
    depositor.last_deposit_time = Some(at(2025, 3, 6, 9));
    depositor.last_deposit_amount = Some(500.0);
    depositor.equity = 450.0;

    let trader = {
        let mut t = client("b", at(2025, 2, 20, 9)); // registered last month
        t.last_trade_time = Some(at(2025, 3, 10, 9));
        t.last_trade_volume = Some(1.0);
        t.equity = 50.0;
        t
    };

    let source = PagedSource::new(vec![vec![snapshot_with(
        vec![depositor, trader],
        at(2025, 3, 15, 0),
    )]]);
    let journal = aggregate_month(&source, 2025, 3).await.unwrap();

    assert_eq!(journal.totals.new_users, 1);
    assert_eq!(journal.totals.total_deposits, 500.0);
    assert_eq!(journal.totals.total_volume, 1.0);
    assert_eq!(journal.totals.total_equity, 500.0);
    // Active days: Mar 4 (registration), Mar 6 (deposit), Mar 10 (trade).
    assert_eq!(journal.totals.active_days, 3);
}

/// An invalid month yields an all-zero journal rather than an error.
#[tokio::test]
async fn invalid_month_yields_empty_journal() {
    let source = PagedSource::new(vec![]);
    let journal = aggregate_month(&source, 2025, 13).await.unwrap();
    assert!(journal.days.is_empty());
    assert_eq!(journal.totals.active_days, 0);
    assert!(source.calls().is_empty(), "no fetch for an invalid month");
}
