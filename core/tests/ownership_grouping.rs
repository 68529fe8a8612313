use refdesk_core::ownership::group_by_owner;
use refdesk_core::record::RetailClient;
use refdesk_core::snapshot::{AccountInfo, Snapshot};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn client(owner: &str, user_id: i64, balance: f64, equity: f64) -> RetailClient {
    RetailClient {
        user_id,
        account_number: user_id,
        name: format!("client-{user_id}"),
        email: None,
        phone: None,
        account_balance: balance,
        equity,
        credit: 0.0,
        platform: 1,
        account_type: 1,
        base_currency: "USD".into(),
        register_date: 0,
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

fn with_deposit(mut c: RetailClient, amount: f64) -> RetailClient {
    c.last_deposit_amount = Some(amount);
    c
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// totalBalance = Σ balances, clientCount = clients.len(), and
/// averageBalance = totalBalance / clientCount, exactly.
#[test]
fn sub_ib_totals_and_averages_hold() {
    let groups = group_by_owner(vec![
        client("Jane Doe", 1, 100.0, 80.0),
        client("Jane Doe", 2, 300.0, 120.0),
    ]);

    assert_eq!(groups.len(), 1);
    let sub = &groups[0];
    assert_eq!(sub.client_count, 2);
    assert_eq!(sub.clients.len(), 2);
    assert_eq!(sub.total_balance, 400.0);
    assert_eq!(sub.total_equity, 200.0);
    assert_eq!(sub.average_balance, 200.0);
    assert_eq!(sub.average_equity, 100.0);
}

/// Only strictly positive last-deposit amounts count toward
/// totalDeposits and depositCount.
#[test]
fn deposit_totals_skip_non_positive_amounts() {
    let groups = group_by_owner(vec![
        with_deposit(client("A", 1, 0.0, 0.0), 250.0),
        with_deposit(client("A", 2, 0.0, 0.0), 0.0),
        with_deposit(client("A", 3, 0.0, 0.0), -40.0),
        client("A", 4, 0.0, 0.0),
    ]);

    let sub = &groups[0];
    assert_eq!(sub.total_deposits, 250.0);
    assert_eq!(sub.deposit_count, 1);
}

/// Grouping is exact and case-sensitive: variant capitalizations of the
/// same owner form distinct SubIBs. Documented current behavior, not a
/// target to "fix".
#[test]
fn owner_grouping_is_case_sensitive() {
    let groups = group_by_owner(vec![
        client("Jane Doe", 1, 10.0, 0.0),
        client("jane doe", 2, 20.0, 0.0),
    ]);

    assert_eq!(groups.len(), 2, "case variants must stay separate groups");
    assert_eq!(groups[0].owner_name, "Jane Doe");
    assert_eq!(groups[1].owner_name, "jane doe");
}

/// Output order is the insertion order of each owner's first client.
#[test]
fn group_order_follows_first_occurrence() {
    let groups = group_by_owner(vec![
        client("Zed", 1, 0.0, 0.0),
        client("Amy", 2, 0.0, 0.0),
        client("Zed", 3, 0.0, 0.0),
    ]);

    let order: Vec<&str> = groups.iter().map(|g| g.owner_name.as_str()).collect();
    assert_eq!(order, vec!["Zed", "Amy"]);
}

// ── Snapshot assembly ────────────────────────────────────────────────────────

/// The assembler emits one login-0 retail result per SubIB and builds
/// read-through indices over the flattened client list.
#[test]
fn snapshot_assembles_compat_rows_and_indices() {
    let sub_ibs = group_by_owner(vec![
        client("Jane Doe", 10, 100.0, 100.0),
        client("Bob", 20, 50.0, 50.0),
        client("Jane Doe", 30, 25.0, 25.0),
    ]);
    let accounts = vec![AccountInfo {
        user_id: 10,
        account_number: 10,
        owner_name: "Jane Doe".into(),
    }];

    let snapshot = Snapshot::assemble(sub_ibs, accounts, 1_700_000_000_000);

    assert_eq!(snapshot.retail_results.len(), 2);
    assert!(snapshot.retail_results.iter().all(|r| r.login == 0));
    assert_eq!(snapshot.all_clients.len(), 3);
    assert_eq!(snapshot.metadata.total_retail_clients, 3);
    assert_eq!(snapshot.metadata.total_accounts, 1);

    let jane = &snapshot.metadata.clients_by_owner["Jane Doe"];
    assert_eq!(jane.len(), 2);
    for &idx in jane {
        assert_eq!(snapshot.all_clients[idx].owner_name, "Jane Doe");
    }
    assert_eq!(snapshot.metadata.accounts_by_user_id[&10], 0);
}

/// Snapshot ids embed the capture timestamp and carry a random suffix,
/// so two captures in the same millisecond do not collide.
#[test]
fn snapshot_ids_are_unique_within_a_millisecond() {
    let a = Snapshot::assemble(Vec::new(), Vec::new(), 1_700_000_000_000);
    let b = Snapshot::assemble(Vec::new(), Vec::new(), 1_700_000_000_000);

    assert!(a.id.starts_with("snapshot-1700000000000-"));
    assert_ne!(a.id, b.id);
}
