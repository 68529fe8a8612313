//! Snapshot assembly — immutable point-in-time captures.
//!
//! A snapshot is created once, at ingestion (file import or scrape),
//! and never mutated afterward. The journal aggregator consumes it
//! read-only, so shared access across computations is safe without
//! locking.

use crate::ownership::SubIB;
use crate::record::RetailClient;
use crate::types::{EpochMillis, SnapshotId, UserId};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Owner-account metadata supplied by the external account source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub user_id: UserId,
    pub account_number: i64,
    pub owner_name: String,
}

/// Per-account client results, kept for wire compatibility with older
/// consumers. The assembler emits one entry per SubIB with login 0 —
/// an owner aggregate has no single account identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailResult {
    pub owner_name: String,
    pub login: i64,
    pub retail: RetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailData {
    pub data: Vec<RetailClient>,
}

/// Lookup indices over the snapshot's own data. Read-through views of
/// `all_clients` and `accounts`, not separate sources of truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub total_accounts: usize,
    pub total_retail_clients: usize,
    /// Owner → indices into `all_clients`.
    pub clients_by_owner: HashMap<String, Vec<usize>>,
    /// User id → index into `accounts`.
    pub accounts_by_user_id: HashMap<UserId, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: SnapshotId,
    pub timestamp: EpochMillis,
    pub scraped_at: String,
    pub accounts: Vec<AccountInfo>,
    pub retail_results: Vec<RetailResult>,
    pub sub_ibs: Vec<SubIB>,
    pub all_clients: Vec<RetailClient>,
    pub metadata: SnapshotMetadata,
}

impl Snapshot {
    /// Assemble a capture from ownership aggregates plus whatever raw
    /// account metadata is available. `timestamp` is the capture
    /// instant in epoch millis.
    pub fn assemble(sub_ibs: Vec<SubIB>, accounts: Vec<AccountInfo>, timestamp: EpochMillis) -> Self {
        let retail_results: Vec<RetailResult> = sub_ibs
            .iter()
            .map(|sub| RetailResult {
                owner_name: sub.owner_name.clone(),
                login: 0,
                retail: RetailData {
                    data: sub.clients.clone(),
                },
            })
            .collect();

        let all_clients: Vec<RetailClient> = sub_ibs
            .iter()
            .flat_map(|sub| sub.clients.iter().cloned())
            .collect();

        let mut clients_by_owner: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, client) in all_clients.iter().enumerate() {
            clients_by_owner
                .entry(client.owner_name.clone())
                .or_default()
                .push(idx);
        }

        let accounts_by_user_id: HashMap<UserId, usize> = accounts
            .iter()
            .enumerate()
            .map(|(idx, account)| (account.user_id, idx))
            .collect();

        let metadata = SnapshotMetadata {
            total_accounts: accounts.len(),
            total_retail_clients: all_clients.len(),
            clients_by_owner,
            accounts_by_user_id,
        };

        Snapshot {
            id: snapshot_id(timestamp),
            timestamp,
            scraped_at: DateTime::from_timestamp_millis(timestamp)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            accounts,
            retail_results,
            sub_ibs,
            all_clients,
            metadata,
        }
    }
}

/// Prefixed capture timestamp plus a short random suffix. The suffix
/// keeps two captures in the same millisecond from colliding.
fn snapshot_id(timestamp: EpochMillis) -> SnapshotId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("snapshot-{timestamp}-{}", &suffix[..8])
}
