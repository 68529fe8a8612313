//! Workbook ingestion entry points.
//!
//! Accepts a raw `.xlsx`/`.xls` buffer, decodes the first worksheet
//! only (first row = headers, rest = data), and runs it through schema
//! resolution, record building, and ownership grouping. Failure is
//! all-or-nothing: a missing required column, an empty sheet, or zero
//! surviving rows rejects the whole import with a distinct error kind.
//! Per-cell parse failures never surface here — they defaulted away in
//! the normalizer.

use crate::error::{DeskError, DeskResult};
use crate::normalize::RawCell;
use crate::ownership::{group_by_owner, SubIB};
use crate::record::{build_clients, RetailClient};
use crate::schema::SchemaMap;
use crate::snapshot::{AccountInfo, Snapshot};
use crate::types::EpochMillis;
use calamine::{open_workbook_auto_from_rs, Reader};
use chrono::Utc;
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub clients: Vec<RetailClient>,
    pub sub_ibs: Vec<SubIB>,
}

impl IngestOutcome {
    /// Wrap the outcome in an immutable capture stamped `timestamp`.
    pub fn into_snapshot(self, accounts: Vec<AccountInfo>, timestamp: EpochMillis) -> Snapshot {
        Snapshot::assemble(self.sub_ibs, accounts, timestamp)
    }
}

/// Pure ingestion over already-normalized rows: header row first, data
/// rows after. This is the whole pipeline minus file decoding.
pub fn ingest_rows(rows: &[Vec<RawCell>], now: EpochMillis) -> DeskResult<IngestOutcome> {
    let Some((header, data)) = rows.split_first() else {
        return Err(DeskError::EmptySheet);
    };
    if data.is_empty() {
        return Err(DeskError::EmptySheet);
    }

    let headers: Vec<String> = header.iter().map(RawCell::to_text).collect();
    let schema = SchemaMap::resolve(&headers)?;
    let clients = build_clients(&schema, data, now)?;
    let sub_ibs = group_by_owner(clients.clone());

    log::info!(
        "ingest: {} clients across {} owners",
        clients.len(),
        sub_ibs.len()
    );
    Ok(IngestOutcome { clients, sub_ibs })
}

/// Decode a spreadsheet from an in-memory buffer and ingest its first
/// worksheet.
pub fn ingest_workbook_bytes(bytes: &[u8], now: EpochMillis) -> DeskResult<IngestOutcome> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| DeskError::UnreadableWorkbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DeskError::EmptySheet)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DeskError::UnreadableWorkbook(e.to_string()))?;

    let rows: Vec<Vec<RawCell>> = range
        .rows()
        .map(|row| row.iter().map(RawCell::from).collect())
        .collect();

    log::debug!("ingest: sheet '{sheet_name}', {} raw rows", rows.len());
    ingest_rows(&rows, now)
}

/// Read a workbook from disk and ingest it. The read is the only
/// suspension point; parsing is synchronous once bytes are in memory.
pub async fn ingest_workbook_file(path: &Path) -> DeskResult<IngestOutcome> {
    let bytes = tokio::fs::read(path).await?;
    ingest_workbook_bytes(&bytes, Utc::now().timestamp_millis())
}
