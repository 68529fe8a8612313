//! Record building — resolved columns + raw rows → validated clients.
//!
//! A row is skipped when every cell is blank or when the owner cell is
//! empty after trimming. Any row that survives the skip test always
//! yields a record: per-field defaulting fills the gaps, it never
//! rejects. Zero surviving rows fails the ingestion as a whole.

use crate::error::{DeskError, DeskResult};
use crate::normalize::{
    account_type_code, extract_currency, parse_date_millis, parse_number, platform_code, RawCell,
};
use crate::schema::{Field, SchemaMap};
use crate::types::{EpochMillis, UserId};
use serde::{Deserialize, Serialize};

/// One trading client referred by an owner. All numeric fields are
/// finite; absent values default to 0 except the explicitly nullable
/// ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailClient {
    pub user_id: UserId,
    pub account_number: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub account_balance: f64,
    pub equity: f64,
    pub credit: f64,

    pub platform: i64,
    pub account_type: i64,
    pub base_currency: String,

    pub register_date: EpochMillis,
    pub first_deposit_date: Option<EpochMillis>,
    pub last_deposit_time: Option<EpochMillis>,
    pub last_deposit_amount: Option<f64>,
    pub last_deposit_currency: Option<String>,
    pub last_trade_time: Option<EpochMillis>,
    pub last_trade_symbol: Option<String>,
    pub last_trade_volume: Option<f64>,

    pub poi_status: Option<i64>,
    pub poa_status: Option<i64>,
    pub funding_status: i64,
    pub archive_status: i64,
    pub account_journey: i64,

    pub owner_name: String,
}

/// Build clients from data rows. `now` is the ingestion timestamp used
/// when a register date is absent or unparseable.
pub fn build_clients(
    schema: &SchemaMap,
    rows: &[Vec<RawCell>],
    now: EpochMillis,
) -> DeskResult<Vec<RetailClient>> {
    let mut clients = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        if row.iter().all(RawCell::is_blank) {
            skipped += 1;
            continue;
        }
        let owner_name = schema
            .cell(row, Field::OwnerName)
            .map(|c| c.to_text())
            .unwrap_or_default();
        if owner_name.is_empty() {
            skipped += 1;
            continue;
        }
        clients.push(build_one(schema, row, owner_name, now));
    }

    if clients.is_empty() {
        return Err(DeskError::NoValidRows);
    }

    log::debug!(
        "record builder: {} clients built, {skipped} rows skipped",
        clients.len()
    );
    Ok(clients)
}

fn build_one(schema: &SchemaMap, row: &[RawCell], owner_name: String, now: EpochMillis) -> RetailClient {
    let number = |field| schema.cell(row, field).map(parse_number).unwrap_or(0.0);
    let code = |field| schema.cell(row, field).map(parse_number).unwrap_or(0.0) as i64;
    let text = |field: Field| {
        schema
            .cell(row, field)
            .and_then(|c| c.as_trimmed_text())
            .map(str::to_string)
    };
    let date = |field| schema.cell(row, field).and_then(parse_date_millis);
    let nullable_code = |field| {
        schema
            .cell(row, field)
            .filter(|c| !c.is_blank())
            .map(|c| parse_number(c) as i64)
    };

    let last_deposit_cell = schema.cell(row, Field::LastDepositAmount);
    let last_deposit_amount = last_deposit_cell
        .filter(|c| !c.is_blank())
        .map(parse_number);
    // Currency annotated on the amount itself wins; an explicit currency
    // column is the fallback.
    let last_deposit_currency = last_deposit_cell
        .and_then(extract_currency)
        .or_else(|| text(Field::LastDepositCurrency));

    RetailClient {
        user_id: code(Field::UserId),
        account_number: code(Field::AccountNumber),
        name: text(Field::Name).unwrap_or_default(),
        email: text(Field::Email),
        phone: text(Field::Phone),

        account_balance: number(Field::AccountBalance),
        equity: number(Field::Equity),
        credit: number(Field::Credit),

        platform: schema
            .cell(row, Field::Platform)
            .map(platform_code)
            .unwrap_or(0),
        account_type: schema
            .cell(row, Field::AccountType)
            .map(account_type_code)
            .unwrap_or(0),
        base_currency: text(Field::BaseCurrency).unwrap_or_else(|| "USD".into()),

        register_date: date(Field::RegisterDate).unwrap_or(now),
        first_deposit_date: date(Field::FirstDepositDate),
        last_deposit_time: date(Field::LastDepositTime),
        last_deposit_amount,
        last_deposit_currency,
        last_trade_time: date(Field::LastTradeTime),
        last_trade_symbol: text(Field::LastTradeSymbol),
        last_trade_volume: schema
            .cell(row, Field::LastTradeVolume)
            .filter(|c| !c.is_blank())
            .map(parse_number),

        poi_status: nullable_code(Field::PoiStatus),
        poa_status: nullable_code(Field::PoaStatus),
        funding_status: code(Field::FundingStatus),
        archive_status: code(Field::ArchiveStatus),
        account_journey: code(Field::AccountJourney),

        owner_name,
    }
}
