//! Schema resolution — maps arbitrary spreadsheet headers to canonical
//! fields.
//!
//! Exports from different back offices label the same column "Owner",
//! "IB Name", "Referred By", and so on. Each canonical field carries an
//! ordered alias list; headers and aliases are both folded (lowercase,
//! separators removed) and compared exactly — no fuzzy matching.
//!
//! Two columns are mandatory: the owner identifier, and at least one of
//! user id / account number. Missing either rejects the whole ingestion.

use crate::error::{DeskError, DeskResult};
use crate::normalize::RawCell;
use std::collections::HashMap;

// ── Canonical fields ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    UserId,
    AccountNumber,
    Name,
    Email,
    Phone,
    AccountBalance,
    Equity,
    Credit,
    Platform,
    AccountType,
    BaseCurrency,
    RegisterDate,
    FirstDepositDate,
    LastDepositTime,
    LastDepositAmount,
    LastDepositCurrency,
    LastTradeTime,
    LastTradeSymbol,
    LastTradeVolume,
    PoiStatus,
    PoaStatus,
    FundingStatus,
    ArchiveStatus,
    AccountJourney,
    OwnerName,
}

impl Field {
    /// All fields, in resolution order.
    pub const ALL: &'static [Field] = &[
        Field::UserId,
        Field::AccountNumber,
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::AccountBalance,
        Field::Equity,
        Field::Credit,
        Field::Platform,
        Field::AccountType,
        Field::BaseCurrency,
        Field::RegisterDate,
        Field::FirstDepositDate,
        Field::LastDepositTime,
        Field::LastDepositAmount,
        Field::LastDepositCurrency,
        Field::LastTradeTime,
        Field::LastTradeSymbol,
        Field::LastTradeVolume,
        Field::PoiStatus,
        Field::PoaStatus,
        Field::FundingStatus,
        Field::ArchiveStatus,
        Field::AccountJourney,
        Field::OwnerName,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::UserId => "user_id",
            Field::AccountNumber => "account_number",
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::AccountBalance => "account_balance",
            Field::Equity => "equity",
            Field::Credit => "credit",
            Field::Platform => "platform",
            Field::AccountType => "account_type",
            Field::BaseCurrency => "base_currency",
            Field::RegisterDate => "register_date",
            Field::FirstDepositDate => "first_deposit_date",
            Field::LastDepositTime => "last_deposit_time",
            Field::LastDepositAmount => "last_deposit_amount",
            Field::LastDepositCurrency => "last_deposit_currency",
            Field::LastTradeTime => "last_trade_time",
            Field::LastTradeSymbol => "last_trade_symbol",
            Field::LastTradeVolume => "last_trade_volume",
            Field::PoiStatus => "poi_status",
            Field::PoaStatus => "poa_status",
            Field::FundingStatus => "funding_status",
            Field::ArchiveStatus => "archive_status",
            Field::AccountJourney => "account_journey",
            Field::OwnerName => "owner_name",
        }
    }

    /// Accepted header spellings, in priority order. The first alias
    /// present in the sheet wins.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::UserId => &["user id", "userid", "client id", "uid", "id"],
            Field::AccountNumber => &["account number", "account no", "account", "login", "mt login"],
            Field::Name => &["name", "client name", "full name", "customer name"],
            Field::Email => &["email", "e-mail", "email address"],
            Field::Phone => &["phone", "phone number", "mobile", "telephone"],
            Field::AccountBalance => &["account balance", "balance"],
            Field::Equity => &["equity", "account equity"],
            Field::Credit => &["credit", "credit amount"],
            Field::Platform => &["platform", "trading platform", "server"],
            Field::AccountType => &["account type", "type", "acc type"],
            Field::BaseCurrency => &["base currency", "currency", "account currency"],
            Field::RegisterDate => &["register date", "registration date", "registered", "signup date", "created at"],
            Field::FirstDepositDate => &["first deposit date", "first deposit", "ftd date", "ftd"],
            Field::LastDepositTime => &["last deposit time", "last deposit date", "last deposit"],
            Field::LastDepositAmount => &["last deposit amount", "deposit amount", "last deposit sum"],
            Field::LastDepositCurrency => &["last deposit currency", "deposit currency"],
            Field::LastTradeTime => &["last trade time", "last trade date", "last trade"],
            Field::LastTradeSymbol => &["last trade symbol", "trade symbol", "symbol"],
            Field::LastTradeVolume => &["last trade volume", "trade volume", "volume", "lots"],
            Field::PoiStatus => &["poi status", "poi", "identity status"],
            Field::PoaStatus => &["poa status", "poa", "address status"],
            Field::FundingStatus => &["funding status", "funded"],
            Field::ArchiveStatus => &["archive status", "archived"],
            Field::AccountJourney => &["account journey", "journey", "journey stage"],
            Field::OwnerName => &["owner name", "owner", "ib name", "sub ib", "subib", "referred by", "agent", "partner"],
        }
    }
}

// ── Header folding ───────────────────────────────────────────────────────────

/// Lowercase and drop whitespace, underscores and hyphens, so
/// "Account_Balance", "account-balance" and " ACCOUNT BALANCE " all
/// compare equal.
pub fn fold_header(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

// ── Resolved schema ──────────────────────────────────────────────────────────

/// Canonical field → column index for one sheet.
#[derive(Debug, Clone)]
pub struct SchemaMap {
    columns: HashMap<Field, usize>,
}

impl SchemaMap {
    /// Resolve a header row. Optional fields that match nothing are
    /// simply absent; a missing mandatory column fails the ingestion
    /// with the canonical field name in the error.
    pub fn resolve(headers: &[String]) -> DeskResult<Self> {
        let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();

        let mut columns = HashMap::new();
        for &field in Field::ALL {
            if let Some(idx) = resolve_field(field, &folded) {
                columns.insert(field, idx);
            }
        }

        if !columns.contains_key(&Field::OwnerName) {
            return Err(DeskError::MissingColumn {
                field: Field::OwnerName.canonical_name(),
            });
        }
        if !columns.contains_key(&Field::UserId) && !columns.contains_key(&Field::AccountNumber) {
            return Err(DeskError::MissingColumn {
                field: "user_id or account_number",
            });
        }

        log::debug!("schema: resolved {} of {} fields", columns.len(), Field::ALL.len());
        Ok(Self { columns })
    }

    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// The cell for `field` in `row`, if the column resolved and the row
    /// is wide enough.
    pub fn cell<'a>(&self, row: &'a [RawCell], field: Field) -> Option<&'a RawCell> {
        self.column(field).and_then(|idx| row.get(idx))
    }
}

fn resolve_field(field: Field, folded_headers: &[String]) -> Option<usize> {
    for alias in field.aliases() {
        let target = fold_header(alias);
        if let Some(idx) = folded_headers.iter().position(|h| *h == target) {
            return Some(idx);
        }
    }
    None
}
