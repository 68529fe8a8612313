//! Business-rule constants and injected preference storage.
//!
//! Everything the eligibility engine and the aggregation entry points
//! treat as configurable lives in `RuleConfig`. Values that the original
//! deployment kept in environment variables or client-side storage are
//! explicit here: callers construct (or deserialize) a `RuleConfig` and
//! pass it in, and persisted UI preferences go through the injected
//! `PreferenceStore` abstraction instead of any storage the core owns.

use crate::error::DeskResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_MIN_DEPOSIT: f64 = 300.0;
pub const DEFAULT_COMMISSION_HOLD_DAYS: i64 = 30;
pub const DEFAULT_PAYOUT_HOLD_DAYS: i64 = 30;
pub const DEFAULT_WEEKLY_BONUS_THRESHOLD: usize = 10;

/// Preference key for the owner a reporting view last had selected.
pub const SELECTED_OWNER_KEY: &str = "selected_owner";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Minimum cumulative net deposits before a referral qualifies.
    pub min_deposit: f64,
    /// Depositing within this many days of registration counts as an
    /// early withdrawal and invalidates the referral.
    pub commission_hold_days: i64,
    /// Days after the qualification date before commission is payable.
    pub payout_hold_days: i64,
    /// Fixed commission per qualified referral. Supplied by the broker
    /// deal, never derived from deposit size.
    pub deal_amount: f64,
    /// Paid referrals in a week at or above this count earn the bonus.
    pub weekly_bonus_threshold: usize,
    pub weekly_bonus_amount: f64,
    /// Country code treated as domestic in the eligibility split.
    pub domestic_country: String,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_deposit: DEFAULT_MIN_DEPOSIT,
            commission_hold_days: DEFAULT_COMMISSION_HOLD_DAYS,
            payout_hold_days: DEFAULT_PAYOUT_HOLD_DAYS,
            deal_amount: 0.0,
            weekly_bonus_threshold: DEFAULT_WEEKLY_BONUS_THRESHOLD,
            weekly_bonus_amount: 0.0,
            domestic_country: "US".into(),
        }
    }
}

impl RuleConfig {
    /// Load from a JSON document. Absent keys keep their defaults, so a
    /// deployment only overrides what it cares about.
    pub fn from_json_str(raw: &str) -> DeskResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Key-value storage injected by the host. The core never imports a
/// persistence engine; a UI shell backs this with whatever it has.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

pub fn selected_owner(store: &dyn PreferenceStore) -> Option<String> {
    store.get(SELECTED_OWNER_KEY)
}

pub fn remember_selected_owner(store: &mut dyn PreferenceStore, owner: &str) {
    store.set(SELECTED_OWNER_KEY, owner);
}

/// In-memory store for tests and the headless runner.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.into(), value.into());
    }
}
