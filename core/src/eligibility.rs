//! Commission eligibility engine.
//!
//! Each evaluation is a pure function of the registration's current
//! field values and the clock — there is no long-lived state machine,
//! the record is simply re-evaluated on every read.
//!
//! Two independent axes per registration:
//!   - eligibility: below threshold / early withdrawal / eligible
//!   - payout: not qualified / pending qualification / available
//!
//! A record above the deposit threshold but flagged as an early
//! withdrawal is excluded from both the eligible bucket and the
//! "needs more deposits" rollup. Whether that is intentional in the
//! business rules is unresolved; the behavior is preserved as is.

use crate::config::RuleConfig;
use crate::types::{EpochMillis, MILLIS_PER_DAY};
use serde::{Deserialize, Serialize};

// ── Input ────────────────────────────────────────────────────────────────────

/// One referred-user financial record, sourced externally. Treated as a
/// read-only snapshot per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub user_id: i64,
    pub account_number: i64,
    pub country: Option<String>,
    pub net_deposits: f64,
    pub commission: f64,
    pub volume: f64,
    pub registration_date: Option<EpochMillis>,
    pub first_deposit_date: Option<EpochMillis>,
    pub qualification_date: Option<EpochMillis>,
    /// Commission for this referral has already been paid out.
    pub commission_paid: bool,
}

// ── Per-record evaluation ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    BelowThreshold,
    EarlyWithdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PayoutStatus {
    /// No qualification date yet.
    NotQualified,
    /// Hold period still running.
    PendingQualification { days_remaining: i64 },
    /// Hold period elapsed; commission is claimable.
    Available,
}

/// Read model handed to eligibility and payout views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationView {
    pub user_id: i64,
    pub status: EligibilityStatus,
    pub payout: PayoutStatus,
    /// Fixed deal amount when eligible, else 0.
    pub commission_amount: f64,
    /// Deposits still missing when below threshold, else 0.
    pub amount_needed: f64,
}

pub fn evaluate(reg: &Registration, config: &RuleConfig, now: EpochMillis) -> RegistrationView {
    let status = eligibility_status(reg, config);
    let payout = payout_status(reg, config, now);

    let commission_amount = if status == EligibilityStatus::Eligible {
        config.deal_amount
    } else {
        0.0
    };
    let amount_needed = if status == EligibilityStatus::BelowThreshold {
        config.min_deposit - reg.net_deposits
    } else {
        0.0
    };

    RegistrationView {
        user_id: reg.user_id,
        status,
        payout,
        commission_amount,
        amount_needed,
    }
}

fn eligibility_status(reg: &Registration, config: &RuleConfig) -> EligibilityStatus {
    // Early withdrawal invalidates the referral regardless of deposit
    // size, so it is checked before the threshold.
    if is_early_withdrawal(reg, config) {
        return EligibilityStatus::EarlyWithdrawal;
    }
    if reg.net_deposits < config.min_deposit {
        return EligibilityStatus::BelowThreshold;
    }
    EligibilityStatus::Eligible
}

/// Deposited and then withdrew before the hold period elapsed: the
/// first deposit landed within `commission_hold_days` of registration.
/// Having never deposited at all is not an early withdrawal.
fn is_early_withdrawal(reg: &Registration, config: &RuleConfig) -> bool {
    let (Some(first_deposit), Some(registered)) = (reg.first_deposit_date, reg.registration_date)
    else {
        return false;
    };
    let held_days = (first_deposit - registered) / MILLIS_PER_DAY;
    held_days <= config.commission_hold_days
}

fn payout_status(reg: &Registration, config: &RuleConfig, now: EpochMillis) -> PayoutStatus {
    let Some(qualified) = reg.qualification_date else {
        return PayoutStatus::NotQualified;
    };
    let available_at = qualified + config.payout_hold_days * MILLIS_PER_DAY;
    if now >= available_at {
        return PayoutStatus::Available;
    }
    // Round partial days up so "available tomorrow morning" reads 1.
    let days_remaining = (available_at - now + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    PayoutStatus::PendingQualification { days_remaining }
}

// ── Aggregate summary ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilitySummary {
    pub total: usize,
    pub eligible_count: usize,
    pub below_threshold_count: usize,
    pub early_withdrawal_count: usize,
    /// Sum of (min_deposit − net_deposits) across below-threshold users.
    pub amount_needed_total: f64,
    pub domestic_count: usize,
    pub international_count: usize,
    /// Unpaid commission past its hold period.
    pub available_total: f64,
    /// Commission still inside its hold period.
    pub pending_total: f64,
    /// Minimum remaining hold days across pending records.
    pub next_payout_days: Option<i64>,
    pub paid_count: usize,
    /// Fixed bonus when the paid-referral count reaches the weekly
    /// threshold, else 0.
    pub weekly_bonus: f64,
}

/// Fold a batch of registrations into the aggregate view. Never fails;
/// malformed records simply land in the buckets their fields put them
/// in.
pub fn summarize(
    registrations: &[Registration],
    config: &RuleConfig,
    now: EpochMillis,
) -> EligibilitySummary {
    let mut summary = EligibilitySummary {
        total: registrations.len(),
        ..Default::default()
    };

    for reg in registrations {
        let view = evaluate(reg, config, now);

        match view.status {
            EligibilityStatus::Eligible => summary.eligible_count += 1,
            EligibilityStatus::BelowThreshold => {
                summary.below_threshold_count += 1;
                summary.amount_needed_total += view.amount_needed;
            }
            EligibilityStatus::EarlyWithdrawal => summary.early_withdrawal_count += 1,
        }

        let domestic = reg
            .country
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(&config.domestic_country));
        if domestic {
            summary.domestic_count += 1;
        } else {
            summary.international_count += 1;
        }

        if view.status == EligibilityStatus::Eligible {
            match view.payout {
                PayoutStatus::Available => {
                    if reg.commission_paid {
                        summary.paid_count += 1;
                    } else {
                        summary.available_total += view.commission_amount;
                    }
                }
                PayoutStatus::PendingQualification { days_remaining } => {
                    summary.pending_total += view.commission_amount;
                    summary.next_payout_days = Some(match summary.next_payout_days {
                        Some(best) => best.min(days_remaining),
                        None => days_remaining,
                    });
                }
                PayoutStatus::NotQualified => {}
            }
        }
    }

    if summary.paid_count >= config.weekly_bonus_threshold {
        summary.weekly_bonus = config.weekly_bonus_amount;
    }

    if summary.early_withdrawal_count > 0 {
        log::debug!(
            "eligibility: {} early-withdrawal records excluded from both buckets",
            summary.early_withdrawal_count
        );
    }

    summary
}
