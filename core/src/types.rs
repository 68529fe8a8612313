//! Shared primitive types used across the referral desk core.

/// Milliseconds since the Unix epoch. The canonical stored timestamp form.
pub type EpochMillis = i64;

/// Platform-assigned trading user identifier.
pub type UserId = i64;

/// Snapshot identifier: prefixed capture timestamp plus a random suffix.
pub type SnapshotId = String;

/// One calendar day, in epoch milliseconds.
pub const MILLIS_PER_DAY: i64 = 86_400_000;
