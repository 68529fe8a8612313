//! Referral desk core — ingestion, ownership aggregation, commission
//! eligibility, and journal analytics for referred trading clients.
//!
//! The pipeline: raw workbook bytes (or fetched snapshots) pass through
//! the schema resolver and value normalizer, become validated
//! `RetailClient` records, get grouped into `SubIB` aggregates, and are
//! captured as immutable `Snapshot`s. Independently, externally sourced
//! `Registration` records flow through the eligibility engine, and
//! persisted snapshots fold into day-bucketed journal analytics.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod ingest;
pub mod journal;
pub mod normalize;
pub mod ownership;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod types;

pub use config::RuleConfig;
pub use error::{DeskError, DeskResult};
pub use ingest::{ingest_rows, ingest_workbook_bytes, ingest_workbook_file, IngestOutcome};
pub use ownership::SubIB;
pub use record::RetailClient;
pub use snapshot::Snapshot;
