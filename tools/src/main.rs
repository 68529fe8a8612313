//! report-runner: headless ingestion runner for the referral desk.
//!
//! Usage:
//!   report-runner --file clients.xlsx
//!   report-runner --file clients.xlsx --snapshot-json
//!   report-runner --file clients.xlsx --rules rules.json

use anyhow::{Context, Result};
use chrono::Utc;
use refdesk_core::config::{self, MemoryPreferenceStore};
use refdesk_core::ingest::ingest_workbook_file;
use refdesk_core::RuleConfig;
use std::env;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let file = args
        .windows(2)
        .find(|w| w[0] == "--file")
        .map(|w| w[1].clone())
        .context("--file <workbook> is required")?;
    let rules_path = args
        .windows(2)
        .find(|w| w[0] == "--rules")
        .map(|w| w[1].clone());
    let snapshot_json = args.iter().any(|a| a == "--snapshot-json");

    let rules = match rules_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading rules file {path}"))?;
            RuleConfig::from_json_str(&raw)?
        }
        None => RuleConfig::default(),
    };
    log::debug!(
        "rules: min_deposit={} hold_days={}",
        rules.min_deposit,
        rules.commission_hold_days
    );

    let outcome = ingest_workbook_file(Path::new(&file)).await?;

    println!("Referral Desk — report-runner");
    println!("  file:    {file}");
    println!("  clients: {}", outcome.clients.len());
    println!("  owners:  {}", outcome.sub_ibs.len());
    println!();
    println!(
        "{:<28} {:>8} {:>14} {:>14} {:>14}",
        "owner", "clients", "balance", "equity", "deposits"
    );
    for sub in &outcome.sub_ibs {
        println!(
            "{:<28} {:>8} {:>14.2} {:>14.2} {:>14.2}",
            sub.owner_name, sub.client_count, sub.total_balance, sub.total_equity, sub.total_deposits
        );
    }

    // Remember the largest owner as the default selection for a UI
    // shell; the store here is the in-memory reference implementation.
    let mut prefs = MemoryPreferenceStore::default();
    if let Some(largest) = outcome
        .sub_ibs
        .iter()
        .max_by_key(|sub| sub.client_count)
    {
        config::remember_selected_owner(&mut prefs, &largest.owner_name);
    }

    if snapshot_json {
        let snapshot = outcome.into_snapshot(Vec::new(), Utc::now().timestamp_millis());
        println!();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}
