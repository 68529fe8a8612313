//! Ownership aggregation — clients grouped per owner into SubIB rollups.
//!
//! Grouping is by exact, case-sensitive owner string equality. "Jane
//! Doe" and "jane doe" form separate groups; upstream exports are
//! expected to be consistent and the raw spelling is preserved as the
//! group key. Output order is the insertion order of each owner's first
//! client, not sorted.

use crate::record::RetailClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate over all clients sharing one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubIB {
    pub owner_name: String,
    pub client_count: usize,
    pub total_balance: f64,
    pub total_equity: f64,
    pub total_deposits: f64,
    pub deposit_count: usize,
    pub average_balance: f64,
    pub average_equity: f64,
    pub average_deposit: f64,
    pub clients: Vec<RetailClient>,
}

impl SubIB {
    pub fn from_clients(owner_name: String, clients: Vec<RetailClient>) -> Self {
        let client_count = clients.len();
        let total_balance: f64 = clients.iter().map(|c| c.account_balance).sum();
        let total_equity: f64 = clients.iter().map(|c| c.equity).sum();

        // Only strictly positive last-deposit amounts count as deposits.
        let mut total_deposits = 0.0;
        let mut deposit_count = 0usize;
        for client in &clients {
            if let Some(amount) = client.last_deposit_amount {
                if amount > 0.0 {
                    total_deposits += amount;
                    deposit_count += 1;
                }
            }
        }

        let average = |total: f64| {
            if client_count > 0 {
                total / client_count as f64
            } else {
                0.0
            }
        };

        Self {
            owner_name,
            client_count,
            average_balance: average(total_balance),
            average_equity: average(total_equity),
            average_deposit: average(total_deposits),
            total_balance,
            total_equity,
            total_deposits,
            deposit_count,
            clients,
        }
    }
}

/// Group clients by owner. Single pass; each group keeps its clients in
/// row order.
pub fn group_by_owner(clients: Vec<RetailClient>) -> Vec<SubIB> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<RetailClient>> = HashMap::new();

    for client in clients {
        let entry = groups.entry(client.owner_name.clone()).or_default();
        if entry.is_empty() {
            order.push(client.owner_name.clone());
        }
        entry.push(client);
    }

    order
        .into_iter()
        .map(|owner| {
            let members = groups.remove(&owner).unwrap_or_default();
            SubIB::from_clients(owner, members)
        })
        .collect()
}
