//! Static client roster
//!
//! Stands in for the document store. Built once at startup and handed to the
//! responder; never mutated.

use crate::models::{ClientRecord, RiskAppetite};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Roster {
    clients: Arc<Vec<ClientRecord>>,
}

impl Roster {
    pub fn new(clients: Vec<ClientRecord>) -> Self {
        Self {
            clients: Arc::new(clients),
        }
    }

    pub fn clients(&self) -> &[ClientRecord] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn find_by_id(&self, client_id: &str) -> Option<&ClientRecord> {
        self.clients.iter().find(|c| c.client_id == client_id)
    }

    /// First client whose name appears (case-insensitively) in `text`
    pub fn find_name_in(&self, text: &str) -> Option<&ClientRecord> {
        let lowered = text.to_lowercase();
        self.clients
            .iter()
            .find(|c| lowered.contains(&c.name.to_lowercase()))
    }

    /// Portfolio value summed per relationship manager, in order of first appearance
    pub fn totals_by_rm(&self) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = Vec::new();

        for client in self.clients.iter() {
            match totals.iter_mut().find(|(rm_id, _)| *rm_id == client.rm_id) {
                Some((_, total)) => *total += client.portfolio_value,
                None => totals.push((client.rm_id.clone(), client.portfolio_value)),
            }
        }

        totals
    }
}

impl Default for Roster {
    fn default() -> Self {
        use RiskAppetite::{High, Low, Medium};

        Self::new(vec![
            ClientRecord::new("C001", "Virat Kohli", High, &["Stocks", "Real Estate"], 5_000_000, "RM001"),
            ClientRecord::new("C002", "Rohit Sharma", Medium, &["Stocks", "Bonds"], 3_500_000, "RM002"),
            ClientRecord::new("C003", "MS Dhoni", Low, &["Bonds", "Fixed Deposits"], 2_000_000, "RM003"),
            ClientRecord::new("C004", "KL Rahul", High, &["Stocks", "Real Estate", "Crypto"], 4_500_000, "RM001"),
            ClientRecord::new("C005", "Rishabh Pant", Medium, &["Stocks", "Mutual Funds"], 3_000_000, "RM002"),
            ClientRecord::new("C006", "Hardik Pandya", High, &["Stocks", "Real Estate"], 4_000_000, "RM001"),
            ClientRecord::new("C007", "Deepika Padukone", Medium, &["Stocks", "Bonds"], 2_800_000, "RM003"),
            ClientRecord::new("C008", "Salman Khan", High, &["Real Estate", "Stocks"], 6_000_000, "RM001"),
            ClientRecord::new("C009", "Shah Rukh Khan", High, &["Stocks", "Real Estate"], 5_500_000, "RM002"),
            ClientRecord::new("C010", "Dinesh Karthik", Medium, &["Stocks", "Mutual Funds"], 2_500_000, "RM003"),
        ])
    }
}
