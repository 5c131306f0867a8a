//! Core data models for the portfolio Q&A gateway

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskAppetite {
    Low,
    Medium,
    High,
}

impl RiskAppetite {
    /// Ordering used when a question asks to sort by risk (High=3, Medium=2, Low=1)
    pub fn rank(self) -> u8 {
        match self {
            RiskAppetite::Low => 1,
            RiskAppetite::Medium => 2,
            RiskAppetite::High => 3,
        }
    }
}

/// Which backing source a question is routed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Client / portfolio records (document store, served from the roster)
    People,
    /// Transaction records (relational store)
    Transaction,
}

impl Domain {
    /// Backing-store tag reported as `query_type` in visualization metadata
    pub fn store_tag(self) -> &'static str {
        match self {
            Domain::People => "mongo",
            Domain::Transaction => "sql",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    PortfolioAnalysis,
    TransactionAnalysis,
    RelationshipAnalysis,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

//
// ================= Client Record =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    pub client_id: String,
    pub name: String,
    pub risk_appetite: RiskAppetite,
    pub investment_preferences: Vec<String>,
    /// Whole rupees
    pub portfolio_value: u64,
    pub rm_id: String,
}

impl ClientRecord {
    pub fn new(
        client_id: &str,
        name: &str,
        risk_appetite: RiskAppetite,
        investment_preferences: &[&str],
        portfolio_value: u64,
        rm_id: &str,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            name: name.to_string(),
            risk_appetite,
            investment_preferences: investment_preferences
                .iter()
                .map(|p| p.to_string())
                .collect(),
            portfolio_value,
            rm_id: rm_id.to_string(),
        }
    }

    pub fn prefers(&self, preference: &str) -> bool {
        self.investment_preferences.iter().any(|p| p == preference)
    }
}

//
// ================= Exchange =================
//

/// One question and its answer, as returned to the caller
#[derive(Debug, Clone)]
pub struct QuestionAnswer {
    pub request_id: Uuid,
    pub question: String,
    pub answer: String,
    pub elapsed: Duration,
    pub domain: Option<Domain>,
    pub visualization: Option<VisualizationKind>,
}

impl QuestionAnswer {
    /// Elapsed time rendered as seconds with two decimals, e.g. `0.42s`
    pub fn processing_time(&self) -> String {
        format!("{:.2}s", self.elapsed.as_secs_f64())
    }
}

impl fmt::Display for RiskAppetite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskAppetite::Low => "Low",
            RiskAppetite::Medium => "Medium",
            RiskAppetite::High => "High",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::People => "people",
            Domain::Transaction => "transaction",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        write!(f, "{}", s)
    }
}
