//! Question intent parsing
//!
//! Derives structured hints (limit, sort, focus flags) from the wording of a
//! question. Each responder has its own flavour of intent; both share the
//! "top N" pattern with the classifier.

use crate::models::SortOrder;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOP_N: Regex = Regex::new(r"top\s+(\d+)").expect("valid top-n pattern");
}

/// `true` when any keyword is a substring of `text`
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Count of keywords found as substrings of `text`
pub fn count_hits<S: AsRef<str>>(text: &str, keywords: &[S]) -> usize {
    keywords
        .iter()
        .filter(|k| text.contains(k.as_ref()))
        .count()
}

/// The `N` of a "top N" request in an already lower-cased question.
///
/// Numerals too large for `usize` saturate rather than disappear.
pub fn top_n(lowered: &str) -> Option<usize> {
    TOP_N
        .captures(lowered)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().parse().unwrap_or(usize::MAX))
}

//
// ================= Portfolio =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioSortKey {
    PortfolioValue,
    RiskAppetite,
    RmId,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioIntent {
    pub limit: Option<usize>,
    pub sort_by: Option<PortfolioSortKey>,
    pub sort_order: SortOrder,
    pub top_n: bool,
    pub names_only: bool,
    pub portfolio_focus: bool,
    pub rm_focus: bool,
}

impl PortfolioIntent {
    pub fn parse(question: &str) -> Self {
        let q = question.to_lowercase();

        let limit = top_n(&q);
        let mut sort_by = None;
        let mut sort_order = SortOrder::Asc;

        let names_only = q.contains("name") || q.contains("who");

        let portfolio_focus = contains_any(&q, &["portfolio", "wealth", "investor"]);
        if portfolio_focus {
            sort_by = Some(PortfolioSortKey::PortfolioValue);
            sort_order = SortOrder::Desc;
        }

        let rm_focus = q.contains("relationship manager") || q.contains("rm");
        if rm_focus {
            sort_by = Some(PortfolioSortKey::RmId);
        }

        if q.contains("high") && q.contains("risk") {
            sort_by = Some(PortfolioSortKey::RiskAppetite);
            sort_order = SortOrder::Desc;
        } else if q.contains("low") && q.contains("risk") {
            sort_by = Some(PortfolioSortKey::RiskAppetite);
            sort_order = SortOrder::Asc;
        } else if q.contains("top") && sort_by.is_none() {
            sort_by = Some(PortfolioSortKey::Name);
        }

        Self {
            limit,
            sort_by,
            sort_order,
            top_n: limit.is_some(),
            names_only,
            portfolio_focus,
            rm_focus,
        }
    }
}

//
// ================= Transactions =================
//

pub const AMOUNT_COLUMN: &str = "amount_invested";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub limit: Option<usize>,
    pub sort_by: Option<&'static str>,
    pub sort_order: SortOrder,
    pub top_n: bool,
    pub names_only: bool,
    pub amount_focus: bool,
}

impl TransactionIntent {
    pub fn parse(question: &str) -> Self {
        let q = question.to_lowercase();

        let limit = top_n(&q);
        let names_only = q.contains("name") || q.contains("who");
        let amount_focus = contains_any(&q, &["amount", "investment", "top"]);

        let sort_order = if q.contains("highest") || q.contains("top") {
            SortOrder::Desc
        } else if q.contains("lowest") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };

        Self {
            limit,
            sort_by: amount_focus.then_some(AMOUNT_COLUMN),
            sort_order,
            top_n: limit.is_some(),
            names_only,
            amount_focus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_extraction() {
        assert_eq!(top_n("top 3 investors"), Some(3));
        assert_eq!(top_n("show the top   10 clients"), Some(10));
        assert_eq!(top_n("top investors"), None);
        assert_eq!(top_n("top3 investors"), None);
        assert_eq!(
            top_n("top 99999999999999999999999999 clients"),
            Some(usize::MAX)
        );
    }

    #[test]
    fn test_portfolio_intent_high_risk_overrides_portfolio_sort() {
        let intent = PortfolioIntent::parse("Top 2 high risk investors");
        assert_eq!(intent.limit, Some(2));
        assert!(intent.top_n);
        assert!(intent.portfolio_focus);
        assert_eq!(intent.sort_by, Some(PortfolioSortKey::RiskAppetite));
        assert_eq!(intent.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_portfolio_intent_names_only() {
        let intent = PortfolioIntent::parse("What are the names of low risk clients?");
        assert!(intent.names_only);
        assert_eq!(intent.sort_by, Some(PortfolioSortKey::RiskAppetite));
        assert_eq!(intent.sort_order, SortOrder::Asc);
        assert_eq!(intent.limit, None);
    }

    #[test]
    fn test_transaction_intent_amount_focus() {
        let intent = TransactionIntent::parse("Top 5 transactions by amount");
        assert_eq!(intent.limit, Some(5));
        assert!(intent.amount_focus);
        assert_eq!(intent.sort_by, Some(AMOUNT_COLUMN));
        assert_eq!(intent.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_transaction_intent_lowest() {
        let intent = TransactionIntent::parse("lowest amount invested in TCS");
        assert_eq!(intent.sort_order, SortOrder::Asc);
        assert!(intent.amount_focus);
        assert!(!intent.top_n);
    }

    #[test]
    fn test_transaction_intent_plain() {
        let intent = TransactionIntent::parse("list transactions from January");
        assert_eq!(intent.sort_by, None);
        assert!(!intent.amount_focus);
        assert_eq!(intent.sort_order, SortOrder::Desc);
    }
}
