//! Intent Classifier
//!
//! Routes a question to one of two domains:
//! - People: client / portfolio records (e.g. "who is Virat Kohli", "top 3 investors")
//! - Transaction: transaction records (e.g. "total amount invested this month")
//!
//! Routing is a priority-ordered table of rules. The first rule that fires
//! decides; keyword scoring is the final, total step. Keyword tables overlap
//! ("top", "portfolio", "stock" live on both sides), so rule order is part of
//! the contract.

use crate::intent::{contains_any, count_hits, top_n};
use crate::models::Domain;
use tracing::debug;

/// Static keyword lists for the default vocabulary
const PEOPLE_KEYWORDS: &[&str] = &[
    "client", "investor", "portfolio", "risk", "manager", "name", "who",
    "high risk", "low risk", "medium risk", "risk appetite",
    "investment preferences", "stocks", "real estate", "bonds",
    "top 5", "top 10", "top 3", "top 1", "top 2", "top 4", "top 6", "top 7", "top 8", "top 9",
    "wealth member", "wealth members", "relationship manager", "rm",
    "top relationship", "best relationship", "top rm", "best rm",
];

const TRANSACTION_KEYWORDS: &[&str] = &[
    "transaction", "amount", "invested", "stock", "date", "total",
    "sum", "average", "count", "highest", "lowest", "between",
    "this month", "last month", "this year", "last year",
    "amount invested", "total investment", "investment amount",
    "breakup", "breakdown", "group by", "per relationship",
    "portfolio values", "portfolio value", "holders of", "highest holders",
];

/// Terms that mark a "top N" request as being about people
const TOP_N_PEOPLE_TERMS: &[&str] = &["client", "investor", "portfolio", "name", "who", "wealth member"];

/// Terms that mark a "top N" request as being about transactions
const TOP_N_TRANSACTION_TERMS: &[&str] = &["transaction", "amount", "invested", "stock"];

/// Terms that break a keyword-score tie toward people
const TIE_BREAK_PEOPLE_TERMS: &[&str] = &["name", "who", "client", "investor", "wealth member"];

/// Keyword tables used by the classifier.
///
/// Passed in at construction so callers and tests can supply their own.
#[derive(Debug, Clone)]
pub struct ClassifierVocabulary {
    pub people_keywords: Vec<String>,
    pub transaction_keywords: Vec<String>,
    pub top_n_people_terms: Vec<String>,
    pub top_n_transaction_terms: Vec<String>,
    pub tie_break_people_terms: Vec<String>,
}

impl Default for ClassifierVocabulary {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();

        Self {
            people_keywords: owned(PEOPLE_KEYWORDS),
            transaction_keywords: owned(TRANSACTION_KEYWORDS),
            top_n_people_terms: owned(TOP_N_PEOPLE_TERMS),
            top_n_transaction_terms: owned(TOP_N_TRANSACTION_TERMS),
            tie_break_people_terms: owned(TIE_BREAK_PEOPLE_TERMS),
        }
    }
}

fn any_of(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| text.contains(t.as_str()))
}

/// One entry of the routing table. `decide` sees the lower-cased question.
pub struct RoutingRule {
    pub name: &'static str,
    decide: fn(&str, &ClassifierVocabulary) -> Option<Domain>,
}

/// Outcome of classification, with the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    pub domain: Domain,
    pub rule: &'static str,
}

pub const KEYWORD_SCORE_RULE: &str = "keyword_score";

/// The routing table, highest priority first
pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            name: "breakdown_per_relationship_manager",
            decide: |q, _| {
                let breakdown = contains_any(q, &["breakup", "breakdown"]);
                let per_rm = contains_any(q, &["relationship manager", "per relationship"]);
                (breakdown && per_rm).then_some(Domain::Transaction)
            },
        },
        RoutingRule {
            name: "stock_holders",
            decide: |q, _| {
                contains_any(q, &["holders of", "highest holders"]).then_some(Domain::Transaction)
            },
        },
        RoutingRule {
            name: "portfolio_value_per_group",
            decide: |q, _| {
                let values = contains_any(q, &["portfolio values", "portfolio value"]);
                let grouped = contains_any(q, &["per", "by"]);
                (values && grouped).then_some(Domain::Transaction)
            },
        },
        RoutingRule {
            name: "top_n",
            decide: |q, vocab| {
                top_n(q)?;
                if any_of(q, &vocab.top_n_people_terms) {
                    Some(Domain::People)
                } else if any_of(q, &vocab.top_n_transaction_terms) {
                    Some(Domain::Transaction)
                } else {
                    Some(Domain::People)
                }
            },
        },
    ]
}

/// Keyword-rule question router
pub struct IntentClassifier {
    vocabulary: ClassifierVocabulary,
    rules: Vec<RoutingRule>,
}

impl IntentClassifier {
    pub fn new(vocabulary: ClassifierVocabulary) -> Self {
        Self {
            vocabulary,
            rules: default_rules(),
        }
    }

    /// Classify a question. Total and deterministic.
    pub fn classify(&self, question: &str) -> Domain {
        self.route(question).domain
    }

    /// Classify a question and report which rule decided it
    pub fn route(&self, question: &str) -> Routing {
        let lowered = question.to_lowercase();

        for rule in &self.rules {
            if let Some(domain) = (rule.decide)(&lowered, &self.vocabulary) {
                debug!(rule = rule.name, ?domain, "Routing rule matched");
                return Routing {
                    domain,
                    rule: rule.name,
                };
            }
        }

        let domain = self.score(&lowered);
        debug!(rule = KEYWORD_SCORE_RULE, ?domain, "Routed by keyword score");
        Routing {
            domain,
            rule: KEYWORD_SCORE_RULE,
        }
    }

    fn score(&self, lowered: &str) -> Domain {
        let people_score = count_hits(lowered, &self.vocabulary.people_keywords);
        let transaction_score = count_hits(lowered, &self.vocabulary.transaction_keywords);

        if people_score == transaction_score {
            if any_of(lowered, &self.vocabulary.tie_break_people_terms) {
                Domain::People
            } else {
                Domain::Transaction
            }
        } else if people_score > transaction_score {
            Domain::People
        } else {
            Domain::Transaction
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(ClassifierVocabulary::default())
    }
}
