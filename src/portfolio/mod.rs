//! Mock Portfolio Responder
//!
//! Answers people/portfolio questions from the static roster: lookups,
//! rankings, relationship-manager aggregates and keyword filters.
//! Makes no external calls.

pub mod roster;
pub use roster::Roster;

use crate::format::format_inr;
use crate::intent::{contains_any, PortfolioIntent, PortfolioSortKey};
use crate::models::{ClientRecord, Domain, RiskAppetite, SortOrder};
use crate::responder::DomainResponder;
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_TOP_LIMIT: usize = 5;

lazy_static! {
    static ref CLIENT_ID: Regex = Regex::new(r"(?i)\b([a-z]\d+)\b").expect("valid client id pattern");
}

#[derive(Debug, Clone)]
pub struct RosterAnswer {
    pub text: String,
    pub elapsed: Duration,
}

pub struct PortfolioResponder {
    roster: Roster,
}

impl PortfolioResponder {
    pub fn new(roster: Roster) -> Self {
        Self { roster }
    }

    pub fn answer_question(&self, question: &str) -> RosterAnswer {
        let start = Instant::now();
        let text = self.compose(question);
        RosterAnswer {
            text,
            elapsed: start.elapsed(),
        }
    }

    fn compose(&self, question: &str) -> String {
        let q = question.to_lowercase();
        let intent = PortfolioIntent::parse(question);

        if let Some(answer) = self.lookup_client_id(question) {
            return answer;
        }

        if q.contains("who is") {
            if let Some(client) = self.roster.find_name_in(&q) {
                debug!(client_id = %client.client_id, "Matched roster name");
                return format!(
                    "{} is Client {} (Risk: {}, Portfolio: {})",
                    client.name,
                    client.client_id,
                    client.risk_appetite,
                    format_inr(client.portfolio_value)
                );
            }
        }

        let top = q.contains("top");
        let rm_term = q.contains("relationship manager") || q.contains("rm");

        if top && contains_any(&q, &["portfolio", "wealth member", "investor"]) {
            return self.top_investors(intent.limit.unwrap_or(DEFAULT_TOP_LIMIT));
        }

        if top && rm_term {
            return self.top_relationship_managers(intent.limit.unwrap_or(DEFAULT_TOP_LIMIT));
        }

        if contains_any(&q, &["breakup", "breakdown", "group by"]) && rm_term {
            return self.rm_breakup();
        }

        self.filtered_listing(&q, &intent)
    }

    fn lookup_client_id(&self, question: &str) -> Option<String> {
        let client_id = CLIENT_ID.captures(question)?.get(1)?.as_str().to_uppercase();

        let answer = match self.roster.find_by_id(&client_id) {
            Some(client) => format!(
                "Client {} is {} (Risk: {}, Portfolio: {})",
                client_id,
                client.name,
                client.risk_appetite,
                format_inr(client.portfolio_value)
            ),
            None => format!("Client {} not found in the database.", client_id),
        };

        Some(answer)
    }

    fn top_investors(&self, limit: usize) -> String {
        let mut ranked: Vec<&ClientRecord> = self.roster.clients().iter().collect();
        ranked.sort_by(|a, b| b.portfolio_value.cmp(&a.portfolio_value));

        let lines: Vec<String> = ranked
            .iter()
            .take(limit)
            .map(|c| format!("• {} (Portfolio: {})", c.name, format_inr(c.portfolio_value)))
            .collect();

        format!("Top {} investors:\n{}", limit, lines.join("\n"))
    }

    fn top_relationship_managers(&self, limit: usize) -> String {
        let mut totals = self.roster.totals_by_rm();
        totals.sort_by(|a, b| b.1.cmp(&a.1));

        let lines: Vec<String> = totals
            .iter()
            .take(limit)
            .map(|(rm_id, total)| format!("• {} (Total Portfolio: {})", rm_id, format_inr(*total)))
            .collect();

        format!("Top {} relationship managers:\n{}", limit, lines.join("\n"))
    }

    fn rm_breakup(&self) -> String {
        let lines: Vec<String> = self
            .roster
            .totals_by_rm()
            .iter()
            .map(|(rm_id, total)| format!("• {}: {}", rm_id, format_inr(*total)))
            .collect();

        format!(
            "Portfolio value breakup per relationship manager:\n{}",
            lines.join("\n")
        )
    }

    fn filtered_listing(&self, q: &str, intent: &PortfolioIntent) -> String {
        let risk = q.contains("risk");
        let keep: Box<dyn Fn(&ClientRecord) -> bool> = if q.contains("high") && risk {
            Box::new(|c: &ClientRecord| c.risk_appetite == RiskAppetite::High)
        } else if q.contains("low") && risk {
            Box::new(|c: &ClientRecord| c.risk_appetite == RiskAppetite::Low)
        } else if q.contains("medium") && risk {
            Box::new(|c: &ClientRecord| c.risk_appetite == RiskAppetite::Medium)
        } else if q.contains("stocks") {
            Box::new(|c: &ClientRecord| c.prefers("Stocks"))
        } else if q.contains("real estate") || q.contains("property") {
            Box::new(|c: &ClientRecord| c.prefers("Real Estate"))
        } else {
            Box::new(|_: &ClientRecord| true)
        };

        let mut clients: Vec<&ClientRecord> =
            self.roster.clients().iter().filter(|c| keep(*c)).collect();

        match intent.sort_by {
            Some(PortfolioSortKey::RiskAppetite) => match intent.sort_order {
                SortOrder::Desc => {
                    clients.sort_by(|a, b| b.risk_appetite.rank().cmp(&a.risk_appetite.rank()))
                }
                SortOrder::Asc => clients.sort_by_key(|c| c.risk_appetite.rank()),
            },
            Some(PortfolioSortKey::PortfolioValue) => match intent.sort_order {
                SortOrder::Desc => clients.sort_by(|a, b| b.portfolio_value.cmp(&a.portfolio_value)),
                SortOrder::Asc => clients.sort_by_key(|c| c.portfolio_value),
            },
            _ => clients.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        if let Some(limit) = intent.limit {
            clients.truncate(limit);
        }

        let lines: Vec<String> = clients
            .iter()
            .map(|c| {
                if intent.names_only {
                    format!("• {}", c.name)
                } else if intent.top_n && intent.portfolio_focus {
                    format!("• {} (Portfolio: {})", c.name, format_inr(c.portfolio_value))
                } else if intent.top_n {
                    format!("• {} (Risk: {})", c.name, c.risk_appetite)
                } else {
                    format!("• {} (ID: {}, Risk: {})", c.name, c.client_id, c.risk_appetite)
                }
            })
            .collect();

        format!("Found {} client(s):\n{}", clients.len(), lines.join("\n"))
    }
}

#[async_trait]
impl DomainResponder for PortfolioResponder {
    fn domain(&self) -> Domain {
        Domain::People
    }

    async fn answer(&self, question: &str) -> Result<String> {
        let answer = self.answer_question(question);
        debug!(elapsed_ms = answer.elapsed.as_millis() as u64, "Roster answer composed");
        Ok(answer.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse_inr;

    fn responder() -> PortfolioResponder {
        PortfolioResponder::new(Roster::default())
    }

    fn ask(question: &str) -> String {
        responder().answer_question(question).text
    }

    fn bullet_lines(answer: &str) -> Vec<&str> {
        answer.lines().filter(|l| l.starts_with("• ")).collect()
    }

    #[test]
    fn test_client_id_lookup_every_roster_entry() {
        let roster = Roster::default();
        for client in roster.clients() {
            let answer = ask(&format!("Tell me about client {}", client.client_id));
            assert!(answer.contains(&client.name), "{}", answer);
            assert!(answer.contains(&client.risk_appetite.to_string()), "{}", answer);
        }
    }

    #[test]
    fn test_client_id_lookup_case_insensitive() {
        let answer = ask("details for c004");
        assert_eq!(answer, "Client C004 is KL Rahul (Risk: High, Portfolio: ₹4,500,000)");
    }

    #[test]
    fn test_unknown_client_id_not_fabricated() {
        let answer = ask("Who is client C099?");
        assert_eq!(answer, "Client C099 not found in the database.");
        for client in Roster::default().clients() {
            assert!(!answer.contains(&client.name));
        }
    }

    #[test]
    fn test_who_is_name() {
        let answer = ask("who is Virat Kohli");
        assert_eq!(answer, "Virat Kohli is Client C001 (Risk: High, Portfolio: ₹5,000,000)");
    }

    #[test]
    fn test_top_n_investors_sorted_descending() {
        let roster = Roster::default();
        for n in 1..=roster.len() {
            let answer = ask(&format!("top {} investors", n));
            assert!(answer.starts_with(&format!("Top {} investors:\n", n)));

            let lines = bullet_lines(&answer);
            assert_eq!(lines.len(), n);

            let values: Vec<u64> = lines
                .iter()
                .map(|l| {
                    let start = l.find('₹').unwrap();
                    parse_inr(l[start..].trim_end_matches(')')).unwrap()
                })
                .collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]));
        }

        let answer = ask("top 2 investors");
        assert_eq!(
            answer,
            "Top 2 investors:\n• Salman Khan (Portfolio: ₹6,000,000)\n• Shah Rukh Khan (Portfolio: ₹5,500,000)"
        );
    }

    #[test]
    fn test_top_investors_ties_keep_roster_order() {
        use crate::models::ClientRecord;
        let roster = Roster::new(vec![
            ClientRecord::new("A1", "Alpha", RiskAppetite::Low, &[], 100, "RM1"),
            ClientRecord::new("B2", "Bravo", RiskAppetite::Low, &[], 300, "RM1"),
            ClientRecord::new("C3", "Charlie", RiskAppetite::Low, &[], 100, "RM2"),
            ClientRecord::new("D4", "Delta", RiskAppetite::Low, &[], 100, "RM2"),
        ]);
        let answer = PortfolioResponder::new(roster)
            .answer_question("top 3 wealth members")
            .text;
        assert_eq!(
            bullet_lines(&answer),
            vec!["• Bravo (Portfolio: ₹300)", "• Alpha (Portfolio: ₹100)", "• Charlie (Portfolio: ₹100)"]
        );
    }

    #[test]
    fn test_top_investors_default_limit() {
        let answer = ask("Who are the top investors?");
        assert!(answer.starts_with("Top 5 investors:"));
        assert_eq!(bullet_lines(&answer).len(), 5);
    }

    #[test]
    fn test_top_relationship_managers() {
        let answer = ask("top 2 relationship managers");
        assert_eq!(
            answer,
            "Top 2 relationship managers:\n• RM001 (Total Portfolio: ₹19,500,000)\n• RM002 (Total Portfolio: ₹12,000,000)"
        );
    }

    #[test]
    fn test_rm_breakup_first_appearance_order() {
        let answer = ask("group by RM");
        assert_eq!(
            answer,
            "Portfolio value breakup per relationship manager:\n• RM001: ₹19,500,000\n• RM002: ₹12,000,000\n• RM003: ₹7,300,000"
        );
    }

    #[test]
    fn test_high_risk_filter_full_entries() {
        let answer = ask("List high risk clients");
        let lines = bullet_lines(&answer);
        assert!(answer.starts_with("Found 5 client(s):\n"));
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.contains("Risk: High") && l.contains("ID: C")));
    }

    #[test]
    fn test_names_only_listing() {
        let answer = ask("names of clients investing in real estate");
        assert!(answer.starts_with("Found 5 client(s):\n"));
        assert!(bullet_lines(&answer).iter().all(|l| !l.contains('(')));
        // alphabetical when no risk or portfolio sort applies
        assert_eq!(bullet_lines(&answer)[0], "• Hardik Pandya");
    }

    #[test]
    fn test_low_risk_sorted_ascending() {
        let answer = ask("show low risk clients");
        assert_eq!(answer, "Found 1 client(s):\n• MS Dhoni (ID: C003, Risk: Low)");
    }

    #[test]
    fn test_medium_risk_sorted_by_name() {
        let answer = ask("medium risk clients");
        let lines = bullet_lines(&answer);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("• Deepika Padukone"));
    }
}
