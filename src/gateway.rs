//! Request Gateway
//!
//! The single entry point: validate, time, classify, dispatch to exactly one
//! responder, and attach a coarse visualization hint.
//!
//! Responders run in their own task so that a panic inside one becomes an
//! `Internal` error for this request instead of taking the server down.

use crate::agent::{ReactSqlAgent, SqlAgent};
use crate::classifier::IntentClassifier;
use crate::config::Settings;
use crate::error::GatewayError;
use crate::llm::{LanguageModel, OpenAiClient};
use crate::models::{Domain, QuestionAnswer, VisualizationKind};
use crate::portfolio::{PortfolioResponder, Roster};
use crate::responder::DomainResponder;
use crate::sql::{MySqlDatabase, SqlExecutor};
use crate::transaction::TransactionResponder;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const PORTFOLIO_TERMS: [&str; 6] = ["top", "portfolio", "investor", "manager", "client", "wealth member"];
const TRANSACTION_TERMS: [&str; 6] = ["transaction", "amount", "investment", "trend", "breakdown", "breakup"];
const RELATIONSHIP_TERMS: [&str; 3] = ["relationship manager", "rm", "holders"];

/// Chart category for a question, first matching group wins
pub fn visualization_for(question: &str) -> Option<VisualizationKind> {
    let q = question.to_lowercase();
    let hit = |terms: &[&str]| terms.iter().any(|t| q.contains(t));

    if hit(&PORTFOLIO_TERMS) {
        Some(VisualizationKind::PortfolioAnalysis)
    } else if hit(&TRANSACTION_TERMS) {
        Some(VisualizationKind::TransactionAnalysis)
    } else if hit(&RELATIONSHIP_TERMS) {
        Some(VisualizationKind::RelationshipAnalysis)
    } else {
        None
    }
}

fn apology(e: &GatewayError) -> String {
    format!(
        "Sorry, I encountered an error while processing your question: {}. Please try rephrasing your question.",
        e
    )
}

pub struct Gateway {
    classifier: IntentClassifier,
    people: Arc<dyn DomainResponder>,
    transactions: Option<Arc<dyn DomainResponder>>,
}

impl Gateway {
    pub fn new(
        classifier: IntentClassifier,
        people: Arc<dyn DomainResponder>,
        transactions: Option<Arc<dyn DomainResponder>>,
    ) -> Self {
        Self {
            classifier,
            people,
            transactions,
        }
    }

    /// Roster for people questions; MySQL (plus the agent, when enabled)
    /// for transaction questions if a relational store is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let people: Arc<dyn DomainResponder> = Arc::new(PortfolioResponder::new(Roster::default()));

        let transactions = match &settings.sql {
            Some(sql) => {
                let db: Arc<dyn SqlExecutor> = Arc::new(MySqlDatabase::connect_lazy(sql)?);
                let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(settings.llm.clone())?);
                let agent = if settings.sql_agent_enabled {
                    Some(Arc::new(ReactSqlAgent::new(llm.clone(), db.clone(), settings.agent)) as Arc<dyn SqlAgent>)
                } else {
                    None
                };
                info!(agent = agent.is_some(), "Transaction responder configured");
                Some(Arc::new(TransactionResponder::new(llm, db, agent)) as Arc<dyn DomainResponder>)
            }
            None => {
                warn!("MYSQL_URI not set; transaction questions will not be answered");
                None
            }
        };

        Ok(Self::new(IntentClassifier::default(), people, transactions))
    }

    pub fn has_transaction_store(&self) -> bool {
        self.transactions.is_some()
    }

    pub async fn ask(&self, question: &str) -> Result<QuestionAnswer> {
        if question.trim().is_empty() {
            return Err(GatewayError::InvalidQuestion);
        }

        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let routing = self.classifier.route(question);
        info!(
            request_id = %request_id,
            domain = %routing.domain,
            rule = routing.rule,
            "Question routed"
        );

        let answer = match self.responder_for(routing.domain) {
            Some(responder) => self.dispatch(request_id, responder, question).await?,
            None => {
                warn!(request_id = %request_id, "No relational store configured");
                apology(&GatewayError::ConfigError(
                    "the transaction database is not configured".to_string(),
                ))
            }
        };

        let exchange = QuestionAnswer {
            request_id,
            question: question.to_string(),
            answer,
            elapsed: started.elapsed(),
            domain: Some(routing.domain),
            visualization: visualization_for(question),
        };

        info!(
            request_id = %request_id,
            processing_time = %exchange.processing_time(),
            "Question answered"
        );
        Ok(exchange)
    }

    fn responder_for(&self, domain: Domain) -> Option<Arc<dyn DomainResponder>> {
        match domain {
            Domain::People => Some(self.people.clone()),
            Domain::Transaction => self.transactions.clone(),
        }
    }

    /// Run the responder in its own task. Responder errors degrade to an
    /// apology; a panic is an internal failure.
    async fn dispatch(
        &self,
        request_id: Uuid,
        responder: Arc<dyn DomainResponder>,
        question: &str,
    ) -> Result<String> {
        debug!(request_id = %request_id, responder = %responder.domain(), "Dispatching");
        let owned = question.to_string();
        let handle = tokio::spawn(async move { responder.answer(&owned).await });

        match handle.await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(e)) => {
                error!(request_id = %request_id, error = %e, "Responder failed");
                Ok(apology(&e))
            }
            Err(join_error) => {
                error!(request_id = %request_id, error = %join_error, "Responder task aborted");
                Err(GatewayError::Internal(join_error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Counts calls and answers with a fixed outcome
    struct ScriptedResponder {
        domain: Domain,
        outcome: fn() -> Result<String>,
        calls: AtomicUsize,
    }

    impl ScriptedResponder {
        fn new(domain: Domain, outcome: fn() -> Result<String>) -> Arc<Self> {
            Arc::new(Self {
                domain,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DomainResponder for ScriptedResponder {
        fn domain(&self) -> Domain {
            self.domain
        }

        async fn answer(&self, _question: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn roster_gateway(transactions: Option<Arc<dyn DomainResponder>>) -> Gateway {
        Gateway::new(
            IntentClassifier::default(),
            Arc::new(PortfolioResponder::new(Roster::default())),
            transactions,
        )
    }

    #[tokio::test]
    async fn test_blank_question_rejected_without_dispatch() {
        let sql = ScriptedResponder::new(Domain::Transaction, || Ok("unused".to_string()));
        let gateway = roster_gateway(Some(sql.clone()));

        for blank in ["", "   ", "\n\t"] {
            let err = assert_err!(gateway.ask(blank).await);
            assert!(matches!(err, GatewayError::InvalidQuestion));
        }
        assert_eq!(sql.calls(), 0);
    }

    #[tokio::test]
    async fn test_people_question_answered_from_roster() {
        let sql = ScriptedResponder::new(Domain::Transaction, || Ok("unused".to_string()));
        let gateway = roster_gateway(Some(sql.clone()));

        let exchange = assert_ok!(gateway.ask("Who is Virat Kohli?").await);

        assert_eq!(
            exchange.answer,
            "Virat Kohli is Client C001 (Risk: High, Portfolio: ₹5,000,000)"
        );
        assert_eq!(exchange.domain, Some(Domain::People));
        assert_eq!(exchange.visualization, None);
        assert!(exchange.processing_time().ends_with('s'));
        assert_eq!(sql.calls(), 0);
    }

    #[tokio::test]
    async fn test_transaction_question_dispatched_once() {
        let sql = ScriptedResponder::new(Domain::Transaction, || Ok("₹1,20,000 in total".to_string()));
        let gateway = roster_gateway(Some(sql.clone()));

        let exchange = gateway.ask("total amount invested this month").await.unwrap();

        assert_eq!(exchange.answer, "₹1,20,000 in total");
        assert_eq!(exchange.domain, Some(Domain::Transaction));
        assert_eq!(exchange.visualization, Some(VisualizationKind::TransactionAnalysis));
        assert_eq!(sql.calls(), 1);
    }

    #[tokio::test]
    async fn test_responder_error_becomes_apology() {
        let sql = ScriptedResponder::new(Domain::Transaction, || {
            Err(GatewayError::DatabaseError("connection refused".to_string()))
        });
        let gateway = roster_gateway(Some(sql));

        let exchange = gateway.ask("list all transactions").await.unwrap();

        assert_eq!(
            exchange.answer,
            "Sorry, I encountered an error while processing your question: Database error: connection refused. Please try rephrasing your question."
        );
    }

    #[tokio::test]
    async fn test_responder_panic_is_internal() {
        let sql = ScriptedResponder::new(Domain::Transaction, || panic!("responder bug"));
        let gateway = roster_gateway(Some(sql));

        let err = gateway.ask("list all transactions").await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }

    #[tokio::test]
    async fn test_missing_store_degrades() {
        let gateway = roster_gateway(None);
        assert!(!gateway.has_transaction_store());

        let exchange = gateway.ask("list all transactions").await.unwrap();
        assert!(exchange.answer.starts_with("Sorry, I encountered an error"));
        assert!(exchange.answer.contains("not configured"));
    }

    #[test]
    fn test_visualization_first_match_wins() {
        assert_eq!(
            visualization_for("Top 5 portfolios"),
            Some(VisualizationKind::PortfolioAnalysis)
        );
        // "relationship manager" contains "manager"
        assert_eq!(
            visualization_for("breakdown per relationship manager"),
            Some(VisualizationKind::PortfolioAnalysis)
        );
        assert_eq!(
            visualization_for("monthly investment trend"),
            Some(VisualizationKind::TransactionAnalysis)
        );
        assert_eq!(
            visualization_for("highest holders of TCS"),
            Some(VisualizationKind::RelationshipAnalysis)
        );
        assert_eq!(visualization_for("what is the weather"), None);
    }
}
