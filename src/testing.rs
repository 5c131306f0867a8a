//! Scripted collaborators for unit tests

use crate::agent::SqlAgent;
use crate::error::GatewayError;
use crate::llm::LanguageModel;
use crate::sql::SqlExecutor;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const TRANSACTIONS_SCHEMA: &str = "CREATE TABLE transactions (\n  transaction_id varchar(10),\n  client_id varchar(10),\n  stock_name varchar(50),\n  amount_invested decimal(12,2),\n  date_ date,\n  rm_name varchar(50)\n)";

/// Returns scripted completions in order and records every prompt
pub struct StubLlm {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl StubLlm {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Queue a failure after the scripted responses
    pub fn then_fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::LlmError(message.to_string())));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::LlmError("no scripted response".to_string())))
    }
}

/// In-memory stand-in for the transactions database
pub struct StubDatabase {
    rows: String,
    always_fail: Option<String>,
    schema_missing: bool,
    next_failures: Mutex<VecDeque<String>>,
    executed: Mutex<Vec<String>>,
}

impl StubDatabase {
    pub fn new() -> Self {
        Self {
            rows: "[('T001', 'C001', 'TCS', 250000.00, '2025-01-15', 'Amit Shah')]".to_string(),
            always_fail: None,
            schema_missing: false,
            next_failures: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: &str) -> Self {
        self.rows = rows.to_string();
        self
    }

    /// Every statement fails with this message
    pub fn fail_with(mut self, message: &str) -> Self {
        self.always_fail = Some(message.to_string());
        self
    }

    /// Schema lookups fail as if the server were unreachable
    pub fn without_schema(mut self) -> Self {
        self.schema_missing = true;
        self
    }

    /// The next statement fails with this message
    pub fn fail_next(self, message: &str) -> Self {
        self.next_failures.lock().unwrap().push_back(message.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for StubDatabase {
    async fn execute(&self, sql: &str) -> Result<String> {
        self.executed.lock().unwrap().push(sql.to_string());

        if let Some(message) = &self.always_fail {
            return Err(GatewayError::DatabaseError(message.clone()));
        }
        if let Some(message) = self.next_failures.lock().unwrap().pop_front() {
            return Err(GatewayError::DatabaseError(message));
        }
        Ok(self.rows.clone())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(vec!["transactions".to_string()])
    }

    async fn table_info(&self, tables: Option<&[String]>) -> Result<String> {
        if self.schema_missing {
            return Err(GatewayError::DatabaseError("Can't connect to MySQL server".to_string()));
        }
        match tables {
            Some(names) if names.iter().any(|t| t != "transactions") => Err(
                GatewayError::DatabaseError(format!("table_names {:?} not found in database", names)),
            ),
            _ => Ok(TRANSACTIONS_SCHEMA.to_string()),
        }
    }
}

/// Agent that returns a fixed outcome
pub struct StubAgent {
    outcome: std::result::Result<String, String>,
    calls: Mutex<usize>,
}

impl StubAgent {
    pub fn answering(answer: &str) -> Self {
        Self {
            outcome: Ok(answer.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SqlAgent for StubAgent {
    async fn run(&self, _question: &str) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        self.outcome
            .clone()
            .map_err(GatewayError::AgentError)
    }
}
