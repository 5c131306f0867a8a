//! Transactional Query Responder
//!
//! Two tiers. The SQL agent gets the question first; when it is disabled,
//! fails, or gives up, a single-shot pipeline takes over:
//! intent → SQL generation → cleanup → execute (one column-fix retry) → phrasing.
//!
//! Every failure below the responder ends up as answer text.

use crate::agent::SqlAgent;
use crate::error::GatewayError;
use crate::intent::TransactionIntent;
use crate::llm::LanguageModel;
use crate::models::Domain;
use crate::responder::DomainResponder;
use crate::sql::SqlExecutor;
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Agent output at or below this many characters is not trusted
const MIN_AGENT_ANSWER_LEN: usize = 10;

const AGENT_STOPPED_MARKER: &str = "Agent stopped";
const UNKNOWN_COLUMN: &str = "Unknown column";
const NO_SQL: &str = "Could not generate SQL query";

/// Misspellings and aliases the model tends to produce, applied in order
const COLUMN_FIXES: [(&str, &str); 6] = [
    ("transactoin_id", "transaction_id"),
    ("amount", "amount_invested"),
    ("transaction_date", "date_"),
    ("date", "date_"),
    ("rm", "rm_name"),
    ("relationship_manager", "rm_name"),
];

lazy_static! {
    static ref COLUMN_FIX_PATTERNS: Vec<(Regex, &'static str)> = COLUMN_FIXES
        .iter()
        .map(|(wrong, right)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(wrong));
            (Regex::new(&pattern).expect("valid column pattern"), *right)
        })
        .collect();
    static ref SQL_FENCE: Regex = Regex::new(r"```sql\n?").expect("valid fence pattern");
    static ref FENCE: Regex = Regex::new(r"```\n?").expect("valid fence pattern");
}

/// Outcome of running the generated statement
#[derive(Debug, Clone, PartialEq)]
enum Execution {
    Rows(String),
    Failed(String),
}

pub struct TransactionResponder {
    llm: Arc<dyn LanguageModel>,
    db: Arc<dyn SqlExecutor>,
    agent: Option<Arc<dyn SqlAgent>>,
}

impl TransactionResponder {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        db: Arc<dyn SqlExecutor>,
        agent: Option<Arc<dyn SqlAgent>>,
    ) -> Self {
        Self { llm, db, agent }
    }

    async fn ask_agent(&self, question: &str) -> Option<String> {
        let agent = self.agent.as_ref()?;

        match agent.run(question).await {
            Ok(output)
                if output.trim().len() > MIN_AGENT_ANSWER_LEN
                    && !output.contains(AGENT_STOPPED_MARKER) =>
            {
                Some(output)
            }
            Ok(_) => {
                info!("Agent response insufficient, using direct SQL");
                None
            }
            Err(e) => {
                warn!(error = %e, "Agent failed, using direct SQL");
                None
            }
        }
    }

    async fn direct_sql(&self, question: &str) -> Result<String> {
        let intent = TransactionIntent::parse(question);
        let schema = self.db.table_info(None).await?;

        let Some(sql) = self.generate_sql(question, &schema, &intent).await else {
            return Ok(NO_SQL.to_string());
        };
        info!(sql = %sql, "Generated SQL");

        match self.execute_with_retry(&sql).await {
            Execution::Failed(message) => Ok(format!("Query execution failed: {}", message)),
            Execution::Rows(rows) => Ok(self.phrase(question, &sql, &rows, &intent).await),
        }
    }

    async fn generate_sql(
        &self,
        question: &str,
        schema: &str,
        intent: &TransactionIntent,
    ) -> Option<String> {
        let prompt = sql_prompt(question, schema, intent);

        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "SQL generation failed");
                return None;
            }
        };

        let sql = clean_sql(&raw, intent.limit);
        if sql.is_none() {
            warn!("Model returned an empty SQL statement");
        }
        sql
    }

    async fn execute_with_retry(&self, sql: &str) -> Execution {
        let message = match self.db.execute(sql).await {
            Ok(rows) => return Execution::Rows(rows),
            Err(e) => driver_message(e),
        };
        error!(error = %message, "Query failed");

        if message.contains(UNKNOWN_COLUMN) {
            let corrected = fix_column_names(sql);
            if corrected != sql {
                info!(sql = %corrected, "Retrying with corrected column names");
                match self.db.execute(&corrected).await {
                    Ok(rows) => return Execution::Rows(rows),
                    Err(e) => error!(error = %e, "Retry failed"),
                }
            }
        }

        Execution::Failed(message)
    }

    async fn phrase(&self, question: &str, sql: &str, rows: &str, intent: &TransactionIntent) -> String {
        let prompt = format_prompt(question, sql, rows, intent);

        match self.llm.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "Formatting pass failed");
                format!("Result: {}\n(Formatting error: {})", rows, e)
            }
        }
    }
}

#[async_trait]
impl DomainResponder for TransactionResponder {
    fn domain(&self) -> Domain {
        Domain::Transaction
    }

    async fn answer(&self, question: &str) -> Result<String> {
        info!(question, "Processing transaction question");

        if let Some(answer) = self.ask_agent(question).await {
            return Ok(answer);
        }

        match self.direct_sql(question).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                error!(error = %e, "SQL handler failed");
                Ok(format!("Error in SQL handler: {}", e))
            }
        }
    }
}

/// The driver's own message, without our error-kind prefix
fn driver_message(e: GatewayError) -> String {
    match e {
        GatewayError::DatabaseError(message) => message,
        other => other.to_string(),
    }
}

/// Strip markdown fences, terminate with `;`, and make sure a requested
/// limit is present. `None` when nothing but fences came back.
pub fn clean_sql(raw: &str, limit: Option<usize>) -> Option<String> {
    let without_fences = FENCE.replace_all(&SQL_FENCE.replace_all(raw, ""), "").into_owned();
    let mut sql = without_fences.trim().to_string();
    if sql.trim_end_matches(';').trim().is_empty() {
        return None;
    }

    if !sql.ends_with(';') {
        sql.push(';');
    }

    if let Some(n) = limit {
        if !sql.to_uppercase().contains("LIMIT") {
            sql = format!("{} LIMIT {};", sql.trim_end_matches(';'), n);
        }
    }

    Some(sql)
}

/// Whole-word, case-insensitive column substitutions
pub fn fix_column_names(sql: &str) -> String {
    COLUMN_FIX_PATTERNS
        .iter()
        .fold(sql.to_string(), |acc, (pattern, right)| {
            pattern.replace_all(&acc, *right).into_owned()
        })
}

fn sql_prompt(question: &str, schema: &str, intent: &TransactionIntent) -> String {
    let limit = intent
        .limit
        .map(|n| n.to_string())
        .unwrap_or_else(|| "None".to_string());

    format!(
        r#"
Based on this MySQL database schema:
{schema}

Generate a SQL query to answer: {question}

CRITICAL RULES:
1. Use EXACT column names: transaction_id, client_id, stock_name, amount_invested, date_, rm_name
2. Table name is: transactions
3. Use proper MySQL syntax
4. For date filtering, use date_ column with format 'YYYY-MM-DD'
5. For "top N" queries, use LIMIT N
6. For sorting by amount, use ORDER BY amount_invested DESC
7. Always prioritize showing names over IDs when possible
8. Return ONLY the SQL query, no explanation

Additional Requirements:
- Limit: {limit}
- Sort by: {sort_by}
- Sort order: {sort_order}

SQL Query:"#,
        schema = schema,
        question = question,
        limit = limit,
        sort_by = intent.sort_by.unwrap_or("None"),
        sort_order = intent.sort_order,
    )
}

fn format_prompt(question: &str, sql: &str, rows: &str, intent: &TransactionIntent) -> String {
    format!(
        r#"
Question: {question}
SQL Query: {sql}
Query Result: {rows}

Please provide a clear, natural language answer to the original question based on these results.

Guidelines:
1. Be concise but informative
2. Format numbers with commas for readability
3. Include currency symbols (₹) where applicable
4. If result is empty, say "No data found"
5. For lists, format them nicely
6. Don't include technical SQL details in the answer
7. For "top N" queries, emphasize the ranking
8. Prioritize showing names over IDs when possible
9. For amount-focused queries, highlight the amounts clearly

Additional Context:
- This is a "top N" query: {top_n}
- Names only requested: {names_only}
- Amount focus: {amount_focus}

Answer:"#,
        question = question,
        sql = sql,
        rows = rows,
        top_n = intent.top_n,
        names_only = intent.names_only,
        amount_focus = intent.amount_focus,
    )
}
