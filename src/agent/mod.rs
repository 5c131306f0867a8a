//! SQL agent - bounded reasoning loop
//!
//! QUESTION → THOUGHT → ACTION → OBSERVATION → ... → FINAL ANSWER
//!
//! The language model picks a tool from the SQL toolkit, the tool runs, and
//! its observation is appended to the scratchpad for the next step. The loop
//! is capped by an iteration count and a wall-clock budget; exhausting either
//! yields the `AGENT_STOPPED` sentinel instead of an answer.

use crate::llm::LanguageModel;
use crate::sql::SqlExecutor;
use crate::tools::{create_sql_toolkit, ToolRegistry};
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Returned when the loop runs out of iterations or time
pub const AGENT_STOPPED: &str = "Agent stopped due to iteration limit or time limit.";

const FINAL_ANSWER: &str = "Final Answer:";
const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";
const BOTH_ANSWER_AND_ACTION: &str =
    "Parsing LLM output produced both a final answer and a parse-able action";

lazy_static! {
    static ref ACTION: Regex = Regex::new(
        r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)"
    )
    .expect("valid action pattern");
    static ref ACTION_ONLY: Regex = Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("valid action pattern");
}

/// A tool-using agent that answers a question against the database
#[async_trait]
pub trait SqlAgent: Send + Sync {
    async fn run(&self, question: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct AgentLimits {
    pub max_iterations: usize,
    pub max_execution_time: Duration,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_execution_time: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Finish(String),
    Action { tool: String, input: String },
}

/// Parse one model turn. `Err` carries the observation to feed back.
pub fn parse_step(text: &str) -> std::result::Result<AgentStep, String> {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = ACTION.captures(text) {
        if includes_answer {
            return Err(BOTH_ANSWER_AND_ACTION.to_string());
        }
        let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let input = caps
            .get(2)
            .map(|m| m.as_str().trim().trim_matches('"'))
            .unwrap_or_default();

        return Ok(AgentStep::Action {
            tool: tool.to_string(),
            input: input.to_string(),
        });
    }

    if let Some(pos) = text.find(FINAL_ANSWER) {
        let answer = text[pos + FINAL_ANSWER.len()..].trim();
        return Ok(AgentStep::Finish(answer.to_string()));
    }

    if !ACTION_ONLY.is_match(text) {
        Err(MISSING_ACTION.to_string())
    } else {
        Err(MISSING_ACTION_INPUT.to_string())
    }
}

/// Emulates a stop sequence: the model must not write its own observations
fn cut_at_observation(text: &str) -> &str {
    match text.find("\nObservation:") {
        Some(pos) => &text[..pos],
        None => text,
    }
}

pub struct ReactSqlAgent {
    llm: Arc<dyn LanguageModel>,
    db: Arc<dyn SqlExecutor>,
    tools: ToolRegistry,
    limits: AgentLimits,
}

impl ReactSqlAgent {
    pub fn new(llm: Arc<dyn LanguageModel>, db: Arc<dyn SqlExecutor>, limits: AgentLimits) -> Self {
        let tools = create_sql_toolkit(db.clone(), llm.clone());
        Self {
            llm,
            db,
            tools,
            limits,
        }
    }

    async fn prompt_prefix(&self, question: &str) -> String {
        let schema = match self.db.table_info(None).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Failed to load schema for agent: {}", e);
                "Schema not available".to_string()
            }
        };

        format!(
            r#"You are a SQL expert helping to query a MySQL database.

Database Schema:
{schema}

Available tools:
{tools}

IMPORTANT RULES:
1. Always check the schema before writing queries
2. Use EXACT column names from the schema: transaction_id, client_id, stock_name, amount_invested, date_, rm_name
3. The table name is 'transactions'
4. Use proper MySQL syntax
5. Format dates as 'YYYY-MM-DD'
6. Always provide a clear final answer
7. If you encounter an error, analyze it and try a corrected query
8. For "top N" queries, use LIMIT N
9. For sorting by amount, use ORDER BY amount_invested DESC
10. Always prioritize showing names over IDs when possible

Use this format:
Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Question: {question}
Thought:"#,
            schema = schema,
            tools = self.tools.describe(),
            tool_names = self.tools.list().join(", "),
            question = question,
        )
    }
}

#[async_trait]
impl SqlAgent for ReactSqlAgent {
    async fn run(&self, question: &str) -> Result<String> {
        let started = Instant::now();
        let deadline = started + self.limits.max_execution_time;
        let prefix = self.prompt_prefix(question).await;
        let mut scratchpad = String::new();

        for iteration in 1..=self.limits.max_iterations {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let prompt = format!("{}{}", prefix, scratchpad);
            let Ok(completion) = timeout(remaining, self.llm.generate(&prompt)).await else {
                break;
            };
            let completion = completion?;
            let turn = cut_at_observation(&completion);

            let observation = match parse_step(turn) {
                Ok(AgentStep::Finish(answer)) => {
                    info!(iteration, elapsed_ms = started.elapsed().as_millis() as u64, "Agent finished");
                    return Ok(answer);
                }
                Ok(AgentStep::Action { tool, input }) => {
                    debug!(iteration, tool = %tool, "Agent action");
                    match self.tools.get(&tool) {
                        Some(t) => {
                            let remaining = deadline.saturating_duration_since(Instant::now());
                            let Ok(output) = timeout(remaining, t.execute(&input)).await else {
                                break;
                            };
                            output?
                        }
                        None => format!(
                            "{} is not a valid tool, try one of [{}].",
                            tool,
                            self.tools.list().join(", ")
                        ),
                    }
                }
                Err(invalid) => {
                    debug!(iteration, "Agent output could not be parsed");
                    invalid
                }
            };

            scratchpad.push_str(turn);
            scratchpad.push_str("\nObservation: ");
            scratchpad.push_str(&observation);
            scratchpad.push_str("\nThought: ");
        }

        warn!(
            max_iterations = self.limits.max_iterations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Agent stopped before reaching a final answer"
        );
        Ok(AGENT_STOPPED.to_string())
    }
}
