//! Tool trait and registry
//!
//! Tools are what the SQL agent can call between reasoning steps. Each takes
//! a text input and returns a text observation. Database errors are returned
//! as `Error: ...` observations so the agent can correct itself; only
//! infrastructure failures surface as `Err`.

use crate::llm::LanguageModel;
use crate::sql::SqlExecutor;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Trait for a single agent tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &str) -> Result<String>;
}

/// Tool registry for looking up and executing tools.
///
/// Keeps registration order so prompts list tools deterministically.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// `name: description` lines for the agent prompt
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct QuerySqlTool {
    db: Arc<dyn SqlExecutor>,
}

impl QuerySqlTool {
    pub fn new(db: Arc<dyn SqlExecutor>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for QuerySqlTool {
    fn name(&self) -> &'static str {
        "sql_db_query"
    }

    fn description(&self) -> &'static str {
        "Input to this tool is a detailed and correct SQL query, output is a result from the database. \
         If the query is not correct, an error message will be returned. If an error is returned, \
         rewrite the query, check the query, and try again. If you encounter an issue with \
         Unknown column 'xxxx' in 'field list', use sql_db_schema to query the correct table fields."
    }

    async fn execute(&self, input: &str) -> Result<String> {
        match self.db.execute(input).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                debug!(error = %e, "Agent query failed");
                Ok(format!("Error: {}", e))
            }
        }
    }
}

pub struct InfoSqlTool {
    db: Arc<dyn SqlExecutor>,
}

impl InfoSqlTool {
    pub fn new(db: Arc<dyn SqlExecutor>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for InfoSqlTool {
    fn name(&self) -> &'static str {
        "sql_db_schema"
    }

    fn description(&self) -> &'static str {
        "Input to this tool is a comma-separated list of tables, output is the schema and sample rows \
         for those tables. Be sure that the tables actually exist by calling sql_db_list_tables first! \
         Example Input: table1, table2, table3"
    }

    async fn execute(&self, input: &str) -> Result<String> {
        let tables: Vec<String> = input
            .split(',')
            .map(|t| t.trim().trim_matches('`').to_string())
            .filter(|t| !t.is_empty())
            .collect();

        match self.db.table_info(Some(&tables)).await {
            Ok(info) => Ok(info),
            Err(e) => Ok(format!("Error: {}", e)),
        }
    }
}

pub struct ListSqlTablesTool {
    db: Arc<dyn SqlExecutor>,
}

impl ListSqlTablesTool {
    pub fn new(db: Arc<dyn SqlExecutor>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ListSqlTablesTool {
    fn name(&self) -> &'static str {
        "sql_db_list_tables"
    }

    fn description(&self) -> &'static str {
        "Input is an empty string, output is a comma-separated list of tables in the database."
    }

    async fn execute(&self, _input: &str) -> Result<String> {
        Ok(self.db.list_tables().await?.join(", "))
    }
}

pub struct QueryCheckerTool {
    llm: Arc<dyn LanguageModel>,
    dialect: &'static str,
}

impl QueryCheckerTool {
    pub fn new(llm: Arc<dyn LanguageModel>, dialect: &'static str) -> Self {
        Self { llm, dialect }
    }

    fn prompt(&self, query: &str) -> String {
        format!(
            r#"{query}
Double check the {dialect} query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.

Output the final SQL query only.

SQL Query: "#,
            query = query,
            dialect = self.dialect,
        )
    }
}

#[async_trait]
impl Tool for QueryCheckerTool {
    fn name(&self) -> &'static str {
        "sql_db_query_checker"
    }

    fn description(&self) -> &'static str {
        "Use this tool to double check if your query is correct before executing it. \
         Always use this tool before executing a query with sql_db_query!"
    }

    async fn execute(&self, input: &str) -> Result<String> {
        self.llm.generate(&self.prompt(input)).await
    }
}

/// The SQL toolkit handed to the agent
pub fn create_sql_toolkit(db: Arc<dyn SqlExecutor>, llm: Arc<dyn LanguageModel>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(QuerySqlTool::new(db.clone())));
    registry.register(Arc::new(InfoSqlTool::new(db.clone())));
    registry.register(Arc::new(ListSqlTablesTool::new(db)));
    registry.register(Arc::new(QueryCheckerTool::new(llm, "mysql")));

    registry
}
