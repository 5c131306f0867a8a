//! Relational store access
//!
//! `SqlExecutor` is the only path by which SQL reaches the database.
//! `MySqlDatabase` implements it over a lazily-connected sqlx pool; every
//! statement is bounded by a timeout.

pub mod render;

use crate::error::GatewayError;
use crate::Result;
use async_trait::async_trait;
use render::{column_names, decode_row, render_sample_block, render_tuples};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Executor;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const SAMPLE_ROWS_IN_SCHEMA: usize = 3;

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a statement and return its rows as text
    async fn execute(&self, sql: &str) -> Result<String>;

    async fn list_tables(&self) -> Result<Vec<String>>;

    /// DDL plus sample rows for the given tables, or for every table when `None`
    async fn table_info(&self, tables: Option<&[String]>) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct SqlSettings {
    pub uri: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
}

pub struct MySqlDatabase {
    pool: MySqlPool,
    statement_timeout: Duration,
    schema: OnceCell<String>,
}

impl MySqlDatabase {
    /// Build the pool without connecting; the first statement opens a connection.
    pub fn connect_lazy(settings: &SqlSettings) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_lazy(&settings.uri)?;

        info!(
            max_connections = settings.max_connections,
            "MySQL pool configured"
        );

        Ok(Self {
            pool,
            statement_timeout: settings.statement_timeout,
            schema: OnceCell::new(),
        })
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<MySqlRow>> {
        debug!(sql, "Executing statement");

        tokio::time::timeout(self.statement_timeout, self.pool.fetch_all(sql))
            .await
            .map_err(|_| {
                GatewayError::DatabaseError(format!(
                    "Statement timed out after {}s",
                    self.statement_timeout.as_secs()
                ))
            })?
            .map_err(|e| GatewayError::DatabaseError(e.to_string()))
    }

    async fn describe_table(&self, table: &str) -> Result<String> {
        let ddl_rows = self.fetch(&format!("SHOW CREATE TABLE `{}`", table)).await?;
        let ddl = ddl_rows
            .first()
            .and_then(|row| decode_row(row).get(1).map(|c| c.plain()))
            .unwrap_or_default();

        let sample = self
            .fetch(&format!(
                "SELECT * FROM `{}` LIMIT {}",
                table, SAMPLE_ROWS_IN_SCHEMA
            ))
            .await?;

        let block = match sample.first() {
            Some(first) => {
                let columns = column_names(first);
                let rows: Vec<_> = sample.iter().map(decode_row).collect();
                render_sample_block(table, &columns, &rows)
            }
            None => format!("/*\n0 rows from {} table\n*/", table),
        };

        Ok(format!("{}\n\n{}", ddl.trim(), block))
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<String> {
        let mut sections = Vec::with_capacity(tables.len());
        for table in tables {
            sections.push(self.describe_table(table).await?);
        }
        Ok(sections.join("\n\n"))
    }
}

#[async_trait]
impl SqlExecutor for MySqlDatabase {
    async fn execute(&self, sql: &str) -> Result<String> {
        let rows = self.fetch(sql).await?;
        let decoded: Vec<_> = rows.iter().map(decode_row).collect();
        debug!(row_count = decoded.len(), "Statement returned");
        Ok(render_tuples(&decoded))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self.fetch("SHOW TABLES").await?;
        Ok(rows
            .iter()
            .filter_map(|row| decode_row(row).first().map(|c| c.plain()))
            .collect())
    }

    async fn table_info(&self, tables: Option<&[String]>) -> Result<String> {
        match tables {
            None => self
                .schema
                .get_or_try_init(|| async {
                    let known = self.list_tables().await?;
                    let schema = self.describe_tables(&known).await?;
                    info!(tables = known.len(), "Schema information loaded");
                    Ok::<String, GatewayError>(schema)
                })
                .await
                .cloned(),
            Some(requested) => {
                let known = self.list_tables().await?;
                let missing: Vec<&String> =
                    requested.iter().filter(|t| !known.contains(t)).collect();
                if !missing.is_empty() {
                    warn!(?missing, "Schema requested for unknown tables");
                    return Err(GatewayError::DatabaseError(format!(
                        "table_names {:?} not found in database",
                        missing
                    )));
                }
                self.describe_tables(requested).await
            }
        }
    }
}
