//! Runtime settings
//!
//! Everything comes from environment variables (a `.env` file is loaded by the
//! binaries before `Settings::from_env`). Parsing goes through a lookup
//! function so tests never touch the process environment.

use crate::agent::AgentLimits;
use crate::error::GatewayError;
use crate::llm::LlmSettings;
use crate::sql::SqlSettings;
use crate::Result;
use reqwest::Url;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;

/// Document-store coordinates; reported by `/health`, never connected to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStoreSettings {
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: LlmSettings,
    /// `None` when no relational store is configured
    pub sql: Option<SqlSettings>,
    pub documents: DocumentStoreSettings,
    pub sql_agent_enabled: bool,
    pub agent: AgentLimits,
    pub port: u16,
}

/// Which collaborators have configuration present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfiguredStores {
    pub openai: bool,
    pub mongodb: bool,
    pub mysql: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_defaults = LlmSettings::default();
        let llm = LlmSettings {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or(llm_defaults.base_url),
            model: get("OPENAI_MODEL").unwrap_or(llm_defaults.model),
            temperature: llm_defaults.temperature,
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", llm_defaults.max_tokens)?,
            timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", 30)?),
        };

        let sql = match mysql_uri(&get)? {
            Some(uri) => Some(SqlSettings {
                uri,
                max_connections: 5,
                acquire_timeout: Duration::from_secs(10),
                statement_timeout: Duration::from_secs(parse_or(&get, "SQL_TIMEOUT_SECS", 30)?),
            }),
            None => None,
        };

        let documents = DocumentStoreSettings {
            uri: get("MONGODB_URI"),
            database: get("MONGODB_DATABASE").unwrap_or_else(|| "valuefy".to_string()),
            collection: get("MONGODB_COLLECTION").unwrap_or_else(|| "clients".to_string()),
        };

        let agent_defaults = AgentLimits::default();
        let agent = AgentLimits {
            max_iterations: parse_or(&get, "AGENT_MAX_ITERATIONS", agent_defaults.max_iterations)?,
            max_execution_time: Duration::from_secs(parse_or(
                &get,
                "AGENT_MAX_EXECUTION_SECS",
                agent_defaults.max_execution_time.as_secs(),
            )?),
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            llm,
            sql,
            documents,
            sql_agent_enabled: parse_bool(get("SQL_AGENT_ENABLED"), true),
            agent,
            port,
        })
    }

    pub fn configured(&self) -> ConfiguredStores {
        ConfiguredStores {
            openai: self.llm.api_key.is_some(),
            mongodb: self.documents.uri.is_some(),
            mysql: self.sql.is_some(),
        }
    }
}

/// `MYSQL_URI` wins; otherwise compose one when `MYSQL_HOST` is set
fn mysql_uri<G>(get: &G) -> Result<Option<String>>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(uri) = get("MYSQL_URI") {
        return Ok(Some(uri));
    }
    let Some(host) = get("MYSQL_HOST") else {
        return Ok(None);
    };

    let port: u16 = parse_or(get, "MYSQL_PORT", 3306)?;
    let database = get("MYSQL_DATABASE").unwrap_or_else(|| "valuefy".to_string());
    let user = get("MYSQL_USER").unwrap_or_else(|| "root".to_string());

    let mut url = Url::parse(&format!("mysql://{}:{}/{}", host, port, database))
        .map_err(|e| GatewayError::ConfigError(format!("invalid MySQL host '{}': {}", host, e)))?;
    let credentials = url
        .set_username(&user)
        .and_then(|_| url.set_password(get("MYSQL_PASSWORD").as_deref()));
    if credentials.is_err() {
        return Err(GatewayError::ConfigError(
            "MySQL credentials cannot be set on this URI".to_string(),
        ));
    }

    Ok(Some(url.to_string()))
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| GatewayError::ConfigError(format!("{}='{}': {}", key, raw, e)))
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
