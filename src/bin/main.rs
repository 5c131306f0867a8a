//! One-shot CLI: `ask "<question>"`, or `ask --debug-db` to inspect the
//! transactions database.

use portfolio_qa_gateway::{
    sql::{MySqlDatabase, SqlExecutor},
    Gateway, GatewayError, Settings,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let settings = Settings::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--debug-db") {
        return debug_database(&settings).await;
    }

    let question = args.join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: ask <question> | ask --debug-db");
        std::process::exit(2);
    }

    let gateway = Gateway::from_settings(&settings)?;
    info!(question = %question, "Asking");

    match gateway.ask(&question).await {
        Ok(exchange) => {
            println!("{}", exchange.answer);
            println!();
            println!("Domain: {}", exchange.domain.map(|d| d.to_string()).unwrap_or_default());
            println!("Processing time: {}", exchange.processing_time());
            Ok(())
        }
        Err(e) => {
            eprintln!("Question failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}

async fn debug_database(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let sql = settings
        .sql
        .as_ref()
        .ok_or_else(|| GatewayError::ConfigError("MYSQL_URI is not set".to_string()))?;
    let db = MySqlDatabase::connect_lazy(sql)?;

    println!("=== DATABASE DEBUG ===");
    println!("Tables: {:?}", db.list_tables().await?);
    println!("\nSchema:\n{}", db.table_info(None).await?);
    println!(
        "\nTotal transactions: {}",
        db.execute("SELECT COUNT(*) as total FROM transactions").await?
    );

    Ok(())
}
