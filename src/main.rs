use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use extended_db::{ConnectionConfig, ExtendedDb};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Checks database connections configured through `EXTENDEDDB_<NAME>_*` variables.
#[derive(Parser)]
#[command(name = "extended-db", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect and verify the connection
    Ping {
        /// Connection name, e.g. MAIN for EXTENDEDDB_MAIN_HOST
        name: String,
    },
    /// Print the connection string with the password masked
    Dsn { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|err| anyhow!(err))?;

    match Cli::parse().command {
        Command::Ping { name } => {
            let db = ExtendedDb::connect(&name).await?;
            info!(connection = db.connection_name(), "ping ok");
            db.close().await;
        }
        Command::Dsn { name } => {
            let config = ConnectionConfig::from_env(&name)?;
            println!("{}", config.redacted_dsn());
        }
    }
    Ok(())
}
