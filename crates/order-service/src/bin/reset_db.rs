//! Order database reset
//!
//! Drops the orders table and recreates it empty. Every stored order is lost.

use anyhow::{Context, Result};
use clap::Parser;
use order_service::Storage;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "reset-db")]
#[command(about = "Drop and recreate the bakery orders table")]
struct Cli {
    /// SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "orders.db")]
    database: PathBuf,

    /// Confirm that all stored orders may be destroyed
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();
    run(Cli::parse()).await
}

/// Reset the database named on the command line, only when `--yes` is given
async fn run(cli: Cli) -> Result<()> {
    if !cli.yes {
        warn!(
            "Refusing to reset {} without --yes; this deletes every order",
            cli.database.display()
        );
        anyhow::bail!("reset not confirmed");
    }

    let storage = Storage::new(cli.database, Duration::from_secs(5));
    storage
        .reset()
        .await
        .with_context(|| format!("Failed to reset {}", storage.path().display()))?;

    info!("Old orders deleted; the table is empty and ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_common::{NewOrder, OrderForm};
    use tempfile::TempDir;

    async fn seeded_storage(dir: &TempDir) -> Storage {
        let storage = Storage::new(dir.path().join("orders.db"), Duration::from_millis(500));
        storage.initialize().await.unwrap();

        for client in ["Jane", "Bob"] {
            let form = OrderForm {
                client: client.to_string(),
                phone: "+1555".to_string(),
                cake_flavour: "Vanilla".to_string(),
                size: "Medium".to_string(),
                date: "2024-01-01".to_string(),
                time: "10:00".to_string(),
                ..Default::default()
            };
            storage.append(&NewOrder::try_from(&form).unwrap()).await.unwrap();
        }

        storage
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("reset-db").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_reset_without_confirmation_keeps_orders() {
        let dir = TempDir::new().unwrap();
        let storage = seeded_storage(&dir).await;
        let path = storage.path().to_str().unwrap().to_string();

        let err = run(parse(&["--database", &path])).await.unwrap_err();
        assert!(err.to_string().contains("reset not confirmed"));

        assert_eq!(storage.count().await.unwrap(), 2);
        assert_eq!(storage.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_confirmed_reset_empties_table() {
        let dir = TempDir::new().unwrap();
        let storage = seeded_storage(&dir).await;
        let path = storage.path().to_str().unwrap().to_string();

        run(parse(&["--database", &path, "--yes"])).await.unwrap();

        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
