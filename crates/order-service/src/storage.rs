//! SQLite storage for cake orders
//!
//! Every operation opens its own connection on the blocking pool and drops it
//! before returning, error paths included. Rows are append-only.

use bakery_common::{Error, NewOrder, Order, Result};
use rusqlite::{named_params, Connection, ErrorCode, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    client       TEXT NOT NULL CHECK (length(client) > 0),
    phone        TEXT NOT NULL CHECK (length(phone) > 0),
    cake_flavour TEXT NOT NULL CHECK (length(cake_flavour) > 0),
    size         TEXT NOT NULL CHECK (length(size) > 0),
    colour       TEXT NOT NULL DEFAULT '',
    details      TEXT NOT NULL DEFAULT '',
    icing        TEXT NOT NULL DEFAULT '',
    delivery     TEXT NOT NULL DEFAULT '',
    date         TEXT NOT NULL CHECK (length(date) > 0),
    time         TEXT NOT NULL CHECK (length(time) > 0),
    location     TEXT NOT NULL DEFAULT '',
    writings     TEXT NOT NULL DEFAULT '',
    amount       REAL,
    deposit      REAL
)
"#;

const INSERT_ORDER: &str = r#"
INSERT INTO orders (
    client, phone, cake_flavour, size, colour, details, icing,
    delivery, date, time, location, writings,
    amount, deposit
) VALUES (
    :client, :phone, :cake_flavour, :size, :colour, :details, :icing,
    :delivery, :date, :time, :location, :writings,
    :amount, :deposit
)
"#;

const SELECT_ORDERS: &str = r#"
SELECT id, client, phone, cake_flavour, size, colour, details, icing,
       delivery, date, time, location, writings, amount, deposit
FROM orders
ORDER BY id DESC
"#;

/// Storage backend for cake orders
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Storage {
    /// Create a storage handle; no connection is opened until an operation runs
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    /// Database file backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the orders table if it does not exist yet
    pub async fn initialize(&self) -> Result<()> {
        self.with_connection(|conn| conn.execute_batch(CREATE_ORDERS_TABLE))
            .await?;

        info!("Order store ready at {}", self.path.display());
        Ok(())
    }

    /// Append one order, returning its id
    pub async fn append(&self, order: &NewOrder) -> Result<i64> {
        let order = order.clone();

        let id = self
            .with_connection(move |conn| {
                conn.execute(
                    INSERT_ORDER,
                    named_params! {
                        ":client": order.client,
                        ":phone": order.phone,
                        ":cake_flavour": order.cake_flavour,
                        ":size": order.size,
                        ":colour": order.colour,
                        ":details": order.details,
                        ":icing": order.icing,
                        ":delivery": order.delivery,
                        ":date": order.date,
                        ":time": order.time,
                        ":location": order.location,
                        ":writings": order.writings,
                        ":amount": order.amount,
                        ":deposit": order.deposit,
                    },
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        info!("Stored order {}", id);
        Ok(id)
    }

    /// All orders, most recent first
    pub async fn list_all(&self) -> Result<Vec<Order>> {
        let orders = self
            .with_connection(|conn| {
                let mut stmt = conn.prepare(SELECT_ORDERS)?;
                let rows = stmt.query_map([], order_from_row)?;
                rows.collect::<rusqlite::Result<Vec<Order>>>()
            })
            .await?;

        debug!("Loaded {} orders", orders.len());
        Ok(orders)
    }

    /// Number of stored orders
    pub async fn count(&self) -> Result<usize> {
        let count: i64 = self
            .with_connection(|conn| {
                conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            })
            .await?;

        Ok(count as usize)
    }

    /// Drop the orders table and recreate it empty. Every stored order is lost.
    pub async fn reset(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch("DROP TABLE IF EXISTS orders")?;
            conn.execute_batch(CREATE_ORDERS_TABLE)
        })
        .await?;

        info!("Order store reset at {}", self.path.display());
        Ok(())
    }

    /// Run `op` on a fresh connection off the async runtime
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;

        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            conn.busy_timeout(busy_timeout)?;
            op(&conn)
        })
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!("Storage task failed: {}", e)))?
        .map_err(classify)
    }
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get("id")?,
        fields: NewOrder {
            client: row.get("client")?,
            phone: row.get("phone")?,
            cake_flavour: row.get("cake_flavour")?,
            size: row.get("size")?,
            colour: row.get("colour")?,
            details: row.get("details")?,
            icing: row.get("icing")?,
            delivery: row.get("delivery")?,
            date: row.get("date")?,
            time: row.get("time")?,
            location: row.get("location")?,
            writings: row.get("writings")?,
            amount: row.get("amount")?,
            deposit: row.get("deposit")?,
        },
    })
}

fn classify(err: rusqlite::Error) -> Error {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::Constraint(err.to_string()),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            Error::Busy(err.to_string())
        }
        _ => Error::Storage(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_common::OrderForm;

    fn test_storage(dir: &tempfile::TempDir) -> Storage {
        Storage::new(dir.path().join("orders.db"), Duration::from_millis(500))
    }

    fn order(client: &str) -> NewOrder {
        NewOrder::try_from(&OrderForm {
            client: client.to_string(),
            phone: "+1555".to_string(),
            cake_flavour: "Vanilla".to_string(),
            size: "Medium".to_string(),
            date: "2024-01-01".to_string(),
            time: "10:00".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        storage.initialize().await.unwrap();
        storage.append(&order("Jane")).await.unwrap();
        storage.initialize().await.unwrap();

        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);
        storage.initialize().await.unwrap();

        let mut first = order("Jane");
        first.colour = "Pink".to_string();
        first.amount = Some(2500.0);
        first.deposit = Some(1000.0);

        let first_id = storage.append(&first).await.unwrap();
        let second_id = storage.append(&order("Kofi")).await.unwrap();

        assert_eq!(first_id, 1);
        assert_eq!(second_id, 2);

        let orders = storage.list_all().await.unwrap();
        assert_eq!(orders.len(), 2);

        // Most recent first
        assert_eq!(orders[0].id, 2);
        assert_eq!(orders[0].fields.client, "Kofi");
        assert_eq!(orders[1].id, 1);
        assert_eq!(orders[1].fields, first);
    }

    #[tokio::test]
    async fn test_empty_required_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);
        storage.initialize().await.unwrap();

        let mut incomplete = order("Jane");
        incomplete.size = String::new();

        let err = storage.append(&incomplete).await.unwrap_err();
        assert!(matches!(err, Error::Constraint(_)), "got {err:?}");

        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_table_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        let err = storage.list_all().await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_reset_drops_all_orders() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);
        storage.initialize().await.unwrap();

        storage.append(&order("Jane")).await.unwrap();
        storage.append(&order("Kofi")).await.unwrap();

        storage.reset().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);

        // Ids start over after the table is recreated
        let id = storage.append(&order("Ama")).await.unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_locked_database_reports_busy() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);
        storage.initialize().await.unwrap();

        let holder = Connection::open(storage.path()).unwrap();
        holder.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let err = storage.append(&order("Jane")).await.unwrap_err();
        assert!(matches!(err, Error::Busy(_)), "got {err:?}");

        holder.execute_batch("ROLLBACK").unwrap();
        storage.append(&order("Jane")).await.unwrap();
    }
}
