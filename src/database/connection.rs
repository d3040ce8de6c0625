//! Database Connection Management
//!
//! [`ExtendedDb`] owns the connection pool of one named connection and exposes
//! the generic entity operations. Each operation borrows a pooled connection
//! for its duration.
//!
//! ## Example
//!
//! ```ignore
//! use extended_db::{ExtendedDb, register_entities};
//!
//! let db = ExtendedDb::connect("MAIN").await?;
//! register_entities!(db, Account).await?;
//!
//! let mut account = Account { id: 0, email: "a@example.com".into(), nickname: None };
//! db.create(&mut account).await?;
//! let found: Account = db.select_by_id(account.id).await?;
//! ```

use serde::Serialize;
use sqlx::{Connection, PgPool};
use tracing::info;

use crate::database::config::ConnectionConfig;
use crate::database::error::Result;
use crate::database::traits::{Entity, TableSchema};
use crate::database::values::DatabaseValue;
use crate::database::{delete, insert, migrate, query, update};

#[derive(Debug, Clone)]
pub struct ExtendedDb {
    pub(crate) pool: PgPool,
    pub(crate) connection_name: String,
}

impl ExtendedDb {
    /// Connects using the `EXTENDEDDB_<NAME>_*` environment variables and
    /// verifies the connection with a ping.
    pub async fn connect(name: &str) -> Result<Self> {
        let config = ConnectionConfig::from_env(name)?;
        Self::connect_with(name, &config).await
    }

    pub async fn connect_with(name: &str, config: &ConnectionConfig) -> Result<Self> {
        info!(
            connection = name,
            dsn = %config.redacted_dsn(),
            "connecting to {} database",
            config.database_type
        );
        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await?;

        let db = ExtendedDb {
            pool,
            connection_name: name.to_string(),
        };
        db.ping().await?;
        info!(connection = name, "database connection verified");
        Ok(db)
    }

    /// Wraps an already configured pool.
    pub fn from_pool(name: &str, pool: PgPool) -> Self {
        ExtendedDb {
            pool,
            connection_name: name.to_string(),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Inserts `entity`, which must have a blank ID, and refreshes it from the
    /// stored row.
    pub async fn create<T: Entity>(&self, entity: &mut T) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert::create(&mut *conn, entity).await
    }

    /// Saves every column of `entity`, which must have an ID, and refreshes it
    /// from the stored row.
    pub async fn update<T: Entity>(&self, entity: &mut T) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        update::update(&mut *conn, entity).await
    }

    /// Returns the number of deleted rows.
    pub async fn delete_by_id<T: Entity>(&self, id: u64) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        delete::delete_by_id::<T>(&mut *conn, id).await
    }

    pub async fn select_by_id<T: Entity>(&self, id: u64) -> Result<T> {
        let mut conn = self.pool.acquire().await?;
        query::select_by_id(&mut *conn, id).await
    }

    pub async fn select_all<T: Entity>(&self) -> Result<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        query::select_all(&mut *conn).await
    }

    /// Rows matching every non-zero field of `filter`.
    pub async fn filter<T: Entity, F: Serialize + ?Sized + Sync>(
        &self,
        filter: &F,
    ) -> Result<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        query::filter(&mut *conn, filter).await
    }

    /// Rows matching every `(column, value)` pair, zero values included.
    pub async fn filter_by<T: Entity>(&self, params: Vec<(&str, DatabaseValue)>) -> Result<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        query::filter_by(&mut *conn, owned_params(params)).await
    }

    /// Creates missing tables and columns for the given entity schemas.
    pub async fn register_entities(&self, schemas: Vec<TableSchema>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        migrate::register_entities(&mut *tx, &schemas).await?;
        tx.commit().await?;
        Ok(())
    }
}

pub(crate) fn owned_params(params: Vec<(&str, DatabaseValue)>) -> Vec<(String, DatabaseValue)> {
    params
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect()
}
