//! Environment-configured PostgreSQL access with generic entity operations.
//!
//! ```ignore
//! use extended_db::{ExtendedDb, register_entities};
//!
//! let db = ExtendedDb::connect("MAIN").await?;
//! register_entities!(db, Account).await?;
//! db.create(&mut account).await?;
//! let active: Vec<Account> = db.filter(&AccountFilter { active: true, ..Default::default() }).await?;
//! ```

pub mod database;
pub mod utils;

pub use database::config::{ConnectionConfig, DatabaseType, PoolConfig};
pub use database::connection::ExtendedDb;
pub use database::error::{DbError, Result};
pub use database::fields::entity_id;
pub use database::traits::{Column, Entity, TableSchema};
pub use database::transaction::ExtendedTx;
pub use database::values::DatabaseValue;
