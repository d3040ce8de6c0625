//! Database Layer
//!
//! A thin layer over `sqlx` and PostgreSQL. Connection parameters come from
//! environment variables, and entities are stored through a small set of
//! generic operations keyed on their integer `id` field.
//!
//! ## Module Structure
//!
//! - `config.rs` - connection parameters from `EXTENDEDDB_<NAME>_*` variables
//! - `connection.rs` - `ExtendedDb`, the pooled connection handle
//! - `transaction.rs` - `ExtendedTx` and transaction helpers
//! - `traits.rs` - the `Entity` trait and column definitions
//! - `fields.rs` - field inspection through serde, ID validation
//! - `values.rs` - `DatabaseValue`, the bindable field value
//! - `statement.rs` - SQL text with its bound values
//! - `insert.rs` - Create
//! - `update.rs` - Update (save)
//! - `delete.rs` - DeleteByID
//! - `query.rs` - SelectByID, SelectAll, Filter
//! - `migrate.rs` - RegisterEntities
//! - `error.rs` - `DbError`
//!
//! ## Operations
//!
//! | operation | ID requirement | missing rows |
//! |-----------|----------------|--------------|
//! | `create` | blank (0) | n/a |
//! | `update` | set | inserted |
//! | `delete_by_id` | given | `Ok(0)` |
//! | `select_by_id` | given | `DbError::NotFound` |
//! | `select_all` / `filter` | none | empty vector |

pub mod config;
pub mod connection;
pub mod delete;
pub mod error;
pub mod fields;
pub mod insert;
pub mod migrate;
pub mod query;
pub mod statement;
pub mod traits;
pub mod transaction;
pub mod update;
pub mod values;
