//! Entity Traits
//!
//! [`Entity`] must be implemented by every struct stored through
//! [`ExtendedDb`](crate::database::connection::ExtendedDb). Field values are
//! read from the entity's `Serialize` implementation, so the trait itself only
//! describes the table: its name, its columns, and how to rebuild a value from
//! a row.
//!
//! ## Example Implementation
//!
//! ```rust
//! use extended_db::database::traits::{Column, Entity};
//! use serde::Serialize;
//! use sqlx::{Error, Row, postgres::PgRow};
//!
//! #[derive(Debug, Default, Serialize)]
//! pub struct Account {
//!     pub id: u64,
//!     pub email: String,
//!     pub nickname: Option<String>,
//! }
//!
//! impl Entity for Account {
//!     fn columns() -> Vec<Column> {
//!         vec![
//!             Column::id(),
//!             Column::new("email", "TEXT"),
//!             Column::new("nickname", "TEXT").nullable(),
//!         ]
//!     }
//!
//!     fn from_row(row: &PgRow) -> Result<Self, Error> {
//!         Ok(Account {
//!             id: row.try_get::<i64, _>("id")? as u64,
//!             email: row.try_get("email")?,
//!             nickname: row.try_get("nickname")?,
//!         })
//!     }
//! }
//!
//! assert_eq!(Account::table_name(), "accounts");
//! ```

use serde::Serialize;
use sqlx::{Error, postgres::PgRow};

use crate::utils::strings::{short_type_name, table_name_for};

/// Name of the primary key field every entity must carry.
pub const ID_FIELD: &str = "id";

/// One column of an entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// SQL type used in `CREATE TABLE`, e.g. `TEXT`, `BIGINT`, `TIMESTAMPTZ`.
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    /// Optional SQL default expression, e.g. `now()`.
    pub default: Option<&'static str>,
}

impl Column {
    /// A `NOT NULL` column of the given SQL type.
    pub fn new(name: &'static str, sql_type: &'static str) -> Self {
        Column {
            name,
            sql_type,
            nullable: false,
            primary_key: false,
            default: None,
        }
    }

    /// The auto-incrementing `id BIGSERIAL PRIMARY KEY` column.
    pub fn id() -> Self {
        Column {
            name: ID_FIELD,
            sql_type: "BIGSERIAL",
            nullable: false,
            primary_key: true,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, expression: &'static str) -> Self {
        self.default = Some(expression);
        self
    }

    /// The type bound values are cast to. Serial pseudo-types cast to their
    /// underlying integer type.
    pub fn cast_type(&self) -> &'static str {
        match self.sql_type.to_ascii_uppercase().as_str() {
            "BIGSERIAL" | "SERIAL8" => "BIGINT",
            "SERIAL" | "SERIAL4" => "INTEGER",
            "SMALLSERIAL" | "SERIAL2" => "SMALLINT",
            _ => self.sql_type,
        }
    }

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`.
    pub fn definition(&self) -> String {
        let mut definition = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            definition.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            definition.push_str(" NOT NULL");
        }
        if let Some(default) = self.default {
            definition.push_str(&format!(" DEFAULT {}", default));
        }
        definition
    }
}

/// Table description handed to
/// [`register_entities`](crate::database::connection::ExtendedDb::register_entities).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub entity: String,
    pub table: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Trait implemented by every struct stored in the database.
pub trait Entity: Serialize + Send + Sync + Unpin + Sized {
    /// Columns of the entity table, including [`Column::id`].
    fn columns() -> Vec<Column>;

    /// Converts a database row into the entity.
    fn from_row(row: &PgRow) -> Result<Self, Error>;

    /// Table name; defaults to the pluralized snake_case type name.
    fn table_name() -> String {
        table_name_for(std::any::type_name::<Self>())
    }

    /// Type name used in error messages.
    fn entity_name() -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }

    fn schema() -> TableSchema {
        TableSchema {
            entity: Self::entity_name(),
            table: Self::table_name(),
            columns: Self::columns(),
        }
    }
}
