//! Database Errors
//!
//! Every fallible operation in this crate returns [`DbError`]. Messages carry the
//! `extendeddb:` prefix so they can be spotted in mixed application logs.

use thiserror::Error;

/// Errors produced while configuring, connecting to, or querying the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// One or more required environment variables were missing or unusable.
    #[error(
        "extendeddb: unable to get all information to connect to {connection:?}, check: {}",
        .variables.join(", ")
    )]
    MissingConfiguration {
        connection: String,
        variables: Vec<String>,
    },

    #[error("extendeddb: unsupported database type {0:?}")]
    UnsupportedDatabaseType(String),

    /// The value does not serialize to a struct or map, so it has no fields.
    #[error("extendeddb: the \"{entity}\" value has no named fields")]
    NotAStruct { entity: String },

    #[error("extendeddb: the \"{entity}\" entity has no ID field")]
    MissingIdField { entity: String },

    #[error("extendeddb: the \"{entity}\" entity ID field is not of type uint")]
    InvalidIdType { entity: String },

    #[error("extendeddb: the ID {id} of the \"{entity}\" entity does not fit in a BIGINT column")]
    IdOutOfRange { entity: String, id: u64 },

    #[error(
        "extendeddb: it is not possible to insert a model \"{entity}\" with the pre-filled ID field"
    )]
    IdAlreadySet { entity: String },

    #[error("extendeddb: it is not possible to update a model \"{entity}\" with the blank ID field")]
    BlankId { entity: String },

    #[error("extendeddb: \"{column}\" is not a column of the \"{entity}\" entity")]
    UnknownColumn { entity: String, column: String },

    #[error("extendeddb: invalid identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("extendeddb: value of column \"{column}\" cannot be stored: {reason}")]
    UnsupportedValue { column: String, reason: String },

    #[error("extendeddb: record not found: \"{entity}\" with ID {id}")]
    NotFound { entity: String, id: u64 },

    #[error("extendeddb: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("extendeddb: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;
