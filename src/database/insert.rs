//! Create
//!
//! Inserts a new entity. The entity must have a blank ID; the generated ID and
//! any database defaults are written back into it from `RETURNING *`.
//!
//! ```sql
//! INSERT INTO accounts (email, nickname)
//! VALUES (CAST($1 AS TEXT), NULL)
//! RETURNING *
//! ```

use serde_json::{Map, Value};
use sqlx::PgConnection;
use tracing::debug;

use crate::database::error::{DbError, Result};
use crate::database::fields::inspect_entity;
use crate::database::statement::{Statement, column_values, leaves_default};
use crate::database::traits::{Entity, ID_FIELD, TableSchema};

/// Builds the INSERT for a new row.
///
/// The `id` column is always left to the database. A null value for a column
/// with a declared default is left out so the default applies.
pub(crate) fn build_insert(schema: &TableSchema, fields: Map<String, Value>) -> Result<Statement> {
    let pairs = column_values(schema, fields)?
        .into_iter()
        .filter(|(column, value)| column.name != ID_FIELD && !leaves_default(column, value))
        .collect::<Vec<_>>();

    if pairs.is_empty() {
        return Ok(Statement::new(format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING *",
            schema.table
        )));
    }

    let mut statement = Statement::new("");
    let names = pairs
        .iter()
        .map(|(column, _)| column.name)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = pairs
        .into_iter()
        .map(|(column, value)| statement.placeholder(column, value))
        .collect::<Vec<_>>()
        .join(", ");

    statement.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        schema.table, names, placeholders
    );
    Ok(statement)
}

pub(crate) async fn create<T: Entity>(conn: &mut PgConnection, entity: &mut T) -> Result<()> {
    let name = T::entity_name();
    let (fields, id) = inspect_entity(entity)?;
    if id != 0 {
        return Err(DbError::IdAlreadySet { entity: name });
    }

    let statement = build_insert(&T::schema(), fields)?;
    debug!(
        sql = %statement.sql,
        values = %statement.describe_values(),
        "creating {}",
        name
    );

    let row = statement.query().fetch_one(&mut *conn).await?;
    *entity = T::from_row(&row)?;
    Ok(())
}
