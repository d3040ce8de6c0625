//! Update
//!
//! Saves every column of an entity that already has an ID. A row that does not
//! exist yet is inserted with that ID, so the statement is an upsert:
//!
//! ```sql
//! INSERT INTO accounts (id, email, nickname)
//! VALUES (CAST($1 AS BIGINT), CAST($2 AS TEXT), NULL)
//! ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, nickname = EXCLUDED.nickname
//! RETURNING *
//! ```
//!
//! A null value for a column with a declared default is left out of both the
//! insert and the `SET` list, so a new row gets the default and an existing row
//! keeps what it has.

use serde_json::{Map, Value};
use sqlx::PgConnection;
use tracing::debug;

use crate::database::error::{DbError, Result};
use crate::database::fields::{id_to_i64, inspect_entity};
use crate::database::statement::{Statement, column_values, leaves_default};
use crate::database::traits::{Entity, ID_FIELD, TableSchema};

pub(crate) fn build_upsert(schema: &TableSchema, fields: Map<String, Value>) -> Result<Statement> {
    let pairs = column_values(schema, fields)?
        .into_iter()
        .filter(|(column, value)| column.name == ID_FIELD || !leaves_default(column, value))
        .collect::<Vec<_>>();

    let mut statement = Statement::new("");
    let names = pairs
        .iter()
        .map(|(column, _)| column.name)
        .collect::<Vec<_>>();
    let mut assignments = names
        .iter()
        .filter(|name| **name != ID_FIELD)
        .map(|name| format!("{} = EXCLUDED.{}", name, name))
        .collect::<Vec<_>>();
    // keeps RETURNING populated when only the id is present
    if assignments.is_empty() {
        assignments.push(format!("{} = EXCLUDED.{}", ID_FIELD, ID_FIELD));
    }
    let placeholders = pairs
        .into_iter()
        .map(|(column, value)| statement.placeholder(column, value))
        .collect::<Vec<_>>();

    statement.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {} RETURNING *",
        schema.table,
        names.join(", "),
        placeholders.join(", "),
        ID_FIELD,
        assignments.join(", ")
    );
    Ok(statement)
}

pub(crate) async fn update<T: Entity>(conn: &mut PgConnection, entity: &mut T) -> Result<()> {
    let name = T::entity_name();
    let (fields, id) = inspect_entity(entity)?;
    if id == 0 {
        return Err(DbError::BlankId { entity: name });
    }
    id_to_i64(&name, id)?;

    let statement = build_upsert(&T::schema(), fields)?;
    debug!(
        sql = %statement.sql,
        values = %statement.describe_values(),
        id,
        "updating {}",
        name
    );

    let row = statement.query().fetch_one(&mut *conn).await?;
    *entity = T::from_row(&row)?;
    Ok(())
}
