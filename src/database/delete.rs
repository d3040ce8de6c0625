//! DeleteByID

use sqlx::PgConnection;
use tracing::debug;

use crate::database::error::Result;
use crate::database::fields::id_to_i64;
use crate::database::statement::Statement;
use crate::database::traits::{Entity, ID_FIELD, TableSchema};
use crate::database::values::DatabaseValue;

pub(crate) fn build_delete(schema: &TableSchema, id: i64) -> Statement {
    let mut statement = Statement::new(format!(
        "DELETE FROM {} WHERE {} = $1",
        schema.table, ID_FIELD
    ));
    statement.values.push(DatabaseValue::Int(id));
    statement
}

/// Deletes the row with `id` and returns how many rows were removed.
pub(crate) async fn delete_by_id<T: Entity>(conn: &mut PgConnection, id: u64) -> Result<u64> {
    let name = T::entity_name();
    let statement = build_delete(&T::schema(), id_to_i64(&name, id)?);
    debug!(sql = %statement.sql, id, "deleting {}", name);

    let result = statement.query().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
