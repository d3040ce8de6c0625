//! RegisterEntities
//!
//! Brings the tables of registered entities in line with their declared
//! columns: missing tables are created and missing columns are added. Existing
//! columns are never altered or dropped.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS accounts (id BIGSERIAL PRIMARY KEY, email TEXT NOT NULL)
//! ALTER TABLE accounts ADD COLUMN IF NOT EXISTS email TEXT NOT NULL
//! ```

use sqlx::PgConnection;
use tracing::{debug, info};

use crate::database::error::{DbError, Result};
use crate::database::statement::check_identifiers;
use crate::database::traits::{ID_FIELD, TableSchema};

/// Statements synchronising one table, after validating the schema.
pub(crate) fn build_migration(schema: &TableSchema) -> Result<Vec<String>> {
    check_identifiers(schema)?;
    if schema.column(ID_FIELD).is_none() {
        return Err(DbError::MissingIdField {
            entity: schema.entity.clone(),
        });
    }

    let definitions = schema
        .columns
        .iter()
        .map(|column| column.definition())
        .collect::<Vec<_>>();

    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.table,
        definitions.join(", ")
    )];
    for column in schema.columns.iter().filter(|column| !column.primary_key) {
        statements.push(format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
            schema.table,
            column.definition()
        ));
    }
    Ok(statements)
}

pub(crate) async fn register_entities(
    conn: &mut PgConnection,
    schemas: &[TableSchema],
) -> Result<()> {
    // validate everything before touching the database
    let migrations = schemas
        .iter()
        .map(|schema| build_migration(schema).map(|statements| (schema, statements)))
        .collect::<Result<Vec<_>>>()?;

    for (schema, statements) in migrations {
        for sql in statements {
            debug!(sql = %sql, "migrating {}", schema.entity);
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        info!("registered entity {} as table {}", schema.entity, schema.table);
    }
    Ok(())
}

/// Registers entity types with an [`ExtendedDb`](crate::ExtendedDb).
///
/// ```ignore
/// register_entities!(db, Account, Order).await?;
/// ```
#[macro_export]
macro_rules! register_entities {
    ($db:expr, $($entity:ty),+ $(,)?) => {{
        use $crate::database::traits::Entity;

        $db.register_entities(vec![$(<$entity as Entity>::schema()),+])
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::traits::Column;

    fn schema() -> TableSchema {
        TableSchema {
            entity: "Account".to_string(),
            table: "accounts".to_string(),
            columns: vec![
                Column::id(),
                Column::new("email", "TEXT"),
                Column::new("nickname", "TEXT").nullable(),
            ],
        }
    }

    #[test]
    fn test_build_migration() {
        let statements = build_migration(&schema()).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE IF NOT EXISTS accounts (id BIGSERIAL PRIMARY KEY, email TEXT NOT NULL, nickname TEXT)",
                "ALTER TABLE accounts ADD COLUMN IF NOT EXISTS email TEXT NOT NULL",
                "ALTER TABLE accounts ADD COLUMN IF NOT EXISTS nickname TEXT",
            ]
        );
    }

    #[test]
    fn test_requires_id_column() {
        let mut schema = schema();
        schema.columns.remove(0);
        assert!(matches!(
            build_migration(&schema),
            Err(DbError::MissingIdField { entity }) if entity == "Account"
        ));
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let mut schema = schema();
        schema.columns.push(Column::new("bad name", "TEXT"));
        assert!(matches!(
            build_migration(&schema),
            Err(DbError::InvalidIdentifier(name)) if name == "bad name"
        ));
    }
}
