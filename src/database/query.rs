//! SelectByID, SelectAll and Filter
//!
//! Filters are conjunctions of equality conditions. A filter value is any
//! serializable struct or map; fields holding a zero value (`null`, `0`, `0.0`,
//! `""`, `false`) are not used as conditions, so a partially filled entity can
//! serve as its own filter. [`build_filter`] with explicit pairs keeps zero
//! values and turns nulls into `IS NULL`.
//!
//! ```sql
//! SELECT * FROM accounts WHERE email = CAST($1 AS TEXT) AND nickname IS NULL ORDER BY id
//! ```

use serde::Serialize;
use sqlx::PgConnection;
use tracing::debug;

use crate::database::error::{DbError, Result};
use crate::database::fields::{entity_fields, id_to_i64};
use crate::database::statement::Statement;
use crate::database::traits::{Entity, ID_FIELD, TableSchema};
use crate::database::values::DatabaseValue;

pub(crate) fn build_select_by_id(schema: &TableSchema, id: i64) -> Statement {
    let mut statement = Statement::new(format!(
        "SELECT * FROM {} WHERE {} = $1 LIMIT 1",
        schema.table, ID_FIELD
    ));
    statement.values.push(DatabaseValue::Int(id));
    statement
}

/// Builds a SELECT with one equality condition per pair, joined by AND.
pub(crate) fn build_filter(
    schema: &TableSchema,
    conditions: Vec<(String, DatabaseValue)>,
) -> Result<Statement> {
    let mut statement = Statement::new("");
    let mut clauses = Vec::with_capacity(conditions.len());
    for (field, value) in conditions {
        let column = schema
            .column(&field)
            .ok_or_else(|| DbError::UnknownColumn {
                entity: schema.entity.clone(),
                column: field.clone(),
            })?;
        if value.is_null() {
            clauses.push(format!("{} IS NULL", column.name));
        } else {
            let placeholder = statement.placeholder(column, value);
            clauses.push(format!("{} = {}", column.name, placeholder));
        }
    }

    let mut sql = format!("SELECT * FROM {}", schema.table);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {}", ID_FIELD));
    statement.sql = sql;
    Ok(statement)
}

/// Non-zero fields of `filter`, in field order.
pub(crate) fn filter_conditions<F: Serialize + ?Sized>(
    entity_name: &str,
    filter: &F,
) -> Result<Vec<(String, DatabaseValue)>> {
    let mut conditions = Vec::new();
    for (field, value) in entity_fields(entity_name, filter)? {
        let value = DatabaseValue::from_json(&field, value)?;
        if !value.is_zero() {
            conditions.push((field, value));
        }
    }
    Ok(conditions)
}

pub(crate) async fn select_by_id<T: Entity>(conn: &mut PgConnection, id: u64) -> Result<T> {
    let name = T::entity_name();
    let statement = build_select_by_id(&T::schema(), id_to_i64(&name, id)?);
    debug!(sql = %statement.sql, id, "selecting {}", name);

    match statement.query().fetch_optional(&mut *conn).await? {
        Some(row) => Ok(T::from_row(&row)?),
        None => Err(DbError::NotFound { entity: name, id }),
    }
}

pub(crate) async fn select_all<T: Entity>(conn: &mut PgConnection) -> Result<Vec<T>> {
    filter_by::<T>(conn, Vec::new()).await
}

pub(crate) async fn filter<T: Entity, F: Serialize + ?Sized>(
    conn: &mut PgConnection,
    filter: &F,
) -> Result<Vec<T>> {
    let conditions = filter_conditions(&T::entity_name(), filter)?;
    filter_by::<T>(conn, conditions).await
}

pub(crate) async fn filter_by<T: Entity>(
    conn: &mut PgConnection,
    conditions: Vec<(String, DatabaseValue)>,
) -> Result<Vec<T>> {
    let statement = build_filter(&T::schema(), conditions)?;
    debug!(
        sql = %statement.sql,
        values = %statement.describe_values(),
        "selecting {}",
        T::entity_name()
    );

    let rows = statement.query().fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| T::from_row(row).map_err(DbError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::traits::Column;
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn schema() -> TableSchema {
        TableSchema {
            entity: "Account".to_string(),
            table: "accounts".to_string(),
            columns: vec![
                Column::id(),
                Column::new("email", "TEXT"),
                Column::new("nickname", "TEXT").nullable(),
                Column::new("active", "BOOLEAN"),
                Column::new("balance", "BIGINT"),
            ],
        }
    }

    #[derive(Serialize, Default)]
    struct AccountFilter {
        id: u64,
        email: String,
        nickname: Option<String>,
        active: bool,
        balance: i64,
    }

    #[test]
    fn test_select_by_id() {
        let statement = build_select_by_id(&schema(), 3);
        assert_eq!(statement.sql, "SELECT * FROM accounts WHERE id = $1 LIMIT 1");
        assert_eq!(statement.values, vec![DatabaseValue::Int(3)]);
    }

    #[test]
    fn test_select_all() {
        let statement = build_filter(&schema(), Vec::new()).unwrap();
        assert_eq!(statement.sql, "SELECT * FROM accounts ORDER BY id");
        assert!(statement.values.is_empty());
    }

    #[test]
    fn test_filter_skips_zero_fields() {
        let filter = AccountFilter {
            email: "a@example.com".to_string(),
            balance: 10,
            ..Default::default()
        };
        let conditions = filter_conditions("Account", &filter).unwrap();
        let statement = build_filter(&schema(), conditions).unwrap();

        assert_eq!(
            statement.sql,
            "SELECT * FROM accounts WHERE email = CAST($1 AS TEXT) AND balance = CAST($2 AS BIGINT) ORDER BY id"
        );
        assert_eq!(
            statement.values,
            vec![
                DatabaseValue::Text("a@example.com".to_string()),
                DatabaseValue::Int(10)
            ]
        );
    }

    #[test]
    fn test_empty_filter_selects_everything() {
        let conditions = filter_conditions("Account", &AccountFilter::default()).unwrap();
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_explicit_conditions_keep_zero_values() {
        let conditions = vec![
            ("active".to_string(), DatabaseValue::Boolean(false)),
            ("nickname".to_string(), DatabaseValue::Null),
        ];
        let statement = build_filter(&schema(), conditions).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT * FROM accounts WHERE active = CAST($1 AS BOOLEAN) AND nickname IS NULL ORDER BY id"
        );
    }

    #[test]
    fn test_unknown_filter_column() {
        let mut filter = BTreeMap::new();
        filter.insert("password", "hunter2");
        let conditions = filter_conditions("Account", &filter).unwrap();
        assert!(matches!(
            build_filter(&schema(), conditions),
            Err(DbError::UnknownColumn { column, .. }) if column == "password"
        ));
    }
}
