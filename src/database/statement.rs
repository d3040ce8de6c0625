//! SQL statements with their bound values.

use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::database::error::{DbError, Result};
use crate::database::traits::{Column, TableSchema};
use crate::database::values::DatabaseValue;
use crate::utils::strings::is_plain_identifier;

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<DatabaseValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    /// Records `value` for `column` and returns the SQL to put in its place.
    ///
    /// Nulls become a literal `NULL`; everything else is bound and cast to the
    /// column type.
    pub(crate) fn placeholder(&mut self, column: &Column, value: DatabaseValue) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.values.push(value);
        format!("CAST(${} AS {})", self.values.len(), column.cast_type())
    }

    pub(crate) fn query(&self) -> Query<'_, Postgres, PgArguments> {
        let mut query = sqlx::query(&self.sql);
        for value in self.values.iter() {
            query = query.bind(value.clone());
        }
        query
    }

    /// The bound values as `$1 = .., $2 = ..`, for logs.
    pub(crate) fn describe_values(&self) -> String {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| format!("${} = {}", i + 1, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A null value for a column with a declared default is left to the database.
pub(crate) fn leaves_default(column: &Column, value: &DatabaseValue) -> bool {
    value.is_null() && column.default.is_some()
}

/// Pairs each serialized field with its column, in column order.
///
/// Fields that are not columns are ignored; columns missing from the
/// serialized value are left out.
pub(crate) fn column_values<'s>(
    schema: &'s TableSchema,
    mut fields: Map<String, Value>,
) -> Result<Vec<(&'s Column, DatabaseValue)>> {
    let mut pairs = Vec::new();
    for column in schema.columns.iter() {
        if let Some(value) = fields.remove(column.name) {
            pairs.push((column, DatabaseValue::from_json(column.name, value)?));
        }
    }
    Ok(pairs)
}

/// Rejects schemas whose names cannot be used unquoted in SQL.
pub(crate) fn check_identifiers(schema: &TableSchema) -> Result<()> {
    if !is_plain_identifier(&schema.table) {
        return Err(DbError::InvalidIdentifier(schema.table.clone()));
    }
    for column in schema.columns.iter() {
        if !is_plain_identifier(column.name) {
            return Err(DbError::InvalidIdentifier(column.name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> TableSchema {
        TableSchema {
            entity: "Note".to_string(),
            table: "notes".to_string(),
            columns: vec![
                Column::id(),
                Column::new("body", "TEXT"),
                Column::new("pinned", "BOOLEAN"),
            ],
        }
    }

    #[test]
    fn test_placeholder_numbers_and_casts() {
        let mut statement = Statement::new("");
        let columns = schema().columns;
        assert_eq!(
            statement.placeholder(&columns[0], DatabaseValue::Int(1)),
            "CAST($1 AS BIGINT)"
        );
        assert_eq!(statement.placeholder(&columns[1], DatabaseValue::Null), "NULL");
        assert_eq!(
            statement.placeholder(&columns[2], DatabaseValue::Boolean(true)),
            "CAST($2 AS BOOLEAN)"
        );
        assert_eq!(statement.values.len(), 2);
        assert_eq!(statement.describe_values(), "$1 = 1, $2 = true");
    }

    #[test]
    fn test_describe_values_quotes_text() {
        let mut statement = Statement::new("");
        let columns = schema().columns;
        statement.placeholder(&columns[1], DatabaseValue::Text("hi".to_string()));
        statement.placeholder(&columns[0], DatabaseValue::Int(-3));
        assert_eq!(statement.describe_values(), "$1 = \"hi\", $2 = -3");
    }

    #[test]
    fn test_leaves_default() {
        let column = Column::new("created_at", "TIMESTAMPTZ").default_value("now()");
        assert!(leaves_default(&column, &DatabaseValue::Null));
        assert!(!leaves_default(&column, &DatabaseValue::Text("x".to_string())));
        assert!(!leaves_default(&Column::new("body", "TEXT"), &DatabaseValue::Null));
    }

    #[test]
    fn test_column_values_follow_schema_order() {
        let schema = schema();
        let fields = match json!({"pinned": false, "extra": 1, "body": "hi"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let pairs = column_values(&schema, fields).unwrap();
        let names: Vec<&str> = pairs.iter().map(|(column, _)| column.name).collect();
        assert_eq!(names, vec!["body", "pinned"]);
    }

    #[test]
    fn test_check_identifiers() {
        let mut bad = schema();
        assert!(check_identifiers(&bad).is_ok());
        bad.table = "notes; --".to_string();
        assert!(matches!(
            check_identifiers(&bad),
            Err(DbError::InvalidIdentifier(name)) if name == "notes; --"
        ));
    }
}
