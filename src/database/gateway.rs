//! Typed repository over a named table, exposing the five verbs the resource
//! routers need: select-many, select-one, insert, update, delete. Rows and
//! patches travel as JSON maps so the routers can stay declarative; values
//! are always bound as parameters.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::filter::{is_valid_identifier, FilterError, FilterMap, SelectOptions};
use crate::database::manager::DatabaseError;

pub struct Repository<T> {
    table_name: String,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        if !is_valid_identifier(&name) {
            return Err(DatabaseError::QueryError(format!(
                "invalid table name: {}",
                name
            )));
        }
        Ok(Self {
            table_name: name,
            pool,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Matching rows in the requested order; empty vec when none match.
    pub async fn select_many(
        &self,
        filters: FilterMap,
        options: SelectOptions,
    ) -> Result<Vec<T>, DatabaseError> {
        let (sql, params) = select_sql(&self.table_name, &filters, &options)?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    pub async fn select_optional(&self, filters: FilterMap) -> Result<Option<T>, DatabaseError> {
        let (sql, params) = select_sql(&self.table_name, &filters, &SelectOptions::default())?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        Ok(q.fetch_optional(&self.pool).await?)
    }

    /// Exactly one matching row, or a NotFound-class error.
    pub async fn select_one(&self, filters: FilterMap) -> Result<T, DatabaseError> {
        self.select_optional(filters)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))
    }

    /// Insert a row and return it with its generated fields. Constraint
    /// violations surface as `DatabaseError::Constraint`.
    pub async fn insert(&self, row: Map<String, Value>) -> Result<T, DatabaseError> {
        let (sql, params) = insert_sql(&self.table_name, &row)?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        q.fetch_one(&self.pool).await.map_err(map_constraint_error)
    }

    /// Apply a patch to the row matching `filters` and return the updated
    /// row; NotFound when the filters match nothing. Also bumps the table's
    /// `updated_at` column (every mutable table carries one).
    pub async fn update(
        &self,
        filters: FilterMap,
        patch: Map<String, Value>,
    ) -> Result<T, DatabaseError> {
        let (sql, params) = update_sql(&self.table_name, &filters, &patch)?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        q.fetch_optional(&self.pool)
            .await
            .map_err(map_constraint_error)?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))
    }

    /// Delete matching rows. Idempotent: deleting nothing is still success.
    pub async fn delete(&self, filters: FilterMap) -> Result<(), DatabaseError> {
        let (sql, params) = delete_sql(&self.table_name, &filters)?;
        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_plain(q, p);
        }
        q.execute(&self.pool).await?;
        Ok(())
    }
}

fn select_sql(
    table: &str,
    filters: &FilterMap,
    options: &SelectOptions,
) -> Result<(String, Vec<Value>), DatabaseError> {
    let (where_sql, params) = filters.to_where_sql(1)?;
    let mut sql = format!("SELECT * FROM \"{}\"{}", table, where_sql);

    if let Some((column, direction)) = &options.order_by {
        if !is_valid_identifier(column) {
            return Err(DatabaseError::QueryError(format!(
                "invalid order column: {}",
                column
            )));
        }
        sql.push_str(&format!(" ORDER BY \"{}\" {}", column, direction.as_sql()));
    }
    if let Some(limit) = options.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok((sql, params))
}

fn insert_sql(table: &str, row: &Map<String, Value>) -> Result<(String, Vec<Value>), DatabaseError> {
    if row.is_empty() {
        return Err(DatabaseError::QueryError("empty insert row".to_string()));
    }

    let mut columns = Vec::with_capacity(row.len());
    let mut placeholders = Vec::with_capacity(row.len());
    let mut params = Vec::with_capacity(row.len());

    for (i, (column, value)) in row.iter().enumerate() {
        if !is_valid_identifier(column) {
            return Err(DatabaseError::QueryError(format!(
                "invalid column name: {}",
                column
            )));
        }
        columns.push(format!("\"{}\"", column));
        placeholders.push(format!("${}", i + 1));
        params.push(value.clone());
    }

    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok((sql, params))
}

fn update_sql(
    table: &str,
    filters: &FilterMap,
    patch: &Map<String, Value>,
) -> Result<(String, Vec<Value>), DatabaseError> {
    if patch.is_empty() {
        return Err(DatabaseError::QueryError("empty update patch".to_string()));
    }

    let mut assignments = Vec::with_capacity(patch.len() + 1);
    let mut params = Vec::with_capacity(patch.len());

    for (i, (column, value)) in patch.iter().enumerate() {
        if !is_valid_identifier(column) {
            return Err(DatabaseError::QueryError(format!(
                "invalid column name: {}",
                column
            )));
        }
        assignments.push(format!("\"{}\" = ${}", column, i + 1));
        params.push(value.clone());
    }
    assignments.push("\"updated_at\" = now()".to_string());

    let (where_sql, where_params) = filters.to_where_sql(patch.len() + 1)?;
    params.extend(where_params);

    let sql = format!(
        "UPDATE \"{}\" SET {}{} RETURNING *",
        table,
        assignments.join(", "),
        where_sql
    );
    Ok((sql, params))
}

fn delete_sql(table: &str, filters: &FilterMap) -> Result<(String, Vec<Value>), DatabaseError> {
    let (where_sql, params) = filters.to_where_sql(1)?;
    Ok((format!("DELETE FROM \"{}\"{}", table, where_sql), params))
}

fn map_constraint_error(err: sqlx::Error) -> DatabaseError {
    match err {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
            {
                DatabaseError::Constraint(db.message().to_string())
            } else {
                DatabaseError::Sqlx(sqlx::Error::Database(db))
            }
        }
        other => DatabaseError::Sqlx(other),
    }
}

impl From<FilterError> for DatabaseError {
    fn from(err: FilterError) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

// JSON values drive the bind types. Identifier columns are uuid-typed in the
// schema, so uuid-shaped strings bind as uuids; string arrays bind as text[]
// for the tag columns.
fn bind_value<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => q.bind(id),
            Err(_) => q.bind(s.clone()),
        },
        Value::Array(arr) => {
            let strings: Vec<String> = arr
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            q.bind(strings)
        }
        Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

fn bind_plain<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => q.bind(id),
            Err(_) => q.bind(s.clone()),
        },
        Value::Array(arr) => {
            let strings: Vec<String> = arr
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            q.bind(strings)
        }
        Value::Object(_) => q.bind(v.clone()),
    }
}
