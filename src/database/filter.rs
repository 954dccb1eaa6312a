//! Equality-filter maps rendered to parameterized SQL.
//!
//! Every condition is ANDed; values are always bound, never interpolated.
//! Column and table names are validated before they reach a query string.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("empty IN list for column: {0}")]
    EmptyInList(String),
}

#[derive(Debug, Clone)]
pub enum FilterValue {
    Eq(Value),
    In(Vec<Value>),
}

/// Ordered column -> value map; all conditions are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct FilterMap {
    conditions: Vec<(String, FilterValue)>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.conditions.push((column.into(), FilterValue::Eq(value)));
        self
    }

    pub fn is_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push((column.into(), FilterValue::In(values)));
        self
    }

    /// Render a " WHERE ..." clause with `$N` placeholders starting at
    /// `start_index`, returning the clause and the bind values in order.
    /// An empty map renders an empty clause.
    pub fn to_where_sql(&self, start_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        if self.conditions.is_empty() {
            return Ok((String::new(), vec![]));
        }

        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut params = Vec::new();
        let mut next = start_index;

        for (column, value) in &self.conditions {
            if !is_valid_identifier(column) {
                return Err(FilterError::InvalidIdentifier(column.clone()));
            }
            match value {
                FilterValue::Eq(Value::Null) => {
                    clauses.push(format!("\"{}\" IS NULL", column));
                }
                FilterValue::Eq(v) => {
                    clauses.push(format!("\"{}\" = ${}", column, next));
                    params.push(v.clone());
                    next += 1;
                }
                FilterValue::In(values) => {
                    // `IN ()` is a syntax error; callers short-circuit instead
                    if values.is_empty() {
                        return Err(FilterError::EmptyInList(column.clone()));
                    }
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| {
                            let p = format!("${}", next);
                            params.push(v.clone());
                            next += 1;
                            p
                        })
                        .collect();
                    clauses.push(format!("\"{}\" IN ({})", column, placeholders.join(", ")));
                }
            }
        }

        Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<i64>,
}

impl SelectOptions {
    pub fn order_desc(column: impl Into<String>) -> Self {
        Self {
            order_by: Some((column.into(), SortDirection::Desc)),
            limit: None,
        }
    }
}

/// Validate table/column identifiers to prevent injection: lowercase
/// snake_case, starting with a letter or underscore.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
