use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{Filter, Order, RowQuery, RowStore, StoreError};
use crate::models::lenient::{parse_timestamp, scalar_text};

/// In-process `RowStore` over JSON rows.
///
/// Evaluates the same predicate set as the REST store, so the analytics
/// engine behaves identically against either. Tables are fixed at
/// construction; a table can be marked as failing to exercise error paths.
/// Every `select` is recorded so callers can see how many round trips a
/// report took.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Value>>,
    failures: HashMap<String, String>,
    selects: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rows to `table`.
    pub fn with_rows(mut self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }

    /// Every query against `table` fails with an upstream error.
    pub fn with_failure(mut self, table: &str, message: &str) -> Self {
        self.failures.insert(table.to_string(), message.to_string());
        self
    }

    /// Tables hit by `select`, in call order. Shared between clones.
    pub fn selected_tables(&self) -> Vec<String> {
        self.selects
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn check_failure(&self, table: &str) -> Result<(), StoreError> {
        match self.failures.get(table) {
            Some(message) => Err(StoreError::Upstream {
                status: 500,
                body: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn matching<'a>(&'a self, query: &'a RowQuery) -> impl Iterator<Item = &'a Value> + 'a {
        self.tables
            .get(&query.table)
            .into_iter()
            .flatten()
            .filter(move |row| row_matches(row, query))
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select(&self, query: &RowQuery) -> Result<Vec<Value>, StoreError> {
        if let Ok(mut log) = self.selects.lock() {
            log.push(query.table.clone());
        }
        self.check_failure(&query.table)?;

        let mut rows: Vec<Value> = self.matching(query).cloned().collect();
        if !query.order.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, &query.order));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn count(&self, query: &RowQuery) -> Result<u64, StoreError> {
        self.check_failure(&query.table)?;
        Ok(self.matching(query).count() as u64)
    }
}

fn row_matches(row: &Value, query: &RowQuery) -> bool {
    let filters_hold = query.filters.iter().all(|filter| match filter {
        Filter::Eq { column, value } => {
            column_text(row, column).is_some_and(|text| &text == value)
        }
        Filter::In { column, values } => {
            column_text(row, column).is_some_and(|text| values.contains(&text))
        }
        Filter::NotNull { column } => !row.get(column).unwrap_or(&Value::Null).is_null(),
    });

    let in_range = match &query.range {
        // Null or unparseable anchors never fall inside a range.
        Some(range) => row
            .get(&range.field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .is_some_and(|instant| range.contains(&instant)),
        None => true,
    };

    filters_hold && in_range
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    row.get(column).and_then(scalar_text)
}

fn compare_rows(a: &Value, b: &Value, order: &[Order]) -> Ordering {
    for key in order {
        let ordering = compare_values(
            a.get(&key.column).unwrap_or(&Value::Null),
            b.get(&key.column).unwrap_or(&Value::Null),
        );
        let ordering = if key.descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Nulls sort last ascending, like Postgres.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        _ => scalar_text(a).cmp(&scalar_text(b)),
    }
}
