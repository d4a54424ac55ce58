use chrono::{DateTime, Utc};

/// A predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: String },
    In { column: String, values: Vec<String> },
    NotNull { column: String },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } | Filter::NotNull { column } => {
                column
            }
        }
    }
}

/// Inclusive `[start, end]` window on one timestamp column.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub field: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// A single-table read: conjunction of filters, at most one range.
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub range: Option<TimeRange>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl RowQuery {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            range: None,
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values: values.into_iter().collect(),
        });
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::NotNull {
            column: column.to_string(),
        });
        self
    }

    /// Replaces any previous range: the store filters on one range only.
    pub fn within(mut self, field: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.range = Some(TimeRange {
            field: field.to_string(),
            start,
            end,
        });
        self
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
