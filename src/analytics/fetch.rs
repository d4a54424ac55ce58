use crate::models::Entity;
use crate::store::{RowQuery, RowStore};

use super::error::AnalyticsError;
use super::types::DateRange;

/// Typed reads over a [`RowStore`].
///
/// Every read is a single logical fetch: an empty match is an empty `Vec`,
/// a store failure is [`AnalyticsError::Upstream`], and a row that does not
/// fit its record type is [`AnalyticsError::MalformedRow`].
pub struct RowFetcher<'a> {
    store: &'a dyn RowStore,
}

impl<'a> RowFetcher<'a> {
    pub fn new(store: &'a dyn RowStore) -> Self {
        Self { store }
    }

    /// Range-scoped query on `T`'s anchor, ordered by anchor then id so
    /// repeated calls see rows in the same order.
    pub fn range_query<T: Entity>(range: &DateRange) -> RowQuery {
        match T::ANCHOR {
            Some(anchor) => RowQuery::table(T::TABLE)
                .within(anchor, range.start, range.end)
                .order_by(anchor, false)
                .order_by("id", false),
            None => RowQuery::table(T::TABLE).order_by("id", false),
        }
    }

    pub async fn fetch<T: Entity>(&self, query: RowQuery) -> Result<Vec<T>, AnalyticsError> {
        let rows = self.store.select(&query).await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| AnalyticsError::MalformedRow {
                    table: T::TABLE,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    pub async fn in_range<T: Entity>(&self, range: &DateRange) -> Result<Vec<T>, AnalyticsError> {
        self.fetch(Self::range_query::<T>(range)).await
    }

    /// Rows whose `column` is one of `keys`. No round trip for an empty key set.
    pub async fn by_keys<T: Entity>(
        &self,
        column: &str,
        keys: &[String],
    ) -> Result<Vec<T>, AnalyticsError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = RowQuery::table(T::TABLE)
            .is_in(column, keys.iter().cloned())
            .order_by("id", false);
        self.fetch(query).await
    }

    pub async fn count(&self, query: RowQuery) -> Result<u64, AnalyticsError> {
        Ok(self.store.count(&query).await?)
    }
}
