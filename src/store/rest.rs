use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::header::{HeaderMap, CONTENT_RANGE};
use serde_json::Value;

use super::{Filter, RowQuery, RowStore, StoreError};
use crate::config::AnalyticsConfig;

/// Membership lists longer than this are split across requests to keep URLs
/// under proxy limits. Still one logical fetch for the caller.
const IN_CHUNK: usize = 150;

/// HTTP client for a PostgREST-style row store (`{base}/rest/v1/{table}`).
pub struct RestStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    page_size: usize,
    timeout_secs: u64,
}

impl RestStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        page_size: usize,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            page_size: page_size.max(1),
            timeout_secs,
        })
    }

    pub fn from_config(config: &AnalyticsConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.store_url,
            &config.store_key,
            config.page_size,
            config.timeout_secs,
        )
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn classify(&self, err: reqwest::Error) -> StoreError {
        if err.is_connect() {
            StoreError::Connection(self.base_url.clone())
        } else if err.is_timeout() {
            StoreError::Timeout(self.timeout_secs)
        } else {
            StoreError::HttpClient(err.to_string())
        }
    }

    async fn get(
        &self,
        query: &RowQuery,
        extra: &[(String, String)],
    ) -> Result<Vec<Value>, StoreError> {
        let mut pairs = query_pairs(query);
        pairs.extend_from_slice(extra);

        let response = self
            .client
            .get(self.table_url(&query.table))
            .query(&pairs)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Pages through the result with `offset`/`limit` until an empty page.
    ///
    /// Servers may cap a page below the requested size (`max-rows`), so a
    /// short page does not mean the result is exhausted.
    async fn select_paged(&self, query: &RowQuery) -> Result<Vec<Value>, StoreError> {
        let mut rows = Vec::new();
        loop {
            let wanted = match query.limit {
                Some(limit) => limit.saturating_sub(rows.len()).min(self.page_size),
                None => self.page_size,
            };
            if wanted == 0 {
                break;
            }

            let page = self
                .get(
                    query,
                    &[
                        ("limit".to_string(), wanted.to_string()),
                        ("offset".to_string(), rows.len().to_string()),
                    ],
                )
                .await?;

            tracing::debug!(
                table = %query.table,
                offset = rows.len(),
                rows = page.len(),
                "Fetched page"
            );

            if page.is_empty() {
                break;
            }
            rows.extend(page);
        }
        Ok(rows)
    }
}

#[async_trait]
impl RowStore for RestStore {
    async fn select(&self, query: &RowQuery) -> Result<Vec<Value>, StoreError> {
        let chunks = split_membership(query);
        if chunks.len() == 1 {
            return self.select_paged(query).await;
        }

        let mut rows = Vec::new();
        for chunk in &chunks {
            rows.extend(self.select_paged(chunk).await?);
        }
        Ok(rows)
    }

    async fn count(&self, query: &RowQuery) -> Result<u64, StoreError> {
        let mut pairs = query_pairs(query);
        pairs.retain(|(key, _)| key != "order");

        let response = self
            .client
            .head(self.table_url(&query.table))
            .query(&pairs)
            .header("apikey", &self.api_key)
            .header("Prefer", "count=exact")
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        total_from_headers(response.headers())
    }
}

/// Renders a query in PostgREST syntax. Paging parameters are added by the caller.
fn query_pairs(query: &RowQuery) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];

    for filter in &query.filters {
        let rendered = match filter {
            Filter::Eq { value, .. } => format!("eq.{value}"),
            Filter::In { values, .. } => format!(
                "in.({})",
                values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",")
            ),
            Filter::NotNull { .. } => "not.is.null".to_string(),
        };
        pairs.push((filter.column().to_string(), rendered));
    }

    if let Some(range) = &query.range {
        let start = range.start.to_rfc3339_opts(SecondsFormat::Millis, true);
        let end = range.end.to_rfc3339_opts(SecondsFormat::Millis, true);
        pairs.push((range.field.clone(), format!("gte.{start}")));
        pairs.push((range.field.clone(), format!("lte.{end}")));
    }

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.descending { "desc" } else { "asc" }))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }

    pairs
}

/// Values with PostgREST reserved characters are double-quoted.
fn quote(value: &str) -> String {
    if value.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ':' | ' ')) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Splits the first oversized `IN` filter into several queries.
/// Order and limit are not meaningful across chunks, so chunked lookups
/// are only used for key resolution.
fn split_membership(query: &RowQuery) -> Vec<RowQuery> {
    let oversized = query
        .filters
        .iter()
        .position(|f| matches!(f, Filter::In { values, .. } if values.len() > IN_CHUNK));

    let Some(index) = oversized else {
        return vec![query.clone()];
    };
    let Filter::In { column, values } = &query.filters[index] else {
        return vec![query.clone()];
    };

    values
        .chunks(IN_CHUNK)
        .map(|chunk| {
            let mut part = query.clone();
            part.filters[index] = Filter::In {
                column: column.clone(),
                values: chunk.to_vec(),
            };
            part
        })
        .collect()
}

/// Reads the total from `Content-Range: 0-24/3573` or `*/0`.
fn total_from_headers(headers: &HeaderMap) -> Result<u64, StoreError> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
        .ok_or_else(|| StoreError::InvalidResponse("Content-Range count".into()))
}

fn parse_content_range(raw: &str) -> Option<u64> {
    raw.rsplit('/').next()?.trim().parse().ok()
}
