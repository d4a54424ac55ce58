//! Invoice reports. Only settled invoices count towards revenue.

use indexmap::IndexMap;

use crate::models::{Invoice, PAID_STATUS};
use crate::store::RowQuery;

use crate::analytics::error::AnalyticsError;
use crate::analytics::fetch::RowFetcher;
use crate::analytics::format::{apply_limit, period_label, round_to, sort_desc_by, text_or};
use crate::analytics::types::{DateRange, PaymentMethodTotal, Period, RevenueByPeriod, UNKNOWN};

/// Paid invoices in range, optionally scoped to one organization.
fn paid_invoices_query(range: &DateRange, organization_id: Option<&str>) -> RowQuery {
    let query = RowFetcher::range_query::<Invoice>(range).eq("estado_pago", PAID_STATUS);
    match organization_id {
        Some(org) => query.eq("organization_id", org),
        None => query,
    }
}

pub async fn revenue(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    organization_id: Option<&str>,
    period: Period,
    limit: Option<usize>,
) -> Result<Vec<RevenueByPeriod>, AnalyticsError> {
    let invoices: Vec<Invoice> = fetcher
        .fetch(paid_invoices_query(range, organization_id))
        .await?;
    Ok(apply_limit(aggregate_revenue(&invoices, period), limit))
}

/// Revenue per (period, currency), highest revenue first.
pub fn aggregate_revenue(invoices: &[Invoice], period: Period) -> Vec<RevenueByPeriod> {
    let mut groups: IndexMap<(String, String), (f64, u64)> = IndexMap::new();

    for invoice in invoices {
        let Some(issued) = invoice.fecha_emision.as_ref() else {
            continue;
        };
        let key = (
            period_label(issued, period),
            text_or(invoice.currency.as_deref(), UNKNOWN),
        );
        let (sum, count) = groups.entry(key).or_insert_with(|| (0.0, 0));
        *sum += invoice.total.unwrap_or(0.0);
        *count += 1;
    }

    let mut rows: Vec<RevenueByPeriod> = groups
        .into_iter()
        .map(|((period, currency), (sum, count))| RevenueByPeriod {
            period,
            currency,
            total_revenue: round_to(sum, 2),
            count,
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.total_revenue);
    rows
}

pub async fn payment_methods(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    organization_id: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<PaymentMethodTotal>, AnalyticsError> {
    let invoices: Vec<Invoice> = fetcher
        .fetch(paid_invoices_query(range, organization_id))
        .await?;
    Ok(apply_limit(aggregate_payment_methods(&invoices), limit))
}

/// Count and amount per payment method, most used first.
pub fn aggregate_payment_methods(invoices: &[Invoice]) -> Vec<PaymentMethodTotal> {
    let mut groups: IndexMap<String, (u64, f64)> = IndexMap::new();

    for invoice in invoices {
        let (count, amount) = groups
            .entry(text_or(invoice.metodo_pago.as_deref(), UNKNOWN))
            .or_insert_with(|| (0, 0.0));
        *count += 1;
        *amount += invoice.total.unwrap_or(0.0);
    }

    let mut rows: Vec<PaymentMethodTotal> = groups
        .into_iter()
        .map(|(method, (count, amount))| PaymentMethodTotal {
            method,
            count,
            total_amount: round_to(amount, 2),
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.count);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::reports::test_window;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn invoice_rows() -> Vec<serde_json::Value> {
        vec![
            json!({"id": 1, "fecha_emision": "2024-01-05T10:00:00Z", "total": 100.25,
                   "currency": "MXN", "metodo_pago": "efectivo", "estado_pago": "paid",
                   "organization_id": "org-1"}),
            json!({"id": 2, "fecha_emision": "2024-01-20T10:00:00Z", "total": "250.5",
                   "currency": "MXN", "metodo_pago": "tarjeta", "estado_pago": "paid",
                   "organization_id": "org-1"}),
            json!({"id": 3, "fecha_emision": "2024-02-02T10:00:00Z", "total": 80,
                   "currency": "USD", "metodo_pago": "tarjeta", "estado_pago": "paid",
                   "organization_id": "org-2"}),
            json!({"id": 4, "fecha_emision": "2024-02-03T10:00:00Z", "total": 999,
                   "currency": "MXN", "metodo_pago": "efectivo", "estado_pago": "pending",
                   "organization_id": "org-1"}),
            json!({"id": 5, "fecha_emision": "2024-02-04T10:00:00Z", "total": 20,
                   "currency": null, "metodo_pago": null, "estado_pago": "paid",
                   "organization_id": "org-1"}),
        ]
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_rows("invoices", invoice_rows())
    }

    #[tokio::test]
    async fn revenue_sums_only_paid_invoices() {
        let store = store();
        let fetcher = RowFetcher::new(&store);
        let rows = revenue(
            &fetcher,
            &test_window("2024-01-01", "2024-02-29"),
            None,
            Period::Month,
            None,
        )
        .await
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            RevenueByPeriod {
                period: "2024-01".into(),
                currency: "MXN".into(),
                total_revenue: 350.75,
                count: 2,
            }
        );
        assert_eq!(rows[1].currency, "USD");
        assert_eq!(rows[2].currency, UNKNOWN);

        let total: f64 = rows.iter().map(|r| r.total_revenue).sum();
        assert!((total - (100.25 + 250.5 + 80.0 + 20.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn revenue_scoped_to_organization() {
        let store = store();
        let fetcher = RowFetcher::new(&store);
        let rows = revenue(
            &fetcher,
            &test_window("2024-01-01", "2024-02-29"),
            Some("org-2"),
            Period::Year,
            None,
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period, "2024");
        assert_eq!(rows[0].total_revenue, 80.0);
    }

    #[tokio::test]
    async fn payment_methods_ranked_by_count() {
        let store = store();
        let fetcher = RowFetcher::new(&store);
        let rows = payment_methods(&fetcher, &test_window("2024-01-01", "2024-02-29"), None, None)
            .await
            .unwrap();

        assert_eq!(rows[0].method, "tarjeta");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].total_amount, 330.5);
        assert_eq!(rows[1].method, "efectivo");
        assert_eq!(rows[1].total_amount, 100.25);
        assert_eq!(rows[2].method, UNKNOWN);
    }

    #[test]
    fn daily_buckets() {
        let invoices: Vec<Invoice> = serde_json::from_value(json!(invoice_rows())).unwrap();
        let rows = aggregate_revenue(&invoices[..2], Period::Day);
        assert_eq!(rows[0].period, "2024-01-20");
        assert_eq!(rows[1].period, "2024-01-05");
    }
}
