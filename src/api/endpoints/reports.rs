//! `GET /api/reports`: the single read endpoint of the analytics engine.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::analytics::{ReportContext, ReportEnvelope, ReportRequest};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Runs the requested report and wraps it as `{ "data": ... }`.
///
/// Query parameters: `reportType`, `start`, `end`, `limit`,
/// `organizationId`, `period`, `actionType`, `module`.
pub async fn generate(
    State(ctx): State<ApiContext>,
    query: Result<Query<ReportRequest>, QueryRejection>,
) -> Result<Json<ReportEnvelope>, ApiError> {
    let Query(request) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let data = ctx
        .dispatcher
        .dispatch(&request, &ReportContext::current())
        .await?;

    Ok(Json(ReportEnvelope { data }))
}
