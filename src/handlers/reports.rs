// src/handlers/reports.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::access::{PermViewReports, RequirePermission},
    models::report::{ReportFormat, ReportKind, ReportQuery},
    services::report_service::{file_name, to_csv, to_html},
};

fn attachment(content_type: &'static str, name: String, body: String) -> Response {
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        ),
    ];
    (headers, body).into_response()
}

#[utoipa::path(
    get,
    path = "/api/reports/{report_type}",
    tag = "Reports",
    params(
        ("report_type" = String, Path, description = "sales | inventory | activity"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "JSON (padrão), CSV ou HTML para impressão"),
        (status = 400, description = "Tipo de relatório ou data inválida"),
        (status = 404, description = "Subsidiária do filtro não encontrada")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermViewReports>,
    Path(report_type): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let kind: ReportKind = report_type
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid report type".into()))?;

    let now = Utc::now();
    let dataset = app_state.report_service.build(kind, &query, now).await?;

    let response = match ReportFormat::parse_lenient(query.format.as_deref()) {
        ReportFormat::Json => Json(dataset).into_response(),
        ReportFormat::Csv => attachment(
            "text/csv; charset=utf-8",
            file_name(&dataset, "csv"),
            to_csv(&dataset),
        ),
        ReportFormat::Pdf => attachment(
            "text/html; charset=utf-8",
            file_name(&dataset, "html"),
            to_html(&dataset, now),
        ),
    };

    Ok(response)
}
