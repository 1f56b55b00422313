use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    models::{
        auth::AnalystUser,
        report::{ReportQuery, ReportType},
    },
    routes::today,
    services::reports::ReportService,
    AppState,
};

/// GET /reports/{type}?format=text|csv
///
/// Served as an attachment so browsers download it.
pub async fn export_report(
    State(state): State<AppState>,
    _analyst: AnalystUser,
    Path(report_type): Path<String>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    let report_type: ReportType = report_type
        .parse()
        .map_err(|_| ApiError::validation(format!("Type de rapport inconnu : {report_type}")))?;

    let report = ReportService::export(&state.db, report_type, query.format, today()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, report.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.body,
    ))
}
