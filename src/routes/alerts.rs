use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    error::ApiResult,
    models::{alert::HealthAlert, auth::AdminUser},
    routes::today,
    services::alerts::AlertService,
    AppState,
};

/// GET /admin/health-alerts, most severe first.
pub async fn list_alerts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<HealthAlert>>> {
    Ok(Json(AlertService::derive(&state.db, today()).await?))
}

/// POST /admin/health-alerts/notify
///
/// Derives the current alerts and writes one notification per alert and admin.
pub async fn notify_alerts(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Json<Value>> {
    let alerts = AlertService::derive(&state.db, today()).await?;
    let published = AlertService::publish(&state.db, &alerts).await?;
    tracing::info!(
        "{} health alerts published by {} ({} notifications)",
        alerts.len(),
        admin.user_id,
        published
    );
    Ok(Json(json!({ "published": published, "alerts": alerts.len() })))
}
