use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        auth::OrphanageOperator,
        health::{HealthRecordPayload, HealthRecordWithDiseases},
    },
    routes::{message, today},
    services::health::HealthService,
    AppState,
};

/// GET /children/{id}/health-records, most recent first.
pub async fn list_health_records(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(child_id): Path<Uuid>,
) -> ApiResult<Json<Vec<HealthRecordWithDiseases>>> {
    Ok(Json(
        HealthService::list(&state.db, operator.orphanage_id, child_id).await?,
    ))
}

pub async fn create_health_record(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(child_id): Path<Uuid>,
    Json(body): Json<HealthRecordPayload>,
) -> ApiResult<(StatusCode, Json<HealthRecordWithDiseases>)> {
    body.validate(today()).map_err(ApiError::Validation)?;
    let record = HealthService::create(&state.db, operator.orphanage_id, child_id, &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /update-health-record/{id}
///
/// Replaces the record and its diagnoses. The record's facility must be the
/// caller's, otherwise 403.
pub async fn update_health_record(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(record_id): Path<Uuid>,
    Json(body): Json<HealthRecordPayload>,
) -> ApiResult<Json<HealthRecordWithDiseases>> {
    body.validate(today()).map_err(ApiError::Validation)?;

    let owner = HealthService::owner(&state.db, record_id).await?;
    if owner != operator.orphanage_id {
        tracing::warn!(
            "User {} tried to edit health record {} of another facility",
            operator.user_id,
            record_id
        );
        return Err(ApiError::Forbidden("Ce dossier n'appartient pas à votre centre"));
    }

    Ok(Json(HealthService::replace(&state.db, record_id, &body).await?))
}

pub async fn delete_health_record(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(record_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    HealthService::delete(&state.db, operator.orphanage_id, record_id).await?;
    Ok(message("Dossier médical supprimé"))
}
