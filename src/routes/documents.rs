use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        auth::OrphanageOperator,
        document::{DocumentPayload, DocumentQuery, ExpiringQuery, OrphanageDocument},
    },
    routes::{message, today},
    services::documents::DocumentService,
    AppState,
};

const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

pub async fn list_documents(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Json<Vec<OrphanageDocument>>> {
    Ok(Json(
        DocumentService::list(&state.db, operator.orphanage_id, &query).await?,
    ))
}

pub async fn create_document(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Json(body): Json<DocumentPayload>,
) -> ApiResult<(StatusCode, Json<OrphanageDocument>)> {
    body.validate().map_err(ApiError::Validation)?;
    let document =
        DocumentService::create(&state.db, operator.orphanage_id, operator.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update_document(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
    Json(body): Json<DocumentPayload>,
) -> ApiResult<Json<OrphanageDocument>> {
    body.validate().map_err(ApiError::Validation)?;
    Ok(Json(
        DocumentService::update(&state.db, operator.orphanage_id, id, &body).await?,
    ))
}

pub async fn delete_document(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    DocumentService::delete(&state.db, operator.orphanage_id, id).await?;
    Ok(message("Document supprimé"))
}

/// GET /documents/expiring?days=30
pub async fn expiring_documents(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Query(query): Query<ExpiringQuery>,
) -> ApiResult<Json<Vec<OrphanageDocument>>> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    Ok(Json(
        DocumentService::expiring(&state.db, operator.orphanage_id, today(), days).await?,
    ))
}
