use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::rate_limit::check_public_form,
    models::{
        auth::{AdminUser, AnalystUser, OrphanageOperator},
        orphanage::{
            Orphanage, OrphanageQuery, RegisterOrphanageRequest, ReviewOrphanageRequest, UpdateOrphanageRequest,
        },
    },
    routes::message,
    services::orphanages::OrphanageService,
    AppState,
};

/// POST /orphanages/register (public)
pub async fn register_orphanage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterOrphanageRequest>,
) -> ApiResult<(StatusCode, Json<Orphanage>)> {
    check_public_form(
        &state.redis_client,
        &headers,
        "orphanage",
        state.config.registration_rate_limit,
    )
    .await?;
    body.validate().map_err(ApiError::Validation)?;

    let orphanage = OrphanageService::register(&state.db, &body).await?;
    Ok((StatusCode::CREATED, Json(orphanage)))
}

/// GET /admin/orphanages
pub async fn list_orphanages(
    State(state): State<AppState>,
    _analyst: AnalystUser,
    Query(query): Query<OrphanageQuery>,
) -> ApiResult<Json<Vec<Orphanage>>> {
    Ok(Json(OrphanageService::list(&state.db, &query).await?))
}

pub async fn get_orphanage(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Orphanage>> {
    Ok(Json(OrphanageService::get(&state.db, id).await?))
}

pub async fn update_orphanage(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrphanageRequest>,
) -> ApiResult<Json<Orphanage>> {
    body.validate().map_err(ApiError::Validation)?;
    Ok(Json(OrphanageService::update(&state.db, id, &body).await?))
}

pub async fn delete_orphanage(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    OrphanageService::delete(&state.db, id).await?;
    tracing::info!("Orphanage {} deleted by {}", id, admin.user_id);
    Ok(message("Centre supprimé"))
}

/// POST /admin/orphanages/{id}/review
pub async fn review_orphanage(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewOrphanageRequest>,
) -> ApiResult<Json<Orphanage>> {
    let orphanage = OrphanageService::review(
        &state.db,
        state.email.as_deref(),
        id,
        body.decision,
        body.reason,
    )
    .await?;
    Ok(Json(orphanage))
}

/// GET /me/orphanage
pub async fn my_orphanage(
    State(state): State<AppState>,
    operator: OrphanageOperator,
) -> ApiResult<Json<Orphanage>> {
    Ok(Json(OrphanageService::get(&state.db, operator.orphanage_id).await?))
}

/// PUT /me/orphanage
pub async fn update_my_orphanage(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Json(body): Json<UpdateOrphanageRequest>,
) -> ApiResult<Json<Orphanage>> {
    body.validate().map_err(ApiError::Validation)?;
    Ok(Json(
        OrphanageService::update(&state.db, operator.orphanage_id, &body).await?,
    ))
}
