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
        child::{Child, CreateChildRequest, UpdateChildRequest},
    },
    routes::{message, today},
    services::children::ChildService,
    AppState,
};

pub async fn list_children(
    State(state): State<AppState>,
    operator: OrphanageOperator,
) -> ApiResult<Json<Vec<Child>>> {
    Ok(Json(ChildService::list(&state.db, operator.orphanage_id).await?))
}

pub async fn get_child(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Child>> {
    Ok(Json(ChildService::get(&state.db, operator.orphanage_id, id).await?))
}

pub async fn create_child(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Json(body): Json<CreateChildRequest>,
) -> ApiResult<(StatusCode, Json<Child>)> {
    body.validate(today()).map_err(ApiError::Validation)?;
    let child = ChildService::create(&state.db, operator.orphanage_id, &body).await?;
    Ok((StatusCode::CREATED, Json(child)))
}

pub async fn update_child(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateChildRequest>,
) -> ApiResult<Json<Child>> {
    body.validate(today()).map_err(ApiError::Validation)?;
    Ok(Json(
        ChildService::update(&state.db, operator.orphanage_id, id, &body).await?,
    ))
}

/// Health and nutrition rows go with the child (ON DELETE CASCADE).
pub async fn delete_child(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    ChildService::delete(&state.db, operator.orphanage_id, id).await?;
    Ok(message("Enfant supprimé"))
}
