use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::ApiResult,
    models::{
        health::Disease,
        reference::{City, Province},
    },
    services::reference::ReferenceService,
    AppState,
};

pub async fn list_provinces(State(state): State<AppState>) -> ApiResult<Json<Vec<Province>>> {
    Ok(Json(ReferenceService::provinces(&state.db).await?))
}

pub async fn list_cities(
    State(state): State<AppState>,
    Path(province_id): Path<i32>,
) -> ApiResult<Json<Vec<City>>> {
    Ok(Json(ReferenceService::cities(&state.db, province_id).await?))
}

pub async fn list_diseases(State(state): State<AppState>) -> ApiResult<Json<Vec<Disease>>> {
    Ok(Json(ReferenceService::diseases(&state.db).await?))
}
