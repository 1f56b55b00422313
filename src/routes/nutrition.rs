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
        nutrition::{NutritionPayload, NutritionRecord},
    },
    routes::{message, today},
    services::nutrition::NutritionService,
    AppState,
};

pub async fn list_nutrition_records(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(child_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NutritionRecord>>> {
    Ok(Json(
        NutritionService::list(&state.db, operator.orphanage_id, child_id).await?,
    ))
}

pub async fn create_nutrition_record(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(child_id): Path<Uuid>,
    Json(body): Json<NutritionPayload>,
) -> ApiResult<(StatusCode, Json<NutritionRecord>)> {
    body.validate(today()).map_err(ApiError::Validation)?;
    let record = NutritionService::create(&state.db, operator.orphanage_id, child_id, &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_nutrition_record(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
    Json(body): Json<NutritionPayload>,
) -> ApiResult<Json<NutritionRecord>> {
    body.validate(today()).map_err(ApiError::Validation)?;
    Ok(Json(
        NutritionService::update(&state.db, operator.orphanage_id, id, &body).await?,
    ))
}

pub async fn delete_nutrition_record(
    State(state): State<AppState>,
    operator: OrphanageOperator,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    NutritionService::delete(&state.db, operator.orphanage_id, id).await?;
    Ok(message("Mesure supprimée"))
}
