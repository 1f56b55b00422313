use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        notification::{Notification, NotificationQuery},
    },
    routes::message,
    services::notifications::NotificationService,
    AppState,
};

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(
        NotificationService::list(&state.db, user.user_id, &query).await?,
    ))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    NotificationService::mark_read(&state.db, user.user_id, id).await?;
    Ok(message("Notification lue"))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Value>> {
    let updated = NotificationService::mark_all_read(&state.db, user.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}
