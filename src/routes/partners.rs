use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::rate_limit::check_public_form,
    models::{
        auth::AdminUser,
        partner::{CreatePartnerRequest, PartnerRequest, PartnerRequestQuery, ReviewPartnerRequest},
    },
    services::partners::PartnerService,
    AppState,
};

/// POST /partner-requests (public)
pub async fn submit_partner_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreatePartnerRequest>,
) -> ApiResult<(StatusCode, Json<PartnerRequest>)> {
    check_public_form(
        &state.redis_client,
        &headers,
        "partner",
        state.config.registration_rate_limit,
    )
    .await?;
    body.validate().map_err(ApiError::Validation)?;

    let request = PartnerService::submit(&state.db, &body).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_partner_requests(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PartnerRequestQuery>,
) -> ApiResult<Json<Vec<PartnerRequest>>> {
    Ok(Json(PartnerService::list(&state.db, &query).await?))
}

pub async fn review_partner_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewPartnerRequest>,
) -> ApiResult<Json<PartnerRequest>> {
    let request = PartnerService::review(
        &state.db,
        state.email.as_deref(),
        id,
        body.decision,
        body.reason,
    )
    .await?;
    Ok(Json(request))
}
