use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::ApiResult,
    models::{
        auth::{AnalystUser, OrphanageOperator},
        stats::{AreaQuery, AreaStats, OrphanageStats, OverviewStats, PublicStatsResponse},
    },
    routes::today,
    services::stats::{example_public_stats, StatsService},
    AppState,
};

/// GET /orphanage-stats
pub async fn orphanage_stats(
    State(state): State<AppState>,
    operator: OrphanageOperator,
) -> ApiResult<Json<OrphanageStats>> {
    Ok(Json(
        StatsService::orphanage_stats(&state.db, operator.orphanage_id, today()).await?,
    ))
}

/// GET /stats/public
///
/// Never fails: when the view cannot be read the fixed example dataset is
/// served with `is_example = true`.
pub async fn public_stats(State(state): State<AppState>) -> Json<PublicStatsResponse> {
    match StatsService::public_stats(&state.db).await {
        Ok(stats) => Json(PublicStatsResponse {
            stats,
            is_example: false,
        }),
        Err(e) => {
            tracing::warn!("Public stats unavailable, serving example data: {e:#}");
            Json(PublicStatsResponse {
                stats: example_public_stats(),
                is_example: true,
            })
        }
    }
}

pub async fn province_stats(
    State(state): State<AppState>,
    _analyst: AnalystUser,
) -> ApiResult<Json<Vec<AreaStats>>> {
    Ok(Json(StatsService::province_stats(&state.db).await?))
}

/// GET /stats/cities?province=
pub async fn city_stats(
    State(state): State<AppState>,
    _analyst: AnalystUser,
    Query(query): Query<AreaQuery>,
) -> ApiResult<Json<Vec<AreaStats>>> {
    Ok(Json(
        StatsService::city_stats(&state.db, query.province.as_deref()).await?,
    ))
}

/// GET /stats/overview?province=
pub async fn overview(
    State(state): State<AppState>,
    _analyst: AnalystUser,
    Query(query): Query<AreaQuery>,
) -> ApiResult<Json<OverviewStats>> {
    let province = query.province.filter(|p| !p.trim().is_empty());
    Ok(Json(StatsService::overview(&state.db, province, today()).await?))
}
