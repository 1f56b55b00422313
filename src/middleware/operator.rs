use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::auth::{AuthenticatedUser, OrphanageOperator};
use crate::models::user::UserRole;
use crate::AppState;

/// Resolves the caller's orphanage through `user_orphanages`. Only verified
/// facilities get through; a pending or rejected one answers
/// `account_not_verified` so the front end ends the session.
impl FromRequestParts<AppState> for OrphanageOperator {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Orphelinat {
            return Err(ApiError::Forbidden("Accès réservé aux centres d'accueil"));
        }

        let link: Option<(Uuid, String)> = sqlx::query_as(
            "SELECT o.id, o.legal_status
             FROM user_orphanages uo
             JOIN orphanages o ON o.id = uo.orphanage_id
             WHERE uo.user_id = $1
             ORDER BY uo.created_at
             LIMIT 1",
        )
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?;

        let (orphanage_id, legal_status) =
            link.ok_or(ApiError::Forbidden("Aucun centre associé à ce compte"))?;

        if legal_status != "verified" {
            return Err(ApiError::AccountNotVerified);
        }

        Ok(OrphanageOperator {
            user_id: user.user_id,
            orphanage_id,
        })
    }
}
