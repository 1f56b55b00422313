use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Claims of the access token minted by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user UUID
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the verified JWT, available via Axum extractors
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Operator whose orphanage was resolved through `user_orphanages` and is verified.
#[derive(Debug, Clone)]
pub struct OrphanageOperator {
    pub user_id: Uuid,
    pub orphanage_id: Uuid,
}

/// Administrator (role `admin`).
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

/// Any role allowed to read cross-facility dashboards and reports (admin or partner).
#[derive(Debug, Clone)]
pub struct AnalystUser(pub AuthenticatedUser);
