use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::error::ApiError;
use crate::models::auth::{AdminUser, AnalystUser, AuthenticatedUser, Claims};
use crate::models::user::UserRole;

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid Authorization header format"))?;

        let keys = parts
            .extensions
            .get::<JwtKeys>()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("JWT keys not configured")))?;

        decode_access_token(token, keys).map_err(|e| {
            tracing::debug!("Rejected access token: {}", e);
            ApiError::Unauthorized("Invalid or expired token")
        })
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(ApiError::Forbidden("Accès réservé aux administrateurs"));
        }
        Ok(AdminUser(user))
    }
}

impl<S> FromRequestParts<S> for AnalystUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !matches!(user.role, UserRole::Admin | UserRole::Partner) {
            return Err(ApiError::Forbidden("Accès réservé aux administrateurs et partenaires"));
        }
        Ok(AnalystUser(user))
    }
}

/// Extension type carrying the token verification settings through request extensions.
#[derive(Clone)]
pub struct JwtKeys {
    pub secret: String,
    pub audience: Option<String>,
}

/// Verifies the HS256 signature and expiry (and the audience when configured)
/// before trusting the subject.
pub fn decode_access_token(token: &str, keys: &JwtKeys) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(keys.secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match &keys.audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub.parse()?,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    fn keys() -> JwtKeys {
        JwtKeys {
            secret: "test-secret".into(),
            audience: None,
        }
    }

    fn now() -> usize {
        chrono::Utc::now().timestamp() as usize
    }

    fn token(secret: &str, claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_user() {
        let id = Uuid::new_v4();
        let t = token(
            "test-secret",
            json!({ "sub": id.to_string(), "role": "orphelinat", "iat": now(), "exp": now() + 3600 }),
        );
        let user = decode_access_token(&t, &keys()).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.role, UserRole::Orphelinat);
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let t = token(
            "another-secret",
            json!({ "sub": Uuid::new_v4().to_string(), "role": "admin", "iat": now(), "exp": now() + 3600 }),
        );
        assert!(decode_access_token(&t, &keys()).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let t = token(
            "test-secret",
            json!({ "sub": Uuid::new_v4().to_string(), "role": "admin", "iat": now() - 7200, "exp": now() - 3600 }),
        );
        assert!(decode_access_token(&t, &keys()).is_err());
    }

    #[test]
    fn audience_is_checked_when_configured() {
        let claims = json!({
            "sub": Uuid::new_v4().to_string(),
            "role": "partner",
            "aud": "authenticated",
            "iat": now(),
            "exp": now() + 3600
        });
        let t = token("test-secret", claims);
        let mut k = keys();
        k.audience = Some("authenticated".into());
        assert!(decode_access_token(&t, &k).is_ok());
        k.audience = Some("service_role".into());
        assert!(decode_access_token(&t, &k).is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let t = token(
            "test-secret",
            json!({ "sub": Uuid::new_v4().to_string(), "role": "super_admin", "iat": now(), "exp": now() + 3600 }),
        );
        assert!(decode_access_token(&t, &keys()).is_err());
    }
}
