use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Outcome of a failed API operation. Every handler returns
/// `Result<_, ApiError>`; the body is always `{"error": ...}` so the front end
/// can show it as-is.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    /// The operator's orphanage is pending or rejected; the session must end.
    #[error("Votre centre n'est pas encore vérifié")]
    AccountNotVerified,

    #[error("{0}")]
    TooManyRequests(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Services return `anyhow::Result`; an `ApiError` raised inside one keeps its status.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api) => api,
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::AccountNotVerified => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(e) => match e.downcast_ref::<sqlx::Error>() {
                Some(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::AccountNotVerified => Some("account_not_verified"),
            ApiError::TooManyRequests(_) => Some("rate_limited"),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self:#}");
        }

        let message = match status {
            StatusCode::NOT_FOUND if matches!(self, ApiError::Database(_) | ApiError::Internal(_)) => {
                "Enregistrement introuvable".to_string()
            }
            _ => self.to_string(),
        };

        let body = match self.code() {
            Some(code) => json!({ "error": message, "code": code }),
            None => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_404_even_through_anyhow() {
        let direct = ApiError::Database(sqlx::Error::RowNotFound);
        let wrapped = ApiError::Internal(anyhow::Error::from(sqlx::Error::RowNotFound));
        assert_eq!(direct.status(), StatusCode::NOT_FOUND);
        assert_eq!(wrapped.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn backend_message_is_kept_verbatim() {
        let err = ApiError::Internal(anyhow::anyhow!("duplicate key value violates unique constraint"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
    }

    #[test]
    fn validation_raised_in_a_service_stays_a_bad_request() {
        let service_err = anyhow::Error::from(ApiError::validation("Effectifs incohérents"));
        let err = ApiError::from(service_err);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Effectifs incohérents");
    }

    #[test]
    fn unverified_account_carries_a_code() {
        let err = ApiError::AccountNotVerified;
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), Some("account_not_verified"));
    }
}
