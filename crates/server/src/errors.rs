use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error body `{"error": <reason>, "message": <detail>}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    fn internal(detail: String) -> Self {
        error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let reason = self.status.canonical_reason().unwrap_or("Error");
        (self.status, Json(serde_json::json!({"error": reason, "message": self.message}))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        use models::errors::ModelError;
        match e {
            ServiceError::Validation(m) | ServiceError::Model(ModelError::Validation(m)) => {
                ApiError::new(StatusCode::BAD_REQUEST, m)
            }
            ServiceError::NotFound(m) => ApiError::new(StatusCode::NOT_FOUND, m),
            ServiceError::Conflict(m) => ApiError::new(StatusCode::CONFLICT, m),
            ServiceError::Forbidden(m) => ApiError::forbidden(m),
            ServiceError::Unauthorized(m) => ApiError::unauthorized(m),
            ServiceError::Db(m) | ServiceError::Model(ModelError::Db(m)) => ApiError::internal(m),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => ApiError::new(StatusCode::BAD_REQUEST, m),
            AuthError::Conflict => ApiError::new(StatusCode::CONFLICT, "A user with this email already exists."),
            AuthError::NotFound => ApiError::new(StatusCode::NOT_FOUND, "User not found."),
            AuthError::Unauthorized => ApiError::unauthorized("Invalid credentials."),
            AuthError::Forbidden(m) => ApiError::forbidden(m),
            other => {
                let code = other.code();
                ApiError::internal(format!("auth error {code}: {other}"))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database setup failed: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("event"), StatusCode::NOT_FOUND),
            (ServiceError::conflict("dup"), StatusCode::CONFLICT),
            (ServiceError::forbidden("no"), StatusCode::FORBIDDEN),
            (ServiceError::Unauthorized("who".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Db("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let e = ApiError::from(AuthError::TokenError("secret detail".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.message.contains("secret"));
    }
}
