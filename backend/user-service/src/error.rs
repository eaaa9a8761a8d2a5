use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use crypto_core::TokenError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, message) = match self {
            AuthError::InvalidCredentials => (
                "Invalid credentials",
                "Email or password is incorrect".to_string(),
            ),
            AuthError::UserNotFound => ("Not found", "User not found".to_string()),
            AuthError::EmailAlreadyExists => {
                ("Conflict", "Email already registered".to_string())
            }
            AuthError::Validation(msg) => ("Validation failed", msg.clone()),
            AuthError::Internal(detail) => {
                error!(detail = %detail, "Internal error");
                (
                    "Internal server error",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "error": error,
            "status": status.as_u16(),
            "message": message,
        }))
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Internal(format!("token minting failed: {}", err.reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_internal_error_hides_detail() {
        let resp = AuthError::Internal("pool exhausted".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(!text.contains("pool exhausted"));
    }

    #[test]
    fn test_statuses() {
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
