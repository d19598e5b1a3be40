use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    // 便利方法
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::UserAlreadyExists) => {
                ApiError::new(StatusCode::CONFLICT, "USER_EXISTS", "Email already exists")
            }
            AppErr::Domain(DomainError::UserNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "user not found")
            }
            AppErr::Domain(DomainError::PostNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "POST_NOT_FOUND", "post not found")
            }
            AppErr::Domain(DomainError::NotPostOwner) => ApiError::new(
                StatusCode::FORBIDDEN,
                "NOT_POST_OWNER",
                "post belongs to another user",
            ),
            AppErr::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Storage { message } => {
                    tracing::error!(error = %message, "storage failure");
                    ApiError::internal_server_error("database error")
                }
            },
            AppErr::Password(err) => {
                tracing::error!(error = %err, "password hashing failure");
                ApiError::internal_server_error("password error")
            }
            AppErr::Authentication => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid Credentials",
            ),
            AppErr::Infrastructure(message) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INFRASTRUCTURE_ERROR",
                message,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
