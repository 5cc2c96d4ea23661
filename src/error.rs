use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub const CODE_TEAM_EXISTS: &str = "TEAM_EXISTS";
pub const CODE_PR_EXISTS: &str = "PR_EXISTS";
pub const CODE_PR_MERGED: &str = "PR_MERGED";
pub const CODE_NOT_ASSIGNED: &str = "NOT_ASSIGNED";
pub const CODE_NO_CANDIDATE: &str = "NO_CANDIDATE";
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, CODE_NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, CODE_NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, CODE_NOT_FOUND, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, CODE_NOT_FOUND, message)
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            CODE_NOT_FOUND,
            error.to_string(),
        )
    }

    pub fn team_exists() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            CODE_TEAM_EXISTS,
            "team already exists",
        )
    }

    pub fn pr_exists() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            CODE_PR_EXISTS,
            "pull request already exists",
        )
    }

    pub fn pr_merged() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            CODE_PR_MERGED,
            "pull request already merged",
        )
    }

    pub fn not_assigned() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            CODE_NOT_ASSIGNED,
            "reviewer is not assigned to this PR",
        )
    }

    pub fn author_inactive() -> Self {
        Self::new(StatusCode::CONFLICT, CODE_NOT_FOUND, "author is not active")
    }

    pub fn no_candidate() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            CODE_NO_CANDIDATE,
            "no active replacement candidate in team",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found("resource not found"),
            _ => AppError::internal(value),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}
