use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::application::objectstore::ObjectStoreError;
use crate::application::repos::RepoError;
use crate::application::search::SearchError;
use crate::cache::CacheError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Diagnostic trail attached to error responses for logging middleware; the
/// response body itself only carries the public message.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rate limited: {0}")]
    RateLimited(&'static str),
    #[error("authentication required")]
    Unauthorized,
    #[error("caller lacks the required role")]
    Forbidden,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. })
            | AppError::NotFound
            | AppError::Repo(RepoError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Validation(_)
            | AppError::Repo(RepoError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::Repo(RepoError::Duplicate { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Repo(RepoError::Persistence(_))
            | AppError::Repo(RepoError::Timeout)
            | AppError::Cache(_)
            | AppError::Search(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ObjectStore(_)
            | AppError::Infra(_)
            | AppError::Domain(DomainError::Invariant { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. })
            | AppError::NotFound
            | AppError::Repo(RepoError::NotFound) => "Resource not found",
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Validation(_)
            | AppError::Repo(RepoError::InvalidInput { .. }) => "Request could not be processed",
            AppError::Conflict(_) | AppError::Repo(RepoError::Duplicate { .. }) => {
                "Conflicting state"
            }
            AppError::RateLimited(_) => "Too many requests",
            AppError::Unauthorized => "Authentication required",
            AppError::Forbidden => "Forbidden",
            AppError::Repo(_) | AppError::Cache(_) | AppError::Search(_) => {
                "Service temporarily unavailable"
            }
            AppError::ObjectStore(_)
            | AppError::Infra(_)
            | AppError::Domain(DomainError::Invariant { .. }) => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_client_or_server_statuses() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::validation("discount out of range").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::conflict("already favorited").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateLimited("favorite toggle").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Cache(CacheError::Backend("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn report_collects_source_chain() {
        let err = AppError::Repo(RepoError::Persistence("connection refused".into()));
        let report =
            ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &err);
        assert!(report.messages.iter().any(|m| m.contains("connection refused")));
    }
}
