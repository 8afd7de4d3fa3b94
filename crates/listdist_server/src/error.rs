//! HTTP error envelope and status mapping.
//!
//! # Invariants
//! - Every failure is rendered as `{"success": false, "message": ...}`.
//! - Internal details (SQLite messages, join errors) are logged, never
//!   returned to the client.
//! - Log lines carry only status and error codes; messages may echo emails.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use listdist_core::{AgentServiceError, DistributionServiceError, RepoError};
use log::{error, warn};
use serde::Serialize;
use std::fmt::{Display, Formatter};

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// Logs `detail` and hides it behind a generic message.
    pub fn internal(code: &'static str, detail: impl Display) -> Self {
        error!(
            "event=http_internal_error module=server status=error error_code={code} detail={detail}"
        );
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, INTERNAL_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            warn!(
                "event=http_request module=server status=error http_status={} error_code={}",
                self.status.as_u16(),
                self.code
            );
        }
        let body = ErrorBody {
            success: false,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AgentServiceError> for ApiError {
    fn from(value: AgentServiceError) -> Self {
        match value {
            AgentServiceError::Validation(err) => {
                Self::bad_request("validation_failed", err.to_string())
            }
            AgentServiceError::DuplicateEmail(_) => {
                Self::new(StatusCode::CONFLICT, "duplicate_email", value.to_string())
            }
            AgentServiceError::AgentNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "agent_not_found", value.to_string())
            }
            AgentServiceError::Credential(message) => Self::internal("credential_hash", message),
            AgentServiceError::Repo(err) => Self::internal(err.code(), err),
        }
    }
}

impl From<DistributionServiceError> for ApiError {
    fn from(value: DistributionServiceError) -> Self {
        let code = match &value {
            DistributionServiceError::Import(_) => "import_failed",
            DistributionServiceError::Schema(_) => "schema_invalid",
            DistributionServiceError::NoRecipients => "no_recipients",
            DistributionServiceError::EmptyPayload => "empty_payload",
            DistributionServiceError::DuplicateAgent(_) => "duplicate_recipient",
            DistributionServiceError::InvalidItem { .. } => "invalid_item",
            DistributionServiceError::UnknownAgent(_) => {
                return Self::new(StatusCode::NOT_FOUND, "agent_not_found", value.to_string())
            }
            DistributionServiceError::ListNotFound(_) => {
                return Self::new(StatusCode::NOT_FOUND, "list_not_found", value.to_string())
            }
            DistributionServiceError::StoreWriteFailure(err) => {
                error!(
                    "event=distribution_store module=server status=error error_code={} detail={}",
                    err.code(),
                    err
                );
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_write_failed",
                    "failed to store distribution",
                );
            }
            DistributionServiceError::Repo(err) => return Self::internal(err.code(), err),
        };
        Self::bad_request(code, value.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::internal(value.code(), value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request("invalid_json", value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::bad_request("invalid_query", value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use listdist_core::{AgentServiceError, DistributionServiceError, SchemaError};
    use uuid::Uuid;

    #[test]
    fn agent_errors_map_to_client_statuses() {
        let duplicate: ApiError = AgentServiceError::DuplicateEmail("a@b.co".into()).into();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let missing: ApiError = AgentServiceError::AgentNotFound(Uuid::nil()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn distribution_errors_map_to_client_statuses() {
        let empty: ApiError = DistributionServiceError::Schema(SchemaError::EmptyInput).into();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.message(), "the file is empty");

        let none: ApiError = DistributionServiceError::NoRecipients.into();
        assert_eq!(none.status(), StatusCode::BAD_REQUEST);

        let unknown: ApiError = DistributionServiceError::UnknownAgent(Uuid::nil()).into();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::internal("db_error", "disk I/O error at /var/data");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("/var/data"));
    }
}
