use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use gateway_database::DatabaseError;
use runner_client::RunnerClientError;
use task_protocol_types::{HttpError, ValidationError};
use thiserror::Error;
use tracing::{error, warn};

/// Failures that happen before a response is written. Each maps to a
/// `{"status":…,"message":…}` body.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("error reading request body: {0}")]
    BodyRead(String),

    #[error("error forwarding request: {0}")]
    Upstream(#[from] RunnerClientError),

    #[error("task not found")]
    TaskNotFound,

    #[error("task status unavailable: {0}")]
    Store(#[from] DatabaseError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) | Self::BodyRead(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::TaskNotFound => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (status, Json(HttpError::new(status.as_u16(), message))).into_response()
    }
}
