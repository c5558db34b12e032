use crate::app::GatewayState;
use crate::http::GatewayError;
use axum::response::{IntoResponse, Json, Response};

/// `GET /gateway/tasks/{id}`: current upload status of one task.
pub async fn task_status(state: &GatewayState, task_id: &str) -> Result<Response, GatewayError> {
    match state.store.get(task_id).await? {
        Some(status) => Ok(Json(status).into_response()),
        None => Err(GatewayError::TaskNotFound),
    }
}
