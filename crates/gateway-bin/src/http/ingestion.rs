use crate::app::GatewayState;
use crate::http::GatewayError;
use crate::pipeline;
use axum::body::{to_bytes, Body};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use task_protocol_types::{TaskRecord, TaskRequest};
use tracing::info;

/// Validate a task, acknowledge it with 202 and, when it names an image,
/// hand it to the background upload pipeline.
pub async fn create_task(state: &GatewayState, body: Body) -> Result<Response, GatewayError> {
    let bytes = to_bytes(body, state.config.server.max_task_body_bytes)
        .await
        .map_err(|err| GatewayError::BodyRead(err.to_string()))?;

    let request: TaskRequest = serde_json::from_slice(&bytes)
        .map_err(|err| GatewayError::InvalidBody(err.to_string()))?;

    let record = TaskRecord::from_request(
        request,
        state.identity.device_id.as_str(),
        state.identity.creator_address.as_str(),
    )?;

    // The status row exists before the 202 so the caller can poll right away.
    if let Some(image) = record.image.as_deref() {
        state
            .store
            .insert_pending(&record.id.to_string(), image)
            .await?;
        pipeline::spawn(state.clone(), record.clone());
    }

    info!(
        task_id = %record.id,
        title = %record.title,
        image = record.image.as_deref().unwrap_or(""),
        "Task accepted"
    );

    Ok((StatusCode::ACCEPTED, Json(record)).into_response())
}
