//! Single entry point for every inbound request.

use crate::app::GatewayState;
use crate::http::health::HealthCheck;
use crate::http::{health, ingestion, proxy, status};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use tracing::debug;

/// Where a request goes. Exactly one handler receives the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health(HealthCheck),
    TaskStatus(String),
    CreateTask,
    Proxy,
}

/// Drop the leading `/` and then the API prefix, if the path starts with it
/// as a whole segment.
pub fn strip_api_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    let path = path.strip_prefix('/').unwrap_or(path);
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => path,
    }
}

/// Classify a request by method, prefix-stripped path and content type.
pub fn classify(method: &Method, path: &str, content_type: &str) -> Route {
    let path = path.trim_end_matches('/');

    if let Some(check) = HealthCheck::from_path(path) {
        return Route::Health(check);
    }

    if method == Method::GET {
        if let Some(task_id) = path.strip_prefix("gateway/tasks/") {
            if !task_id.is_empty() && !task_id.contains('/') {
                return Route::TaskStatus(task_id.to_string());
            }
        }
    }

    if method == Method::POST && content_type.to_ascii_lowercase().contains("application/json") {
        return Route::CreateTask;
    }

    Route::Proxy
}

pub async fn dispatch(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    debug!(
        method = %parts.method,
        path = %parts.uri.path(),
        content_type = %content_type,
        "Received request"
    );

    let path = strip_api_prefix(parts.uri.path(), state.config.api_prefix());

    match classify(&parts.method, path, &content_type) {
        Route::Health(check) => health::respond(&state, check).await,
        Route::TaskStatus(task_id) => status::task_status(&state, &task_id)
            .await
            .into_response(),
        Route::CreateTask => ingestion::create_task(&state, body).await.into_response(),
        Route::Proxy => {
            let target = match parts.uri.query() {
                Some(query) => format!("{path}?{query}"),
                None => path.to_string(),
            };
            proxy::forward(&state, parts.method, &target, &parts.headers, body)
                .await
                .into_response()
        }
    }
}
