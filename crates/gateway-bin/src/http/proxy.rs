use crate::app::GatewayState;
use crate::http::GatewayError;
use axum::body::{Body, HttpBody};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use futures_util::TryStreamExt;
use runner_client::strip_hop_by_hop;
use tracing::{debug, warn};

/// Stream a request through to the runner and stream its answer back.
///
/// Only transport failures become a 502; any status the runner returns is
/// relayed unchanged.
pub async fn forward(
    state: &GatewayState,
    method: Method,
    path_and_query: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, GatewayError> {
    let outbound_body = if body.is_end_stream() {
        reqwest::Body::from(Vec::new())
    } else {
        reqwest::Body::wrap_stream(body.into_data_stream())
    };

    let upstream = state
        .runner
        .forward(method, path_and_query, headers, outbound_body, &state.identity)
        .await?;

    let status = upstream.status();
    debug!(status = status.as_u16(), path = %path_and_query, "Runner responded");

    let response_headers = strip_hop_by_hop(upstream.headers());
    let path = path_and_query.to_string();
    let stream = upstream.bytes_stream().inspect_err(move |err| {
        warn!(error = %err, path = %path, "Upstream body ended early");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}
