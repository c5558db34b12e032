use crate::headers::{apply_identity, outbound_request_headers};
use crate::{RunnerClientError, RunnerClientResult};
use container_image_ops::ImagePackage;
use device_identity_crypto::Identity;
use gateway_config_and_utils::TimeoutConfig;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use task_protocol_types::TaskRecord;
use tracing::{debug, info};
use url::Url;

/// The gateway's only outbound HTTP client towards the runner.
#[derive(Clone, Debug)]
pub struct RunnerClient {
    http: reqwest::Client,
    base_url: Url,
    proxy_timeout: Duration,
    upload_timeout: Duration,
    health_timeout: Duration,
}

impl RunnerClient {
    pub fn new(base_url: Url, timeouts: &TimeoutConfig) -> RunnerClientResult<Self> {
        // Redirects are relayed to the caller, not followed.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url,
            proxy_timeout: timeouts.proxy(),
            upload_timeout: timeouts.upload(),
            health_timeout: timeouts.health(),
        })
    }

    /// Resolve a gateway-relative path (query string included) against the
    /// runner base URL, keeping any path the base URL already has.
    pub fn url_for(&self, path_and_query: &str) -> RunnerClientResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let suffix = path_and_query.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{suffix}"))?)
    }

    /// Send a request through to the runner unchanged apart from headers.
    ///
    /// The response is returned as-is, whatever its status; only transport
    /// failures are errors.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: reqwest::Body,
        identity: &Identity,
    ) -> RunnerClientResult<reqwest::Response> {
        let url = self.url_for(path_and_query)?;
        let headers = outbound_request_headers(headers, identity)?;
        debug!(method = %method, url = %url, "Forwarding request to runner");

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .timeout(self.proxy_timeout)
            .send()
            .await?;
        Ok(response)
    }

    /// POST the task and its image archive to `<runner>/tasks` as multipart.
    /// The archive is streamed from disk.
    pub async fn upload_task(
        &self,
        record: &TaskRecord,
        package: &ImagePackage,
        identity: &Identity,
    ) -> RunnerClientResult<()> {
        let url = self.url_for("tasks")?;

        let task_part = Part::text(serde_json::to_string(record)?).mime_str("application/json")?;
        let archive = tokio::fs::File::open(package.archive_path()).await?;
        let image_part =
            Part::stream_with_length(reqwest::Body::from(archive), package.size_bytes())
                .file_name(package.file_name())
                .mime_str("application/x-tar")?;
        let form = Form::new().part("task", task_part).part("image", image_part);

        let mut headers = HeaderMap::new();
        apply_identity(&mut headers, identity)?;

        info!(
            task_id = %record.id,
            image = package.image(),
            size_bytes = package.size_bytes(),
            "Uploading task image to runner"
        );

        let response = self
            .http
            .post(url)
            .headers(headers)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RunnerClientError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET <runner>/health`, succeeding only on 200.
    pub async fn check_health(&self) -> RunnerClientResult<()> {
        let url = self.url_for("health")?;
        let response = self
            .http
            .get(url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RunnerClientError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap as AxumHeaders, Method as AxumMethod, StatusCode as AxumStatus, Uri};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn identity() -> Identity {
        Identity {
            device_id: "device-1".to_string(),
            creator_address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
        }
    }

    fn client_for(base: &str) -> RunnerClient {
        RunnerClient::new(Url::parse(base).unwrap(), &TimeoutConfig::default()).unwrap()
    }

    async fn echo(method: AxumMethod, uri: Uri, headers: AxumHeaders, body: Bytes) -> (AxumStatus, Json<Value>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        (
            AxumStatus::IM_A_TEAPOT,
            Json(json!({
                "method": method.as_str(),
                "uri": uri.to_string(),
                "device": header("x-device-id"),
                "creator": header("x-creator-address"),
                "body": String::from_utf8_lossy(&body),
            })),
        )
    }

    async fn spawn_runner(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn url_for_joins_paths_and_keeps_query() {
        let client = client_for("http://runner.local:8080/");
        assert_eq!(
            client.url_for("/tasks/abc?verbose=1").unwrap().as_str(),
            "http://runner.local:8080/tasks/abc?verbose=1"
        );

        let nested = client_for("http://runner.local/api/v1");
        assert_eq!(
            nested.url_for("tasks").unwrap().as_str(),
            "http://runner.local/api/v1/tasks"
        );
    }

    #[tokio::test]
    async fn forward_relays_method_path_body_and_status() {
        let base = spawn_runner(Router::new().fallback(echo)).await;
        let client = client_for(&base);

        let mut headers = HeaderMap::new();
        headers.insert("x-device-id", "spoofed".parse().unwrap());

        let response = client
            .forward(
                Method::PUT,
                "/tasks/42?force=true",
                &headers,
                reqwest::Body::from("payload"),
                &identity(),
            )
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 418);
        let echoed: Value = response.json().await.unwrap();
        assert_eq!(echoed["method"], "PUT");
        assert_eq!(echoed["uri"], "/tasks/42?force=true");
        assert_eq!(echoed["device"], "device-1");
        assert_eq!(echoed["creator"], identity().creator_address);
        assert_eq!(echoed["body"], "payload");
    }

    #[tokio::test]
    async fn forward_to_closed_port_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"));
        let err = client
            .forward(
                Method::GET,
                "anything",
                &HeaderMap::new(),
                reqwest::Body::from(Vec::new()),
                &identity(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerClientError::Transport(_)));
    }

    #[tokio::test]
    async fn health_requires_200() {
        let healthy = spawn_runner(Router::new().route("/health", get(|| async { "ok" }))).await;
        client_for(&healthy).check_health().await.unwrap();

        let sick = spawn_runner(Router::new().route(
            "/health",
            get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "draining") }),
        ))
        .await;
        let err = client_for(&sick).check_health().await.unwrap_err();
        match err {
            RunnerClientError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "draining");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
