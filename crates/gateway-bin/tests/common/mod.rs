//! Shared fixtures: a recording fake runner, fake docker binaries, and a
//! gateway served on an ephemeral port.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use device_identity_crypto::Identity;
use gateway_bin::app::{self, GatewayState};
use gateway_config_and_utils::Config;
use gateway_database::TaskStatusStore;
use serde_json::Value;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const DEVICE_ID: &str = "3f1c2a9e-5b7d-4c1e-9a0b-2d6f8e4c7a10";
pub const CREATOR_ADDRESS: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
pub const FAKE_ARCHIVE_BYTES: &str = "fake-image-archive-bytes";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct FakeRunner {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeRunner {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::POST && r.uri == "/tasks")
            .collect()
    }
}

/// Runner that records every request. `GET /health` answers 200,
/// `POST /tasks` answers `upload_status`, anything else 418 with an
/// `x-runner` header.
pub async fn spawn_runner(upload_status: StatusCode) -> FakeRunner {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorder = requests.clone();

    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(RecordedRequest {
                    method: method.clone(),
                    uri: uri.to_string(),
                    headers,
                    body: body.to_vec(),
                });

                match (method, uri.path()) {
                    (Method::GET, "/health") => (StatusCode::OK, "ok").into_response(),
                    (Method::POST, "/tasks") => (upload_status, "runner says no").into_response(),
                    _ => (
                        StatusCode::IM_A_TEAPOT,
                        [("x-runner", "fake")],
                        format!("proxied {}", body.len()),
                    )
                        .into_response(),
                }
            }
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeRunner { url, requests }
}

/// A URL nothing listens on.
pub fn dead_runner_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

struct FakeDockers {
    _dir: TempDir,
    working: PathBuf,
    broken: PathBuf,
}

const WORKING_DOCKER: &str = r#"#!/bin/sh
case "$1" in
  image) echo "sha256:0123456789abcdef"; exit 0 ;;
  pull) exit 0 ;;
  save) printf '%s' "fake-image-archive-bytes" > "$3"; exit 0 ;;
  version) echo "27.0.1"; exit 0 ;;
esac
echo "unknown command: $1" >&2
exit 1
"#;

const BROKEN_DOCKER: &str = r#"#!/bin/sh
case "$1" in
  image) echo "Error: No such image: $5" >&2; exit 1 ;;
  pull) echo "Error response from daemon: pull access denied for $3" >&2; exit 1 ;;
esac
echo "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?" >&2
exit 1
"#;

/// Scripts are written once per test binary, before any test can exec them,
/// so no child process inherits a still-open write handle.
fn fake_dockers() -> &'static FakeDockers {
    static DOCKERS: OnceLock<FakeDockers> = OnceLock::new();
    DOCKERS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, script: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        let working = write("docker-ok", WORKING_DOCKER);
        let broken = write("docker-broken", BROKEN_DOCKER);
        FakeDockers {
            _dir: dir,
            working,
            broken,
        }
    })
}

pub fn working_docker() -> &'static Path {
    &fake_dockers().working
}

pub fn broken_docker() -> &'static Path {
    &fake_dockers().broken
}

pub struct TestGateway {
    pub url: String,
    pub state: GatewayState,
    _work: TempDir,
}

impl TestGateway {
    pub fn images_dir(&self) -> &Path {
        self.state.images_dir()
    }

    /// True when no upload directory is left, including when the images
    /// directory was never created.
    pub fn images_dir_is_empty(&self) -> bool {
        match std::fs::read_dir(self.images_dir()) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }
}

pub async fn spawn_gateway(runner_url: &str, docker: &Path) -> TestGateway {
    let work = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.runner.server_url = runner_url.to_string();
    config.docker.executable = Some(docker.display().to_string());
    config.timeouts.proxy_secs = 10;
    config.timeouts.upload_secs = 10;
    config.timeouts.health_secs = 2;
    config.timeouts.image_pull_secs = 10;
    config.timeouts.image_save_secs = 10;

    let identity = Identity {
        device_id: DEVICE_ID.to_string(),
        creator_address: CREATOR_ADDRESS.to_string(),
    };
    let store = TaskStatusStore::open_in_memory().await.unwrap();
    let state =
        GatewayState::new(config, identity, store, work.path().join("images")).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(app::serve(listener, state.clone(), std::future::pending()));

    TestGateway {
        url,
        state,
        _work: work,
    }
}

/// Poll the status endpoint until the task reaches `uploaded` or `failed`.
pub async fn wait_for_terminal(client: &reqwest::Client, gateway: &str, task_id: &str) -> Value {
    for _ in 0..200 {
        let response = client
            .get(format!("{gateway}/api/gateway/tasks/{task_id}"))
            .send()
            .await
            .unwrap();
        if response.status() == reqwest::StatusCode::OK {
            let status: Value = response.json().await.unwrap();
            if status["state"] == "uploaded" || status["state"] == "failed" {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("task {task_id} never reached a terminal upload state");
}
