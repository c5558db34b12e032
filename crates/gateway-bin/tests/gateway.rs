//! End-to-end gateway behaviour against a fake runner and fake docker.

#![cfg(unix)]

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn task_without_image_is_acknowledged_without_background_work() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let response = client()
        .post(format!("{}/api/tasks", gateway.url))
        .json(&json!({"title": "t1", "command": ["echo", "hi"]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    let record: Value = response.json().await.unwrap();
    assert_eq!(record["title"], "t1");
    assert_eq!(record["command"], json!(["echo", "hi"]));
    assert_eq!(record["creator_address"], CREATOR_ADDRESS);
    assert_eq!(record["creator_device_id"], DEVICE_ID);
    assert!(record.get("image").is_none());

    let task_id = record["id"].as_str().unwrap();
    let status = client()
        .get(format!("{}/gateway/tasks/{task_id}", gateway.url))
        .send()
        .await
        .unwrap();
    assert_eq!(status.status(), 404);
    let body: Value = status.json().await.unwrap();
    assert_eq!(body, json!({"status": 404, "message": "task not found"}));

    assert!(runner.requests().is_empty());
}

#[tokio::test]
async fn blank_title_is_rejected_with_no_side_effects() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let response = client()
        .post(format!("{}/tasks", gateway.url))
        .json(&json!({"title": "", "command": ["x"], "image": "alpine:3.19"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": 400, "message": "title is required"}));

    assert!(runner.requests().is_empty());
    assert!(gateway.images_dir_is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let response = client()
        .post(format!("{}/api/tasks", gateway.url))
        .header("content-type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("invalid request body: "));
    assert!(runner.requests().is_empty());
}

#[tokio::test]
async fn liveness_is_answered_locally() {
    let gateway = spawn_gateway(&dead_runner_url(), working_docker()).await;

    let response = client()
        .get(format!("{}/health/live", gateway.url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "alive");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn summary_health_reports_configured_runner() {
    let gateway = spawn_gateway(&dead_runner_url(), working_docker()).await;

    let body: Value = client()
        .get(format!("{}/api/health", gateway.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["runner"], "configured");
}

#[tokio::test]
async fn readiness_follows_the_runner() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let up = spawn_gateway(&runner.url, working_docker()).await;
    let response = client()
        .get(format!("{}/health/ready", up.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(runner.requests()[0].uri, "/health");

    let down = spawn_gateway(&dead_runner_url(), working_docker()).await;
    let response = client()
        .get(format!("{}/health/ready", down.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "not_ready");
}

#[tokio::test]
async fn detailed_health_probes_every_dependency() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let body: Value = client()
        .get(format!("{}/health/detailed", gateway.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    for service in ["runner", "task_store", "container_runtime"] {
        assert_eq!(body["services"][service]["status"], "healthy", "{service}");
        assert!(body["services"][service]["last_check"].is_string());
    }
    assert_eq!(body["config"]["runner_url"], runner.url);
    assert_eq!(body["config"]["server_host"], "127.0.0.1");

    let degraded = spawn_gateway(&runner.url, broken_docker()).await;
    let body: Value = client()
        .get(format!("{}/health/detailed", degraded.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["container_runtime"]["status"], "unhealthy");
    assert!(body["services"]["container_runtime"]["error"]
        .as_str()
        .unwrap()
        .contains("daemon"));
}

#[tokio::test]
async fn proxy_to_unreachable_runner_is_bad_gateway() {
    let gateway = spawn_gateway(&dead_runner_url(), working_docker()).await;

    let response = client()
        .get(format!("{}/anything/else", gateway.url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 502);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("error forwarding request: "));
}

#[tokio::test]
async fn proxy_relays_request_and_upstream_answer() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let response = client()
        .put(format!("{}/api/tasks/42/logs?tail=10", gateway.url))
        .header("content-type", "text/plain")
        .header("x-device-id", "spoofed-device")
        .header("x-creator-address", "0x0000000000000000000000000000000000000000")
        .header("x-request-id", "req-7")
        .body("hello runner")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 418);
    assert_eq!(response.headers()["x-runner"], "fake");
    assert_eq!(response.text().await.unwrap(), "proxied 12");

    let requests = runner.requests();
    assert_eq!(requests.len(), 1);
    let forwarded = &requests[0];
    assert_eq!(forwarded.method, reqwest::Method::PUT);
    assert_eq!(forwarded.uri, "/tasks/42/logs?tail=10");
    assert_eq!(forwarded.body_text(), "hello runner");
    assert_eq!(forwarded.header("x-device-id"), vec![DEVICE_ID]);
    assert_eq!(forwarded.header("x-creator-address"), vec![CREATOR_ADDRESS]);
    assert_eq!(forwarded.header("x-request-id"), vec!["req-7"]);
}

#[tokio::test]
async fn non_json_post_is_proxied_not_ingested() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let response = client()
        .post(format!("{}/api/tasks", gateway.url))
        .header("content-type", "text/plain")
        .body("not a task")
        .send()
        .await
        .unwrap();

    // The fake runner answers POST /tasks itself.
    assert_eq!(response.status(), 201);
    let requests = runner.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body_text(), "not a task");
}

async fn submit_image_task(gateway: &TestGateway) -> String {
    let response = client()
        .post(format!("{}/api/tasks", gateway.url))
        .json(&json!({
            "title": "train",
            "image": "ghcr.io/acme/trainer:1.2",
            "command": ["python", "train.py"],
            "env": {"EPOCHS": "3"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    let record: Value = response.json().await.unwrap();
    assert_eq!(record["image"], "ghcr.io/acme/trainer:1.2");
    record["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn image_task_is_packaged_and_uploaded() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let task_id = submit_image_task(&gateway).await;
    let status = wait_for_terminal(&client(), &gateway.url, &task_id).await;

    assert_eq!(status["state"], "uploaded", "{status}");
    assert_eq!(status["task_id"], task_id.as_str());
    assert!(status.get("error").is_none());
    assert!(gateway.images_dir_is_empty());

    let uploads = runner.uploads();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.header("x-device-id"), vec![DEVICE_ID]);
    assert_eq!(upload.header("x-creator-address"), vec![CREATOR_ADDRESS]);
    assert!(upload.header("content-type")[0].starts_with("multipart/form-data"));

    let body = upload.body_text();
    assert!(body.contains("name=\"task\""));
    assert!(body.contains(&task_id));
    assert!(body.contains("name=\"image\"; filename=\"ghcr.io_acme_trainer_1.2.tar\""));
    assert!(body.contains(FAKE_ARCHIVE_BYTES));
}

#[tokio::test]
async fn rejected_upload_is_recorded_as_failed() {
    let runner = spawn_runner(StatusCode::INTERNAL_SERVER_ERROR).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let task_id = submit_image_task(&gateway).await;
    let status = wait_for_terminal(&client(), &gateway.url, &task_id).await;

    assert_eq!(status["state"], "failed");
    let error = status["error"].as_str().unwrap();
    assert!(error.starts_with("upload failed: "), "{error}");
    assert!(error.contains("500"), "{error}");
    assert_eq!(runner.uploads().len(), 1);
    assert!(gateway.images_dir_is_empty());
}

#[tokio::test]
async fn packaging_failure_skips_upload() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, broken_docker()).await;

    let task_id = submit_image_task(&gateway).await;
    let status = wait_for_terminal(&client(), &gateway.url, &task_id).await;

    assert_eq!(status["state"], "failed");
    let error = status["error"].as_str().unwrap();
    assert!(error.starts_with("packaging failed: "), "{error}");
    assert!(runner.uploads().is_empty());
    assert!(gateway.images_dir_is_empty());
}

#[tokio::test]
async fn padded_fields_are_echoed_verbatim_and_image_still_uploads() {
    let runner = spawn_runner(StatusCode::CREATED).await;
    let gateway = spawn_gateway(&runner.url, working_docker()).await;

    let response = client()
        .post(format!("{}/api/tasks", gateway.url))
        .json(&json!({"title": "  ", "image": " alpine:3.19 "}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    let record: Value = response.json().await.unwrap();
    assert_eq!(record["title"], "  ");
    assert_eq!(record["image"], " alpine:3.19 ");

    let task_id = record["id"].as_str().unwrap();
    let status = wait_for_terminal(&client(), &gateway.url, task_id).await;
    assert_eq!(status["state"], "uploaded", "{status}");

    let uploads = runner.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0]
        .body_text()
        .contains("name=\"image\"; filename=\"alpine_3.19.tar\""));
}
