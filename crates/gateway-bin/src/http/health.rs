//! Local health responders. Only readiness and the detailed view touch
//! dependencies; the rest never leave the process.

use crate::app::GatewayState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use gateway_config_and_utils::GATEWAY_VERSION;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheck {
    Summary,
    Live,
    Ready,
    Detailed,
}

impl HealthCheck {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "health" => Some(Self::Summary),
            "health/live" => Some(Self::Live),
            "health/ready" => Some(Self::Ready),
            "health/detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
    uptime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<BTreeMap<&'static str, &'static str>>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub status: &'static str,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
}

impl ServiceInfo {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
struct DetailedHealthStatus {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
    uptime: String,
    services: BTreeMap<&'static str, ServiceInfo>,
    config: ConfigInfo,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    server_host: String,
    server_port: u16,
    runner_url: String,
}

pub async fn respond(state: &GatewayState, check: HealthCheck) -> Response {
    match check {
        HealthCheck::Summary => {
            let services = BTreeMap::from([("runner", "configured")]);
            Json(basic(state, "healthy", Some(services))).into_response()
        }
        HealthCheck::Live => Json(basic(state, "alive", None)).into_response(),
        HealthCheck::Ready => ready(state).await,
        HealthCheck::Detailed => detailed(state).await,
    }
}

fn basic(
    state: &GatewayState,
    status: &'static str,
    services: Option<BTreeMap<&'static str, &'static str>>,
) -> HealthStatus {
    HealthStatus {
        status,
        timestamp: Utc::now(),
        version: GATEWAY_VERSION,
        uptime: format_uptime(state.started_at.elapsed()),
        services,
    }
}

async fn ready(state: &GatewayState) -> Response {
    let (runner, store) = tokio::join!(check_runner(state), check_store(state));

    if runner.is_healthy() && store.is_healthy() {
        Json(basic(state, "ready", None)).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(basic(state, "not_ready", None)),
        )
            .into_response()
    }
}

async fn detailed(state: &GatewayState) -> Response {
    let (runner, store, runtime) = tokio::join!(
        check_runner(state),
        check_store(state),
        check_container_runtime(state)
    );

    let services = BTreeMap::from([
        ("runner", runner),
        ("task_store", store),
        ("container_runtime", runtime),
    ]);
    let status = if services.values().all(ServiceInfo::is_healthy) {
        "healthy"
    } else {
        "degraded"
    };

    Json(DetailedHealthStatus {
        status,
        timestamp: Utc::now(),
        version: GATEWAY_VERSION,
        uptime: format_uptime(state.started_at.elapsed()),
        services,
        config: ConfigInfo {
            server_host: state.config.server.host.clone(),
            server_port: state.config.server.port,
            runner_url: state.config.runner.server_url.clone(),
        },
    })
    .into_response()
}

async fn check_runner(state: &GatewayState) -> ServiceInfo {
    probe(state.runner.check_health()).await
}

async fn check_store(state: &GatewayState) -> ServiceInfo {
    probe(state.store.health_check()).await
}

async fn check_container_runtime(state: &GatewayState) -> ServiceInfo {
    probe(state.packager.runtime_version()).await
}

/// Run one dependency check and time it.
async fn probe<T, E, F>(check: F) -> ServiceInfo
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    let last_check = Utc::now();
    let started = Instant::now();
    match check.await {
        Ok(_) => ServiceInfo {
            status: "healthy",
            last_check,
            error: None,
            latency: Some(format!("{:?}", started.elapsed())),
        },
        Err(err) => ServiceInfo {
            status: "unhealthy",
            last_check,
            error: Some(err.to_string()),
            latency: None,
        },
    }
}

/// `1h2m3s` style, dropping leading zero units.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}
