use std::time::Duration;
use tracing::{error, info};

/// Health endpoint URL for a gateway at `endpoint`.
pub fn health_url(endpoint: &str, detailed: bool) -> String {
    let base = endpoint.trim_end_matches('/');
    if detailed {
        format!("{base}/health/detailed")
    } else {
        format!("{base}/health")
    }
}

/// `parity-gateway health`: query a running gateway and print its report.
/// Any non-200 answer is an error, so the process exits non-zero.
pub async fn run_health(
    endpoint: &str,
    detailed: bool,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(endpoint, detailed);
    info!(url = %url, "Checking gateway health");

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(&url).send().await.map_err(|e| {
        error!(error = %e, "Failed to reach health endpoint");
        format!("Health check failed: {e}")
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(status = status.as_u16(), "Health check returned non-OK status");
        return Err(format!("Health check failed with status: {}", status.as_u16()).into());
    }

    let report: serde_json::Value = response.json().await?;
    println!("Health check successful");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
