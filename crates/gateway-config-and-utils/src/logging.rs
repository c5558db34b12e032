//! Logging initialization for the gateway.
//!
//! Thin wrapper over the `observability` package: JSONL lines go to
//! `~/.parity/logs/gateway.jsonl` and a compact copy goes to stderr.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for the gateway process.
///
/// `RUST_LOG` takes precedence over `level`. Setting `PARITY_LOG_FILE=0`
/// disables the JSONL file sink (stderr only).
pub fn init_logging(level: &str, paths: &Paths) {
    let file_enabled = std::env::var("PARITY_LOG_FILE")
        .map(|value| !matches!(value.trim(), "0" | "false" | "off"))
        .unwrap_or(true);

    observability::init_with_config(LogConfig {
        service_name: "gateway".into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path: file_enabled.then(|| paths.gateway_log_file()),
        also_stderr: true,
    });
}

/// Parse a log level string, defaulting to INFO for anything unrecognized.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
