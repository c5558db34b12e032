//! # Observability
//!
//! Structured logging for the Parity gateway.
//!
//! Crates only ever use `tracing` macros. The binary calls
//! [`init_with_config`] once at startup, which installs:
//!
//! - a JSONL file sink (one object per line, flushed per line) so
//!   `tail -f ~/.parity/logs/gateway.jsonl | jq` works while the gateway runs
//! - an optional compact stderr layer for foreground use
//!
//! Both layers honour `RUST_LOG`, falling back to the configured level.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "gateway".into(),
//!     default_level: "debug".into(),
//!     log_path: Some(paths.gateway_log_file()),
//!     also_stderr: true,
//! });
//! tracing::info!("gateway started");
//! ```

mod json_layer;
mod sink;

use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use sink::{LineFlushedWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, written into every JSON line.
    pub service_name: String,

    /// Default filter when `RUST_LOG` is unset (e.g. "info", "debug").
    pub default_level: String,

    /// JSONL output file. `None` disables the file sink.
    pub log_path: Option<PathBuf>,

    /// Also emit human-readable logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Install the global subscriber.
///
/// A log file that cannot be opened is reported on stderr and skipped; the
/// gateway keeps running with whatever layers remain. Calling this twice is a
/// no-op for the second call.
pub fn init_with_config(config: LogConfig) {
    let file_layer = config.log_path.as_ref().and_then(|path| {
        match LineFlushedWriter::open(path) {
            Ok(writer) => Some(
                JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
                    .with_filter(env_filter(&config.default_level)),
            ),
            Err(err) => {
                eprintln!("failed to open log file {}: {}", path.display(), err);
                None
            }
        }
    });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            service = %config.service_name,
            log_path = ?config.log_path,
            "observability initialized"
        );
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};
