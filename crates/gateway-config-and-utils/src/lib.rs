//! Core configuration and utilities for the Parity gateway.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DockerConfig, RunnerConfig, ServerConfig, TimeoutConfig, DEFAULT_LOG_LEVEL,
    DEFAULT_RUNNER_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;

/// Crate version of the gateway build.
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source revision baked in at compile time, if the build provided one.
pub const BUILD_COMMIT: &str = match option_env!("PARITY_BUILD_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};
