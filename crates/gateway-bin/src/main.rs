//! Parity Gateway - local gateway between task submitters and the remote runner.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gateway_bin::{app, commands};
use gateway_config_and_utils::{init_logging, Config, Paths};

/// Parity gateway command-line interface.
#[derive(Parser)]
#[command(name = "parity-gateway")]
#[command(about = "Local gateway for submitting tasks to a Parity runner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config, keystore, logs and the task store. Defaults to ~/.parity
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Start {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Import the operator's private key into the encrypted keystore
    Auth {
        /// secp256k1 private key as 64 hex characters, optionally 0x-prefixed
        #[arg(long, env = "PARITY_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// Query a running gateway's health endpoint
    Health {
        /// Use /health/detailed
        #[arg(long)]
        detailed: bool,
        /// Gateway base URL. Defaults to the configured listen address
        #[arg(long)]
        endpoint: Option<String>,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level, &paths);

    match cli.command {
        Some(Commands::Start { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            app::run_gateway(config, paths).await?;
        }
        None => {
            app::run_gateway(config, paths).await?;
        }
        Some(Commands::Auth { private_key }) => {
            commands::run_auth(&paths, &private_key)?;
        }
        Some(Commands::Health {
            detailed,
            endpoint,
            timeout,
        }) => {
            let endpoint =
                endpoint.unwrap_or_else(|| format!("http://{}", config.listen_addr()));
            commands::run_health(&endpoint, detailed, Duration::from_secs(timeout)).await?;
        }
    }

    Ok(())
}
