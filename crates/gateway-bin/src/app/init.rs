//! Gateway initialization.

use crate::app::GatewayState;
use crate::http;
use device_identity_crypto::resolve_identity;
use gateway_config_and_utils::{Config, Paths, BUILD_COMMIT, GATEWAY_VERSION};
use gateway_database::TaskStatusStore;
use gateway_storage::create_secrets_manager;
use std::future::Future;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Run the gateway until Ctrl-C.
pub async fn run_gateway(config: Config, paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        version = GATEWAY_VERSION,
        commit = BUILD_COMMIT,
        "Starting Parity gateway"
    );
    info!(
        runner_url = %config.runner.server_url,
        listen = %config.listen_addr(),
        api_prefix = %config.api_prefix(),
        "Configuration loaded"
    );

    paths.ensure_dirs()?;

    // Fail fast: without an identity nothing can be forwarded.
    let secrets = create_secrets_manager(&paths)?;
    let identity = resolve_identity(&secrets)?;

    let store = TaskStatusStore::open(&paths.task_database_file())
        .await
        .map_err(|e| format!("Failed to open task status store: {e}"))?;
    info!(path = %paths.task_database_file().display(), "Task status store initialized");

    // Uploads in flight when the last process stopped can no longer finish.
    store.fail_interrupted().await?;
    remove_stale_archives(&paths.images_work_dir());

    let addr = config.listen_addr();
    let state = GatewayState::new(config, identity, store, paths.images_work_dir())?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    info!(addr = %listener.local_addr()?, "Gateway listening");

    serve(listener, state, shutdown_signal()).await?;

    info!("Gateway stopped");
    Ok(())
}

/// Serve the gateway on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

/// Remove per-upload directories left behind by a process that was killed
/// mid-upload.
fn remove_stale_archives(images_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(images_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_upload_dir = path.is_dir()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("image-"));
        if !is_upload_dir {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => debug!(dir = %path.display(), "Removed stale image archive"),
            Err(err) => warn!(error = %err, dir = %path.display(), "Failed to remove stale image archive"),
        }
    }
}
