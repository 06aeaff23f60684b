use std::process::ExitCode;

use mlflow_jupyterhub_auth::{config, lifecycle, observability};

#[tokio::main]
async fn main() -> ExitCode {
    observability::logging::init();

    // Refuse to start, before binding anything, without a token and a target.
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        target_origin = %config.target,
        hub_api_url = %config.hub_api_url,
        port = config.port,
        "Configuration loaded"
    );

    if let Err(e) = lifecycle::start(config).await {
        tracing::error!(error = %e, "Proxy exited with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
