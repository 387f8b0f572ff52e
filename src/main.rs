use std::sync::Arc;

use log::info;

mod cache;
mod config;
mod deployment;
mod error;
mod notify;
mod quote;
mod relay;
mod retry;

use config::RelayConfig;
use deployment::{DeploymentMode, detect_deployment_mode};
use relay::RelayService;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    info!("Starting quote relay...");

    let relay_config = RelayConfig::from_env();
    if let Err(e) = relay_config.validate() {
        // Still serve: every request answers with a structured 500 until fixed
        log::warn!("incomplete configuration: {e}");
    }

    let service = match RelayService::from_config(relay_config) {
        Ok(service) => Arc::new(service),
        Err(e) => panic!("Failed to initialize relay service: {e}"),
    };

    let deployment_mode = detect_deployment_mode();
    info!("🚀 Deployment detection: {deployment_mode}");

    let result = match deployment_mode {
        DeploymentMode::Lambda => {
            #[cfg(feature = "lambda")]
            {
                deployment::run_lambda_mode(service).await
            }
            #[cfg(not(feature = "lambda"))]
            {
                panic!("Lambda environment detected but lambda feature not enabled. Compile with --features lambda");
            }
        }
        DeploymentMode::Server => {
            #[cfg(feature = "axum-server")]
            {
                deployment::run_server_mode(service).await
            }
            #[cfg(not(feature = "axum-server"))]
            {
                panic!("Server environment detected but axum-server feature not enabled. Compile with --features axum-server");
            }
        }
    };

    if let Err(e) = result {
        panic!("Quote relay failed to start: {e}");
    }
}
