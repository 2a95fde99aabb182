//! Segmentation worker binary.

use std::fs;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tseg_worker::{pipeline, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tseg=info,info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting tseg-worker");

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid worker configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("Worker config: {:?}", config);

    let metrics_handle = match &config.metrics_path {
        Some(_) => match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        },
        None => None,
    };

    // Decoding and detection are CPU-bound
    let run_config = config.clone();
    let result = tokio::task::spawn_blocking(move || pipeline::run(&run_config)).await;

    if let (Some(handle), Some(path)) = (&metrics_handle, &config.metrics_path) {
        dump_metrics(handle, path);
    }

    match result {
        Ok(Ok(document)) => {
            info!(
                run_id = %document.run_id,
                chapters = document.chapters.len(),
                "Worker finished"
            );
        }
        Ok(Err(e)) => {
            error!("Segmentation failed: {:#}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Segmentation task panicked: {}", e);
            std::process::exit(1);
        }
    }
}

fn dump_metrics(handle: &PrometheusHandle, path: &std::path::Path) {
    if let Err(e) = fs::write(path, handle.render()) {
        warn!("Failed to write metrics to {}: {}", path.display(), e);
    }
}
