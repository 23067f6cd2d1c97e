// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server bootstrap
//!
//! Handles:
//! - Base directory creation (once, before the first request)
//! - Optional sample provisioning at startup
//! - Request timeout and graceful shutdown

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use pathguard_core::application::file_access::FileAccessService;
use pathguard_core::domain::config::PathguardConfig;
use pathguard_core::infrastructure::storage::LocalSandboxStore;
use pathguard_core::presentation::api;

/// Build the shared file service from configuration.
///
/// The store is constructed exactly once; every route receives it through
/// the service handle.
pub fn build_service(config: &PathguardConfig) -> Result<Arc<FileAccessService>> {
    let store = LocalSandboxStore::from_config(&config.spec.storage).with_context(|| {
        format!(
            "Failed to open sandbox at {}",
            config.spec.storage.base_dir.display()
        )
    })?;

    Ok(Arc::new(FileAccessService::new(Arc::new(store))))
}

pub async fn start_server(config: PathguardConfig, seed: bool) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let service = build_service(&config)?;
    info!(base = %service.base(), "Sandbox ready");

    if seed {
        service
            .provision_samples()
            .await
            .context("Failed to provision sample files")?;
    }

    let timeout = Duration::from_secs(config.spec.network.request_timeout_secs);
    let app = api::app(service).layer(TimeoutLayer::new(timeout));

    let addr = format!("{}:{}", config.spec.network.host, config.spec.network.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
