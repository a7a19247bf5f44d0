// Copyright (c) 2026 Valyu Engineering. MIT License.
// See LICENSE for details.

//! # did:valyu Node
//!
//! Entry point for the `valyu-node` binary. Parses CLI arguments,
//! initializes logging, opens the identifier store, and either serves the
//! HTTP API or runs a one-shot command.
//!
//! - `run`        : serve the HTTP API and metrics
//! - `create-user`: create a user DID and print its document
//! - `create-data`: create a data DID and print its document
//! - `resolve`    : resolve a DID and print the resolution result
//! - `version`    : print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;

use valyu_did::identity::CreateOptions;
use valyu_did::manager::DidManager;
use valyu_did::storage::DidStore;

use cli::{Commands, StoreArgs, ValyuNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

const DEFAULT_LOG_LEVEL: &str = "valyu_node=info,valyu_did=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ValyuNodeCli::parse();
    logging::init_logging(DEFAULT_LOG_LEVEL, LogFormat::from_str_lossy(&cli.log_format));

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::CreateUser(args) => {
            let (manager, store) = open_manager(&args.store)?;
            let document = manager
                .create_user_did(&args.alias)
                .await
                .context("failed to create user DID")?;
            store.flush().context("failed to flush identifier store")?;
            print_json(&document)
        }
        Commands::CreateData(args) => {
            let (manager, store) = open_manager(&args.store)?;
            let options = CreateOptions::Data {
                data_token_address: args.data_token_address,
                chain_id: args.chain_id,
                access_endpoint: args.access_endpoint,
            };
            let document = manager
                .create_and_resolve(Some(&args.alias), options, None)
                .await
                .context("failed to create data DID")?;
            store.flush().context("failed to flush identifier store")?;
            print_json(&document)
        }
        Commands::Resolve(args) => {
            let (manager, _) = open_manager(&args.store)?;
            print_json(&manager.resolve_did(&args.did).await)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Open the store under `data_dir/db` and wire a manager over it.
fn open_manager(args: &StoreArgs) -> Result<(DidManager, DidStore)> {
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let store = DidStore::open(&db_path)
        .with_context(|| format!("failed to open identifier store at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "identifier store opened");

    let manager = DidManager::local_from_secret_hex(store.clone(), &args.kms_secret_key)
        .context("invalid KMS secret key (expected 32 bytes of hex)")?;
    Ok((manager, store))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

/// Serve the HTTP API and the metrics endpoint until shutdown.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.store.data_dir.display(),
        "starting valyu-node"
    );

    let (manager, store) = open_manager(&args.store)?;
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        manager: Arc::new(manager),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    store.flush().context("failed to flush identifier store")?;
    tracing::info!("valyu-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("valyu-node {}", env!("CARGO_PKG_VERSION"));
    println!("method     did:{}", valyu_did::config::DID_METHOD);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that signal is ignored and the other
/// one still triggers shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
