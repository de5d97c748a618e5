// ABOUTME: HTTP server binary for the programme habit tracking service
// ABOUTME: Loads configuration, opens and migrates the store, serves routes until Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Habit Server Binary
//!
//! Serves the habit catalog, completion ledger and calendar views over HTTP.

use anyhow::Result;
use clap::Parser;
use habit_coach_server::{
    config::{environment::ServerConfig, DatabaseUrl},
    database::Database,
    logging,
    routes::{build_router, AppContext},
    services::HabitTrackingService,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "habit-server")]
#[command(about = "Programme habit tracking API")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url.as_deref() {
        config.database.url = DatabaseUrl::parse_url(url)?;
        if config.database.url.is_memory() {
            config.database.max_connections = 1;
        }
    }
    config.validate()?;

    logging::init_from_env()?;

    info!("Starting habit server");
    info!("{}", config.summary());

    let database = Database::connect(&config.database).await?;
    info!("Database ready: {}", config.database.url);

    let tracking = HabitTrackingService::new(Arc::new(database), config.habits.clone());
    let app = build_router(AppContext::new(tracking), config.request_timeout);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{address}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Habit server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
