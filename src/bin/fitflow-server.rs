// ABOUTME: FitFlow server binary entry point
// ABOUTME: Parses CLI flags, loads configuration, and runs the HTTP server
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

#![allow(clippy::print_stdout)]

use anyhow::Result;
use clap::Parser;
use fitflow_server::auth::AuthManager;
use fitflow_server::billing::gateway::StripeClient;
use fitflow_server::config::ServerConfig;
use fitflow_server::database::Database;
use fitflow_server::llm::OpenAiCompatibleProvider;
use fitflow_server::logging;
use fitflow_server::resources::ServerResources;
use fitflow_server::server;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "fitflow-server",
    about = "FitFlow fitness coaching platform backend",
    version
)]
struct Args {
    /// Override the HTTP listen port from the environment
    #[arg(long)]
    port: Option<u16>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    if args.check_config {
        println!("{}", config.summary());
        return Ok(());
    }

    info!("Starting FitFlow server: {}", config.summary());

    let database = Database::new(&config.database.url).await?;
    let auth_manager = AuthManager::new(
        config.auth.jwt_secret.clone().into_bytes(),
        i64::try_from(config.auth.jwt_expiry_hours)?,
    );
    let billing = Arc::new(StripeClient::from_config(&config.billing));
    let chat = Arc::new(OpenAiCompatibleProvider::from_config(&config.llm));

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        billing,
        chat,
        config,
    ));

    server::serve(resources).await
}
