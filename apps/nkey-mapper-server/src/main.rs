//! `NKey` mapper server.
//!
//! Serves the mapper's REST endpoints for the Kerberos and AWS IAM backends
//! configured in the YAML file and environment.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod app;
mod config;
mod observability;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Maps Kerberos and AWS IAM identities to broker `NKey` credentials.
#[derive(Parser)]
#[command(name = "nkey-mapper-server", version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        cfg.bind_addr = bind;
    }
    observability::init(&cfg.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %cfg.bind_addr,
        kerberos = cfg.kerberos.is_some(),
        aws_iam = cfg.aws_iam.is_some(),
        "starting nkey mapper"
    );
    let router = app::build_router(&cfg)?;

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", cfg.bind_addr))?;
    info!(addr = %listener.local_addr()?, "nkey mapper listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    info!("nkey mapper stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, shutting down");
    }
}
