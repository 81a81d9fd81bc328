// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use hedera_bridge::config::BridgeNodeConfig;
use hedera_bridge::node::run_bridge_node;
use hedera_bridge::server::run_metrics_server;
use hedera_bridge_config::Config;
use prometheus::Registry;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = env!("CARGO_BIN_NAME"))]
#[clap(version)]
struct Args {
    #[clap(long)]
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BridgeNodeConfig::load(&args.config_path)?;
    let cancel = CancellationToken::new();

    let metrics_address =
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), config.metrics_port);
    let registry = Registry::new();
    let metrics_server = run_metrics_server(metrics_address, registry.clone(), cancel.clone());
    info!("Metrics server started at port {}", config.metrics_port);

    let node = run_bridge_node(config, &registry, cancel.clone()).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    cancel.cancel();
    node.shutdown().await;
    metrics_server
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
}
