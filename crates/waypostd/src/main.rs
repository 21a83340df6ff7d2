//! waypostd — the Waypost daemon.
//!
//! One binary, two server roles plus a few client commands:
//! - `discovery` — registry + health monitor + REST API
//! - `gateway` — resolve-and-forward front door
//! - `register` / `unregister` / `services` — talk to a running discovery service
//!
//! # Usage
//!
//! ```text
//! waypostd discovery --port 5000
//! waypostd gateway --port 8080 --discovery-url http://localhost:5000
//! waypostd register --name ApiCliente --url http://localhost:5001
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use waypost_core::WaypostConfig;
use waypost_discovery::DiscoveryService;
use waypost_gateway::{DiscoveryClient, Gateway, GatewayState, RouteTable, new_client};
use waypost_health::HealthMonitor;
use waypost_registry::Registry;

#[derive(Parser)]
#[command(name = "waypostd", about = "Waypost service discovery and gateway", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the discovery service (registry, health monitor, REST API).
    Discovery {
        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Path to waypost.toml.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the gateway.
    Gateway {
        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Discovery service base URL (overrides the config file).
        #[arg(long, env = "WAYPOST_DISCOVERY_URL")]
        discovery_url: Option<String>,

        /// Path to waypost.toml.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Register a service with a running discovery service.
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        url: String,

        #[command(flatten)]
        target: DiscoveryTarget,
    },
    /// Remove a service from a running discovery service.
    Unregister {
        #[arg(long)]
        name: String,

        #[command(flatten)]
        target: DiscoveryTarget,
    },
    /// List every registered service and its health.
    Services {
        #[command(flatten)]
        target: DiscoveryTarget,
    },
}

#[derive(Args)]
struct DiscoveryTarget {
    /// Discovery service base URL.
    #[arg(
        long,
        env = "WAYPOST_DISCOVERY_URL",
        default_value = "http://localhost:5000"
    )]
    discovery_url: String,
}

impl DiscoveryTarget {
    fn client(&self) -> DiscoveryClient {
        DiscoveryClient::new(
            &self.discovery_url,
            new_client(),
            waypost_gateway::DEFAULT_DISCOVERY_TIMEOUT,
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,waypostd=debug,waypost=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Discovery { port, config } => {
            let mut config = WaypostConfig::load(config.as_deref())?;
            if let Some(port) = port {
                config.discovery.port = port;
            }
            run_discovery(config).await
        }
        Command::Gateway {
            port,
            discovery_url,
            config,
        } => {
            let mut config = WaypostConfig::load(config.as_deref())?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(url) = discovery_url {
                config.gateway.discovery_url = url;
            }
            run_gateway(config).await
        }
        Command::Register { name, url, target } => {
            let message = target.client().register(&name, &url).await?;
            println!("{message}");
            Ok(())
        }
        Command::Unregister { name, target } => {
            let message = target.client().unregister(&name).await?;
            println!("{message}");
            Ok(())
        }
        Command::Services { target } => {
            let services = target.client().list().await?;
            println!("{}", serde_json::to_string_pretty(&services)?);
            Ok(())
        }
    }
}

async fn run_discovery(config: WaypostConfig) -> anyhow::Result<()> {
    let interval = config.discovery.health_interval()?;
    let timeout = config.discovery.probe_timeout()?;

    let registry = Registry::new();
    let monitor = HealthMonitor::new(registry.clone())
        .with_interval(interval)
        .with_probe_timeout(timeout);
    let service = DiscoveryService::new(registry, monitor);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.discovery.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "discovery service starting");

    service.serve(listener, shutdown_signal()).await?;
    Ok(())
}

async fn run_gateway(config: WaypostConfig) -> anyhow::Result<()> {
    let state = GatewayState::new(
        &config.gateway.discovery_url,
        config.gateway.discovery_timeout()?,
        config.gateway.upstream_timeout()?,
    );
    let routes = RouteTable::new(config.gateway.routes.clone());
    for (resource, service) in routes.iter() {
        info!(%resource, %service, "route");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.gateway.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway starting");

    Gateway::new(state, routes).serve(listener, shutdown_signal()).await?;
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "failed to listen for Ctrl-C, shutting down"),
    }
}
