//! OICP roaming service - CLI launcher
//!
//! Headless CPO or EMP roaming endpoint suitable for deployment as a
//! systemd service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/oicp-roaming/config.toml)
//! oicp-service
//!
//! # Custom config path, EMP role
//! oicp-service --config /etc/oicp/config.toml --role emp
//!
//! # Override the endpoint port
//! oicp-service --port 8443
//!
//! # Validate config without starting
//! oicp-service --check
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use oicp_roaming::config::{AppConfig, Role};
use oicp_roaming::server::{init_tracing, ServerHandle, ServerOptions};

/// OICP roaming service: CPO or EMP endpoint for a clearing hub.
#[derive(Parser, Debug)]
#[command(
    name = "oicp-service",
    version,
    about = "OICP e-mobility roaming service",
    long_about = "CPO or EMP side of the Open InterCharge Protocol: pushes EVSE data, \
                  exchanges authorizations and charge detail records with the hub, \
                  and serves the requests the hub sends back.\n\n\
                  Default config: ~/.config/oicp-roaming/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "OICP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the role (cpo, emp).
    #[arg(long)]
    role: Option<Role>,

    /// Override the endpoint listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the service.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(oicp_roaming::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // The log level override has to be applied before tracing starts
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(role) = cli.role {
        info!("CLI override: role = {}", role);
        config.server.role = role;
    }
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        let identity = match config.server.role {
            Role::Cpo => config.identity.operator_id().map(|id| id.to_string()),
            Role::Emp => config.identity.provider_id().map(|id| id.to_string()),
        };
        let identity = match identity {
            Ok(id) => id,
            Err(e) => {
                println!("Configuration is invalid: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = config.hub.transport_config() {
            println!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }

        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Role        : {} ({})", config.server.role, identity);
        println!("   Hub         : {} [{}]", config.hub.base_url, config.hub.format);
        println!("   Endpoint    : {}", config.server.address());
        println!("   Log level   : {}", config.logging.level);
        if config.metrics.enabled {
            println!("   Metrics     : {}", config.metrics.listen);
        }
        return Ok(());
    }

    // ── Prometheus exporter ────────────────────────────────────
    if config.metrics.enabled {
        match config.metrics.listen.parse::<SocketAddr>() {
            Ok(addr) => {
                match metrics_exporter_prometheus::PrometheusBuilder::new()
                    .with_http_listener(addr)
                    .install()
                {
                    Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
                    Err(e) => warn!("Cannot install Prometheus exporter: {}", e),
                }
            }
            Err(e) => warn!("Invalid metrics.listen '{}': {}", config.metrics.listen, e),
        }
    }

    // ── Start service ──────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        ..ServerOptions::default()
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    // Wait for shutdown signal, then clean up
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
