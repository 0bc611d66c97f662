//! Reusable roaming service runtime.
//!
//! Provides [`ServerHandle`], which builds the hub transport and dispatch
//! engine from an [`AppConfig`], starts the service for the configured
//! [`Role`] and handles graceful shutdown. The CLI binary is a thin wrapper
//! around it.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::application::{
    CpoRemoteHandler, DispatchEngine, EmpAuthorizationHandler, SharedDispatchEngine,
    UnattachedBackend,
};
use crate::config::{AppConfig, Role};
use crate::infrastructure::http::ReqwestTransport;
use crate::infrastructure::server::{ShutdownCoordinator, ShutdownSignal};
use crate::notifications::{create_event_bus, SharedEventBus};
use crate::services::{
    CpoClient, CpoRoamingService, EmpClient, EmpRoamingService, EndpointOptions,
};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the roaming service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Backend for hub remote commands (CPO role). Unattached when `None`.
    pub cpo_handler: Option<Arc<dyn CpoRemoteHandler>>,
    /// Backend for hub authorization requests (EMP role). Unattached when `None`.
    pub emp_handler: Option<Arc<dyn EmpAuthorizationHandler>>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            cpo_handler: None,
            emp_handler: None,
        }
    }
}

enum RoleService {
    Cpo(CpoRoamingService),
    Emp(EmpRoamingService),
}

impl RoleService {
    fn local_addr(&self) -> SocketAddr {
        match self {
            Self::Cpo(s) => s.local_addr(),
            Self::Emp(s) => s.local_addr(),
        }
    }

    fn is_running(&self) -> bool {
        match self {
            Self::Cpo(s) => s.is_running(),
            Self::Emp(s) => s.is_running(),
        }
    }

    async fn wait(self) {
        match self {
            Self::Cpo(s) => s.wait().await,
            Self::Emp(s) => s.wait().await,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running roaming service.
///
/// # Examples
///
/// ```rust,no_run
/// use oicp_roaming::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Dispatch lifecycle and inbound request events.
    pub event_bus: SharedEventBus,
    /// Engine shared by the role's client.
    pub engine: SharedDispatchEngine,
    /// The configuration the service was started with.
    pub config: AppConfig,

    service: RoleService,
    shutdown: ShutdownCoordinator,
}

impl ServerHandle {
    /// Start the service for `config.server.role`.
    ///
    /// This will:
    /// 1. Build the TLS transport to the hub
    /// 2. Create the dispatch engine and event bus
    /// 3. Start the inbound endpoint for the role
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        let role = config.server.role;

        info!(%role, hub = %config.hub.base_url, format = %config.hub.format, "Starting OICP roaming service");

        let transport = Arc::new(ReqwestTransport::new(config.hub.transport_config()?)?);

        let event_bus = create_event_bus();
        let engine: SharedDispatchEngine = Arc::new(
            DispatchEngine::new(transport, config.hub.format)
                .with_timeout(config.hub.timeout())
                .with_event_bus(event_bus.clone()),
        );

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let endpoint = EndpointOptions::new(config.server.address(), shutdown.signal())
            .with_event_bus(event_bus.clone());

        let service = match role {
            Role::Cpo => {
                let mut client = CpoClient::new(engine.clone(), config.identity.operator_id()?);
                if let Some(name) = &config.identity.operator_name {
                    client = client.with_operator_name(name.clone());
                }
                let handler = opts
                    .cpo_handler
                    .unwrap_or_else(|| Arc::new(UnattachedBackend));
                RoleService::Cpo(CpoRoamingService::start(client, handler, endpoint).await?)
            }
            Role::Emp => {
                let client = EmpClient::new(engine.clone(), config.identity.provider_id()?);
                let handler = opts
                    .emp_handler
                    .unwrap_or_else(|| Arc::new(UnattachedBackend));
                RoleService::Emp(EmpRoamingService::start(client, handler, endpoint).await?)
            }
        };

        info!(%role, address = %service.local_addr(), "Roaming service started");

        Ok(Self {
            event_bus,
            engine,
            config,
            service,
            shutdown,
        })
    }

    pub fn role(&self) -> Role {
        self.config.server.role
    }

    /// Address the inbound endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.service.local_addr()
    }

    /// The CPO client, when running as a CPO.
    pub fn cpo_client(&self) -> Option<Arc<CpoClient>> {
        match &self.service {
            RoleService::Cpo(s) => Some(s.client()),
            RoleService::Emp(_) => None,
        }
    }

    /// The EMP client, when running as an EMP.
    pub fn emp_client(&self) -> Option<Arc<EmpClient>> {
        match &self.service {
            RoleService::Emp(s) => Some(s.client()),
            RoleService::Cpo(_) => None,
        }
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for shutdown, then give the endpoint the configured time to
    /// drain in-flight requests.
    pub async fn wait(self) {
        let Self {
            service, shutdown, ..
        } = self;
        if shutdown.shutdown_with_cleanup(|| service.wait()).await {
            info!("OICP roaming service shutdown complete");
        }
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down OICP roaming service");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        self.service.is_running()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn local_config(role: Role) -> AppConfig {
        let mut config = AppConfig::default();
        config.hub.base_url = "http://127.0.0.1:1".to_string();
        config.server.role = role;
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.identity.operator_id = Some("DE*GEF".to_string());
        config.identity.provider_id = Some("DE-ICE".to_string());
        config
    }

    #[tokio::test]
    async fn cpo_handle_starts_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: local_config(Role::Cpo),
            ..ServerOptions::default()
        })
        .await
        .unwrap();

        assert_eq!(handle.role(), Role::Cpo);
        assert!(handle.cpo_client().is_some());
        assert!(handle.emp_client().is_none());
        assert_ne!(handle.local_addr().port(), 0);
        assert!(handle.is_running());

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn emp_handle_exposes_emp_client() {
        let handle = ServerHandle::start(ServerOptions {
            config: local_config(Role::Emp),
            ..ServerOptions::default()
        })
        .await
        .unwrap();

        let client = handle.emp_client().unwrap();
        assert_eq!(client.provider_id().to_string(), "DE-ICE");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn missing_identity_fails_start() {
        let mut config = local_config(Role::Cpo);
        config.identity.operator_id = None;

        let result = ServerHandle::start(ServerOptions {
            config,
            ..ServerOptions::default()
        })
        .await;

        let error = result.err().unwrap();
        assert!(error.to_string().contains("identity.operator_id"));
    }
}
