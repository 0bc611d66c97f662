//! Inbound hub endpoint: routers, listener and shutdown

pub mod endpoint;
pub mod metrics;
mod shutdown;

pub use endpoint::{cpo_router, emp_router, Endpoint, ServerError};
pub use metrics::http_metrics_middleware;
pub use shutdown::{listen_for_shutdown_signals, ShutdownCoordinator, ShutdownSignal};
