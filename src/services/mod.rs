//! Roaming services
//!
//! Thin composition per role: a hub client built on one
//! [`DispatchEngine`](crate::application::DispatchEngine), the inbound
//! endpoint for the requests the hub sends to that role, and a shared
//! shutdown signal. No protocol logic lives here.

pub mod cpo;
pub mod emp;

pub use cpo::{CpoClient, CpoRoamingService, DataPushReport};
pub use emp::{EmpClient, EmpRoamingService};

use tracing::debug;

use crate::application::{AuthorizationDecision, DispatchOutcome};
use crate::infrastructure::server::ShutdownSignal;
use crate::notifications::{Event, SharedEventBus};

/// Raw hub result together with its interpretation.
#[derive(Debug, Clone)]
pub struct AuthorizationReply<T> {
    pub outcome: DispatchOutcome<T>,
    pub decision: AuthorizationDecision,
}

impl<T> AuthorizationReply<T> {
    pub fn is_authorized(&self) -> bool {
        self.decision.is_authorized()
    }
}

/// Where the inbound endpoint listens and whom it reports to.
#[derive(Clone)]
pub struct EndpointOptions {
    pub address: String,
    pub event_bus: Option<SharedEventBus>,
    pub shutdown: ShutdownSignal,
}

impl EndpointOptions {
    pub fn new(address: impl Into<String>, shutdown: ShutdownSignal) -> Self {
        Self {
            address: address.into(),
            event_bus: None,
            shutdown,
        }
    }

    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }
}

/// Wire bodies at `debug`, the rest of the lifecycle is logged by the engine.
pub(crate) fn log_wire_event(event: &Event) {
    match event {
        Event::WireRequestSent(e) => {
            debug!(request_id = %e.request_id, operation = %e.operation, path = %e.path, body = %e.body, "Hub request body");
        }
        Event::WireResponseReceived(e) => {
            debug!(
                request_id = %e.request_id,
                operation = %e.operation,
                http_status = ?e.http_status,
                body = ?e.body,
                error = ?e.error,
                elapsed_ms = e.elapsed_ms,
                "Hub response body"
            );
        }
        _ => {}
    }
}
