//! # OICP roaming
//!
//! Client and server for the Open InterCharge Protocol: a charge point
//! operator (CPO) or e-mobility provider (EMP) exchanging EVSE data,
//! authorizations, charge detail records and remote commands with a
//! clearing hub, over SOAP or JSON.
//!
//! ## Architecture
//!
//! - **domain**: identifiers, EVSE projections, request and result messages
//! - **codec**: pure conversion between messages and the two wire dialects
//! - **application**: dispatch engine, status interpretation, status-diff
//!   publishing and the inbound handler ports
//! - **infrastructure**: the `reqwest` hub transport and the `axum` endpoints
//! - **services**: CPO and EMP clients and their role services
//! - **notifications**: broadcast of dispatch lifecycle and inbound events

pub mod application;
pub mod codec;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod server;
pub mod services;

#[cfg(test)]
mod test_support;

pub use config::{default_config_path, AppConfig, Role};

pub use application::{
    CallOptions, CpoRemoteHandler, DispatchEngine, DispatchOutcome, EmpAuthorizationHandler,
    OutcomeKind, StatusInterpreter,
};
pub use codec::WireFormat;
pub use services::{CpoClient, CpoRoamingService, EmpClient, EmpRoamingService};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
