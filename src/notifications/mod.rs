//! Notifications module
//!
//! Broadcasts dispatch lifecycle events and inbound hub requests to any
//! number of external subscribers (loggers, audit trails, dashboards).
//!
//! # Usage
//! ```ignore
//! use oicp_roaming::notifications::{create_event_bus, EventFilter};
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe(EventFilter::all());
//! tokio::spawn(async move {
//!     while let Some(message) = subscriber.recv().await {
//!         tracing::info!(event = message.event.event_type(), "hub traffic");
//!     }
//! });
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventFilter, EventStream, SharedEventBus};
pub use events::*;
