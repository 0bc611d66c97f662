//! Notification events
//!
//! Lifecycle of every dispatched hub call, plus inbound hub requests served
//! by the endpoints. External loggers subscribe to these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A call entered the dispatch engine
    RequestIssued(RequestIssuedEvent),
    /// The serialized request was handed to the transport
    WireRequestSent(WireRequestSentEvent),
    /// The transport returned, with or without a response
    WireResponseReceived(WireResponseReceivedEvent),
    /// The typed result was returned to the caller
    ResponseDelivered(ResponseDeliveredEvent),
    /// The hub called one of our endpoints
    InboundRequest(InboundRequestEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RequestIssued(_) => "request_issued",
            Event::WireRequestSent(_) => "wire_request_sent",
            Event::WireResponseReceived(_) => "wire_response_received",
            Event::ResponseDelivered(_) => "response_delivered",
            Event::InboundRequest(_) => "inbound_request",
        }
    }

    /// Per-call id; inbound requests have none.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Event::RequestIssued(e) => Some(&e.request_id),
            Event::WireRequestSent(e) => Some(&e.request_id),
            Event::WireResponseReceived(e) => Some(&e.request_id),
            Event::ResponseDelivered(e) => Some(&e.request_id),
            Event::InboundRequest(_) => None,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            Event::RequestIssued(e) => &e.operation,
            Event::WireRequestSent(e) => &e.operation,
            Event::WireResponseReceived(e) => &e.operation,
            Event::ResponseDelivered(e) => &e.operation,
            Event::InboundRequest(e) => &e.operation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestIssuedEvent {
    pub request_id: String,
    pub operation: String,
    pub format: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequestSentEvent {
    pub request_id: String,
    pub operation: String,
    pub path: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResponseReceivedEvent {
    pub request_id: String,
    pub operation: String,
    /// None when the transport failed before a response arrived
    pub http_status: Option<u16>,
    pub body: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDeliveredEvent {
    pub request_id: String,
    pub operation: String,
    /// success, protocol_fault, transport_fault or system_error
    pub outcome: String,
    pub status_code: u16,
    pub description: Option<String>,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundRequestEvent {
    pub operation: String,
    pub format: String,
    pub status_code: u16,
    pub decoded: bool,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
