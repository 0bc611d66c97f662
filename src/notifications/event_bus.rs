//! Hub traffic feed
//!
//! The dispatch engine and the inbound endpoints publish every event here.
//! Each subscriber chooses which calls it follows with an [`EventFilter`]:
//! all traffic, one or more operations, or the lifecycle of one request id.
//! Subscribers that fall behind lose the oldest events and can tell how
//! many they missed.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use super::events::{Event, EventMessage};
use crate::codec::Operation;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// Which events a subscriber receives.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    operations: Option<HashSet<&'static str>>,
    request_id: Option<String>,
}

impl EventFilter {
    /// Every event, outbound and inbound.
    pub fn all() -> Self {
        Self::default()
    }

    /// Events of the given operations only. Repeatable.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations
            .get_or_insert_with(HashSet::new)
            .insert(operation.as_str());
        self
    }

    /// The lifecycle of one dispatched call. Inbound events never match.
    pub fn request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(operations) = &self.operations {
            if !operations.contains(event.operation()) {
                return false;
            }
        }
        match &self.request_id {
            Some(id) => event.request_id() == Some(id.as_str()),
            None => true,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many subscribers the event reached.
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        trace!(
            event_type = message.event.event_type(),
            operation = message.event.operation(),
            request_id = ?message.event.request_id(),
            "Hub traffic event"
        );
        // Err only means nobody is listening
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            filter,
            missed: 0,
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Filtered view of the bus.
pub struct EventStream {
    receiver: broadcast::Receiver<EventMessage>,
    filter: EventFilter,
    missed: u64,
}

impl EventStream {
    /// Next matching event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.filter.matches(&message.event) => return Some(message),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.missed += count;
                    warn!(missed = count, "Hub traffic subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Skip ahead to the next call result handed back to a caller.
    pub async fn recv_delivered(&mut self) -> Option<EventMessage> {
        loop {
            let message = self.recv().await?;
            if matches!(message.event, Event::ResponseDelivered(_)) {
                return Some(message);
            }
        }
    }

    /// Events dropped because this subscriber fell behind.
    pub fn missed(&self) -> u64 {
        self.missed
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{CallOptions, DispatchEngine};
    use crate::codec::{soap, HubResponse, WireFormat};
    use crate::domain::{Acknowledgement, AuthorizationStart, StatusCode};
    use crate::notifications::events::InboundRequestEvent;
    use crate::test_support::*;
    use chrono::Utc;
    use std::time::Duration;

    fn engine(bus: &SharedEventBus, body: String) -> DispatchEngine {
        DispatchEngine::new(ScriptedTransport::replying(200, body), WireFormat::Soap)
            .with_event_bus(bus.clone())
    }

    fn inbound() -> Event {
        Event::InboundRequest(InboundRequestEvent {
            operation: Operation::AuthorizeRemoteStart.to_string(),
            format: "soap".into(),
            status_code: 0,
            decoded: true,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn operation_filter_follows_only_that_operation() {
        let bus = create_event_bus();
        let mut authorizations = bus.subscribe(EventFilter::all().operation(Operation::AuthorizeStart));
        let ack = soap::common::build_acknowledgement(Operation::PushEvseStatus, &Acknowledgement::success()).body;

        engine(&bus, ack)
            .dispatch(push_evse_status(), CallOptions::default())
            .await;
        let start = AuthorizationStart::synthesize(StatusCode::new(0, "Success"), Default::default());
        let body = soap::authorization::build_authorization_start(&start).body;
        engine(&bus, body)
            .dispatch(authorize_start(), CallOptions::default())
            .await;

        let first = authorizations.recv().await.unwrap();
        assert_eq!(first.event.event_type(), "request_issued");
        assert_eq!(first.event.operation(), "AuthorizeStart");

        let delivered = authorizations.recv_delivered().await.unwrap();
        assert_eq!(delivered.event.operation(), "AuthorizeStart");
        assert_eq!(authorizations.missed(), 0);
    }

    #[tokio::test]
    async fn request_filter_yields_one_call_lifecycle() {
        let bus = create_event_bus();
        let mut call = bus.subscribe(EventFilter::all().request("push-7"));
        let engine = engine(&bus, "garbage".to_string());

        engine
            .dispatch(push_evse_status(), CallOptions::default().with_request_id("push-6"))
            .await;
        engine
            .dispatch(push_evse_status(), CallOptions::default().with_request_id("push-7"))
            .await;
        bus.publish(inbound());

        let mut types = Vec::new();
        for _ in 0..4 {
            let message = call.recv().await.unwrap();
            assert_eq!(message.event.request_id(), Some("push-7"));
            types.push(message.event.event_type());
        }
        assert_eq!(
            types,
            vec![
                "request_issued",
                "wire_request_sent",
                "wire_response_received",
                "response_delivered"
            ]
        );
        assert!(tokio::time::timeout(Duration::from_millis(50), call.recv())
            .await
            .is_err());
    }

    #[test]
    fn request_filter_never_matches_inbound_events() {
        assert!(EventFilter::all().matches(&inbound()));
        assert!(!EventFilter::all().request("r-1").matches(&inbound()));
        assert!(EventFilter::all()
            .operation(Operation::AuthorizeRemoteStart)
            .matches(&inbound()));
    }

    #[tokio::test]
    async fn lagging_subscriber_counts_missed_events() {
        let bus = EventBus::with_capacity(2);
        let mut stream = bus.subscribe(EventFilter::all());
        for _ in 0..5 {
            bus.publish(inbound());
        }

        assert!(stream.recv().await.is_some());
        assert_eq!(stream.missed(), 3);
    }

    #[test]
    fn publish_reports_reach() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(inbound()), 0);
        let _stream = bus.subscribe(EventFilter::all());
        assert_eq!(bus.receiver_count(), 1);
        assert_eq!(bus.publish(inbound()), 1);
    }
}
