//! Dispatch engine: sends one typed request to the hub and always answers
//! with a typed result.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::hooks::Hooks;
use super::listeners::{DispatchListener, ListenerId, ListenerRegistry};
use super::outcome::{DispatchOutcome, OutcomeKind};
use crate::codec::{self, HubRequest, HubResponse, Operation, WireFormat};
use crate::domain::{Correlation, StatusCode};
use crate::infrastructure::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::notifications::{
    Event, RequestIssuedEvent, ResponseDeliveredEvent, SharedEventBus, WireRequestSentEvent,
    WireResponseReceivedEvent,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call settings.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the engine default.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    /// Generated when absent.
    pub request_id: Option<String>,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Record dispatch latency and outcome to Prometheus.
fn record_dispatch(operation: &'static str, outcome: &'static str, start: Instant) {
    let duration = start.elapsed().as_secs_f64();
    metrics::histogram!("oicp_request_duration_seconds", "operation" => operation).record(duration);
    metrics::counter!("oicp_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn cancelled(token: Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// What came back from the wire, before classification.
enum Exchange {
    Response(HttpResponse),
    Failed(TransportError),
    Panicked(String),
}

/// Shared by every client of one hub connection; calls may run
/// concurrently and hold no lock across network I/O.
pub struct DispatchEngine {
    transport: Arc<dyn HttpTransport>,
    format: WireFormat,
    default_timeout: Duration,
    listeners: ListenerRegistry,
    event_bus: Option<SharedEventBus>,
}

impl DispatchEngine {
    pub fn new(transport: Arc<dyn HttpTransport>, format: WireFormat) -> Self {
        Self {
            transport,
            format,
            default_timeout: DEFAULT_TIMEOUT,
            listeners: ListenerRegistry::new(),
            event_bus: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Mirror lifecycle events to a broadcast bus.
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn add_listener(&self, listener: impl DispatchListener + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub async fn dispatch<R: HubRequest>(
        &self,
        request: R,
        options: CallOptions,
    ) -> DispatchOutcome<R::Response> {
        self.dispatch_with(request, options, &Hooks::identity()).await
    }

    pub async fn dispatch_with<R: HubRequest>(
        &self,
        request: R,
        options: CallOptions,
        hooks: &Hooks<R>,
    ) -> DispatchOutcome<R::Response> {
        let operation = R::OPERATION;
        let request_id = options
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let start = Instant::now();
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        info!(%request_id, %operation, format = %self.format, "Dispatching hub request");
        self.emit(Event::RequestIssued(RequestIssuedEvent {
            request_id: request_id.clone(),
            operation: operation.to_string(),
            format: self.format.to_string(),
            timestamp: Utc::now(),
        }));

        let fallback = request.correlation();
        let built = catch_unwind(AssertUnwindSafe(|| {
            let request = hooks.rewrite_request(request);
            (request.encode(self.format), request.correlation())
        }));
        let (envelope, correlation) = match built {
            Ok(built) => built,
            Err(payload) => {
                let message = panic_message(payload);
                let outcome = system_error::<R::Response>(&message, fallback);
                return self.deliver(&request_id, operation, outcome, start);
            }
        };

        self.emit(Event::WireRequestSent(WireRequestSentEvent {
            request_id: request_id.clone(),
            operation: operation.to_string(),
            path: envelope.path.clone(),
            body: envelope.body.clone(),
            timestamp: Utc::now(),
        }));

        let http_request = HttpRequest {
            path: envelope.path,
            content_type: envelope.content_type,
            soap_action: envelope.soap_action,
            body: envelope.body,
            timeout,
        };
        let exchange = self.exchange(http_request, timeout, options.cancel).await;

        let (http_status, body, error) = match &exchange {
            Exchange::Response(r) => (Some(r.status), Some(r.body.clone()), None),
            Exchange::Failed(e) => (None, None, Some(e.to_string())),
            Exchange::Panicked(m) => (None, None, Some(m.clone())),
        };
        self.emit(Event::WireResponseReceived(WireResponseReceivedEvent {
            request_id: request_id.clone(),
            operation: operation.to_string(),
            http_status,
            body,
            error,
            elapsed_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        }));

        let outcome = match exchange {
            Exchange::Response(response) => {
                match classify::<R>(self.format, &response, correlation.clone()) {
                    DispatchOutcome::Success(result) => {
                        match catch_unwind(AssertUnwindSafe(|| hooks.rewrite_response(result))) {
                            Ok(result) => DispatchOutcome::Success(result),
                            Err(payload) => {
                                system_error::<R::Response>(&panic_message(payload), correlation)
                            }
                        }
                    }
                    fault => fault,
                }
            }
            Exchange::Failed(error) => transport_fault::<R::Response>(error.to_string(), correlation),
            Exchange::Panicked(message) => system_error::<R::Response>(&message, correlation),
        };

        self.deliver(&request_id, operation, outcome, start)
    }

    async fn exchange(
        &self,
        request: HttpRequest,
        timeout: Duration,
        cancel: Option<CancellationToken>,
    ) -> Exchange {
        let send = AssertUnwindSafe(self.transport.post(request)).catch_unwind();

        tokio::select! {
            biased;
            _ = cancelled(cancel) => Exchange::Failed(TransportError::Cancelled),
            sent = tokio::time::timeout(timeout, send) => match sent {
                Err(_) => Exchange::Failed(TransportError::Timeout(timeout)),
                Ok(Err(payload)) => Exchange::Panicked(panic_message(payload)),
                Ok(Ok(Err(error))) => Exchange::Failed(error),
                Ok(Ok(Ok(response))) => Exchange::Response(response),
            },
        }
    }

    fn deliver<T: HubResponse>(
        &self,
        request_id: &str,
        operation: Operation,
        outcome: DispatchOutcome<T>,
        start: Instant,
    ) -> DispatchOutcome<T> {
        let kind = outcome.kind();
        let status = outcome.status_code();
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match kind {
            OutcomeKind::Success => {
                debug!(%request_id, %operation, code = status.code, elapsed_ms, "Hub request completed")
            }
            _ => warn!(
                %request_id,
                %operation,
                outcome = kind.as_str(),
                code = status.code,
                description = status.description.as_deref().unwrap_or(""),
                elapsed_ms,
                "Hub request failed"
            ),
        }

        self.emit(Event::ResponseDelivered(ResponseDeliveredEvent {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
            outcome: kind.as_str().to_string(),
            status_code: status.code,
            description: status.description.clone(),
            elapsed_ms,
            timestamp: Utc::now(),
        }));
        record_dispatch(operation.as_str(), kind.as_str(), start);

        outcome
    }

    fn emit(&self, event: Event) {
        self.listeners.notify(&event);
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

/// Turn an HTTP answer into an outcome.
///
/// A fault envelope wins at any status. 2xx and 4xx bodies are decoded;
/// an undecodable 2xx is a protocol fault, anything else without a result
/// is a transport fault.
pub(crate) fn classify<R: HubRequest>(
    format: WireFormat,
    response: &HttpResponse,
    correlation: Correlation,
) -> DispatchOutcome<R::Response> {
    let operation = R::OPERATION;

    if let Some(fault) = codec::detect_fault(format, operation, &response.body) {
        return protocol_fault::<R::Response>(&response.body, fault.reason, correlation);
    }

    if response.is_success() || response.is_client_error() {
        match R::decode(format, &response.body) {
            Ok(result) => return DispatchOutcome::Success(result),
            Err(error) if response.is_success() => {
                return protocol_fault::<R::Response>(&error.raw_body, error.reason, correlation);
            }
            Err(_) => {}
        }
    }

    transport_fault::<R::Response>(
        format!("HTTP {}: {}", response.status, response.body),
        correlation,
    )
}

fn protocol_fault<T: HubResponse>(
    raw_body: &str,
    reason: String,
    correlation: Correlation,
) -> DispatchOutcome<T> {
    let status = StatusCode::new(StatusCode::DATA_ERROR, raw_body).with_additional_info(reason);
    DispatchOutcome::ProtocolFault(T::synthesize(status, correlation))
}

fn transport_fault<T: HubResponse>(description: String, correlation: Correlation) -> DispatchOutcome<T> {
    let status = StatusCode::new(StatusCode::SERVICE_NOT_AVAILABLE, description);
    DispatchOutcome::TransportFault(T::synthesize(status, correlation))
}

fn system_error<T: HubResponse>(message: &str, correlation: Correlation) -> DispatchOutcome<T> {
    let status = StatusCode::new(StatusCode::SYSTEM_ERROR, message);
    DispatchOutcome::SystemError(T::synthesize(status, correlation))
}
