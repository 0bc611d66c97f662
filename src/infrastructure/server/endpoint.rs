//! Inbound hub endpoints
//!
//! The hub calls a CPO for remote start/stop and reservations, and an EMP
//! for authorization and charge detail records. Both dialects are served:
//! SOAP on the fixed `/ibis/ws/...` service paths, JSON on the `/api/oicp/...`
//! paths with the addressed party as the `{party}` segment. The answer goes
//! back in the dialect the request arrived in.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode as HttpStatus},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::application::ports::{CpoRemoteHandler, EmpAuthorizationHandler};
use crate::codec::soap::remote::RemoteCommand;
use crate::codec::{json, soap, DecodeError, DecodeResult, Operation, WireEnvelope, WireFormat};
use crate::domain::{Acknowledgement, StatusCode};
use crate::notifications::{Event, InboundRequestEvent, SharedEventBus};

use super::metrics::http_metrics_middleware;
use super::shutdown::ShutdownSignal;

const SOAP_CLIENT_FAULT: &str = "soapenv:Client";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Cannot bind endpoint to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Endpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reporting shared by both endpoints.
#[derive(Clone, Default)]
struct Inbound {
    event_bus: Option<SharedEventBus>,
}

impl Inbound {
    fn record(&self, operation: &str, format: WireFormat, status: &StatusCode, decoded: bool) {
        info!(
            operation,
            format = %format,
            status_code = status.code,
            decoded,
            "Inbound hub request"
        );
        if let Some(bus) = &self.event_bus {
            bus.publish(Event::InboundRequest(InboundRequestEvent {
                operation: operation.to_string(),
                format: format.to_string(),
                status_code: status.code,
                decoded,
                timestamp: Utc::now(),
            }));
        }
    }

    fn answer(&self, envelope: WireEnvelope, status: &StatusCode) -> Response {
        self.record(envelope.operation.as_str(), envelope.format, status, true);
        (
            [(header::CONTENT_TYPE, envelope.content_type)],
            envelope.body,
        )
            .into_response()
    }

    fn reject_soap(&self, operation: Option<Operation>, reason: &str) -> Response {
        warn!(reason, "Rejecting SOAP request");
        let status = data_error(reason);
        self.record(
            operation.map(|op| op.as_str()).unwrap_or("unknown"),
            WireFormat::Soap,
            &status,
            false,
        );
        (
            HttpStatus::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, WireFormat::Soap.content_type())],
            soap::build_fault(SOAP_CLIENT_FAULT, reason),
        )
            .into_response()
    }

    fn reject_json(&self, error: &DecodeError) -> Response {
        warn!(operation = %error.operation, reason = %error.reason, "Rejecting JSON request");
        let status = data_error(&error.reason);
        self.record(error.operation.as_str(), WireFormat::Json, &status, false);
        (
            HttpStatus::BAD_REQUEST,
            [(header::CONTENT_TYPE, WireFormat::Json.content_type())],
            json::build_error(&status),
        )
            .into_response()
    }

    /// Decode, hand to the backend and answer with an acknowledgement.
    async fn json_ack<R, F, Fut>(
        &self,
        operation: Operation,
        party: &str,
        body: &str,
        parse: fn(&str) -> DecodeResult<R>,
        handle: F,
    ) -> Response
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Acknowledgement>,
    {
        match parse(body) {
            Ok(request) => {
                let ack = handle(request).await;
                let envelope =
                    json::build_acknowledgement(operation, &operation.json_path(party), &ack);
                self.answer(envelope, &ack.status_code)
            }
            Err(e) => self.reject_json(&e),
        }
    }
}

fn data_error(reason: &str) -> StatusCode {
    StatusCode::new(StatusCode::DATA_ERROR, "Data error").with_additional_info(reason)
}

/// `SOAPAction` header first, else the local name of the body payload.
fn soap_operation(headers: &HeaderMap, body: &str) -> Option<Operation> {
    headers
        .get("SOAPAction")
        .and_then(|value| value.to_str().ok())
        .and_then(Operation::from_soap_action)
        .or_else(|| {
            soap::remote::payload_name(body).and_then(|name| Operation::from_soap_action(&name))
        })
}

fn json_route(operation: Operation) -> String {
    operation.json_path("{party}")
}

fn with_layers(router: Router) -> Router {
    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

// ── CPO endpoint ───────────────────────────────────────────────────

#[derive(Clone)]
struct CpoEndpointState {
    handler: Arc<dyn CpoRemoteHandler>,
    inbound: Inbound,
}

/// Routes the hub uses to reach a CPO.
pub fn cpo_router(
    handler: Arc<dyn CpoRemoteHandler>,
    event_bus: Option<SharedEventBus>,
) -> Router {
    let state = CpoEndpointState {
        handler,
        inbound: Inbound { event_bus },
    };

    let router = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok", "role": "cpo" })) }))
        .route(Operation::AuthorizeRemoteStart.soap_path(), post(cpo_soap))
        .route(
            Operation::AuthorizeRemoteReservationStart.soap_path(),
            post(cpo_soap),
        )
        .route(&json_route(Operation::AuthorizeRemoteStart), post(remote_start_json))
        .route(&json_route(Operation::AuthorizeRemoteStop), post(remote_stop_json))
        .route(
            &json_route(Operation::AuthorizeRemoteReservationStart),
            post(reservation_start_json),
        )
        .route(
            &json_route(Operation::AuthorizeRemoteReservationStop),
            post(reservation_stop_json),
        )
        .with_state(state);

    with_layers(router)
}

async fn cpo_soap(State(state): State<CpoEndpointState>, body: String) -> Response {
    let command = match soap::remote::parse_remote_command(&body) {
        Ok(command) => command,
        Err(e) => {
            let operation = soap::remote::payload_name(&body)
                .and_then(|name| Operation::from_soap_action(&name));
            return state.inbound.reject_soap(operation, &e.to_string());
        }
    };

    let operation = command.operation();
    debug!(%operation, "Dispatching remote command to backend");
    let ack = match command {
        RemoteCommand::Start(request) => state.handler.remote_start(request).await,
        RemoteCommand::Stop(request) => state.handler.remote_stop(request).await,
        RemoteCommand::ReservationStart(request) => {
            state.handler.reservation_start(request).await
        }
        RemoteCommand::ReservationStop(request) => state.handler.reservation_stop(request).await,
    };

    let envelope = soap::common::build_acknowledgement(operation, &ack);
    state.inbound.answer(envelope, &ack.status_code)
}

async fn remote_start_json(
    State(state): State<CpoEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    state
        .inbound
        .json_ack(
            Operation::AuthorizeRemoteStart,
            &party,
            &body,
            json::parse_remote_start_request,
            |request| state.handler.remote_start(request),
        )
        .await
}

async fn remote_stop_json(
    State(state): State<CpoEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    state
        .inbound
        .json_ack(
            Operation::AuthorizeRemoteStop,
            &party,
            &body,
            json::parse_remote_stop_request,
            |request| state.handler.remote_stop(request),
        )
        .await
}

async fn reservation_start_json(
    State(state): State<CpoEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    state
        .inbound
        .json_ack(
            Operation::AuthorizeRemoteReservationStart,
            &party,
            &body,
            json::parse_reservation_start_request,
            |request| state.handler.reservation_start(request),
        )
        .await
}

async fn reservation_stop_json(
    State(state): State<CpoEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    state
        .inbound
        .json_ack(
            Operation::AuthorizeRemoteReservationStop,
            &party,
            &body,
            json::parse_reservation_stop_request,
            |request| state.handler.reservation_stop(request),
        )
        .await
}

// ── EMP endpoint ───────────────────────────────────────────────────

#[derive(Clone)]
struct EmpEndpointState {
    handler: Arc<dyn EmpAuthorizationHandler>,
    inbound: Inbound,
}

/// Routes the hub uses to reach an EMP.
pub fn emp_router(
    handler: Arc<dyn EmpAuthorizationHandler>,
    event_bus: Option<SharedEventBus>,
) -> Router {
    let state = EmpEndpointState {
        handler,
        inbound: Inbound { event_bus },
    };

    let router = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok", "role": "emp" })) }))
        .route(Operation::AuthorizeStart.soap_path(), post(emp_soap))
        .route(&json_route(Operation::AuthorizeStart), post(authorize_start_json))
        .route(&json_route(Operation::AuthorizeStop), post(authorize_stop_json))
        .route(
            &json_route(Operation::SendChargeDetailRecord),
            post(charge_detail_record_json),
        )
        .with_state(state);

    with_layers(router)
}

async fn emp_soap(
    State(state): State<EmpEndpointState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let inbound = &state.inbound;
    let operation = soap_operation(&headers, &body);

    match operation {
        Some(Operation::AuthorizeStart) => {
            match soap::authorization::parse_authorize_start_request(&body) {
                Ok(request) => {
                    let result = state.handler.authorize_start(request).await;
                    inbound.answer(
                        soap::authorization::build_authorization_start(&result),
                        &result.status_code,
                    )
                }
                Err(e) => inbound.reject_soap(operation, &e.to_string()),
            }
        }
        Some(Operation::AuthorizeStop) => {
            match soap::authorization::parse_authorize_stop_request(&body) {
                Ok(request) => {
                    let result = state.handler.authorize_stop(request).await;
                    inbound.answer(
                        soap::authorization::build_authorization_stop(&result),
                        &result.status_code,
                    )
                }
                Err(e) => inbound.reject_soap(operation, &e.to_string()),
            }
        }
        Some(Operation::SendChargeDetailRecord) => {
            match soap::cdr::parse_charge_detail_record(&body) {
                Ok(record) => {
                    let ack = state.handler.charge_detail_record(record).await;
                    inbound.answer(
                        soap::common::build_acknowledgement(Operation::SendChargeDetailRecord, &ack),
                        &ack.status_code,
                    )
                }
                Err(e) => inbound.reject_soap(operation, &e.to_string()),
            }
        }
        Some(other) => inbound.reject_soap(
            Some(other),
            &format!("{} is not served by this endpoint", other),
        ),
        None => inbound.reject_soap(None, "unrecognised SOAP request"),
    }
}

async fn authorize_start_json(
    State(state): State<EmpEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    match json::parse_authorize_start_request(&body) {
        Ok(request) => {
            let result = state.handler.authorize_start(request).await;
            let path = Operation::AuthorizeStart.json_path(&party);
            state.inbound.answer(
                json::build_authorization_start(&path, &result),
                &result.status_code,
            )
        }
        Err(e) => state.inbound.reject_json(&e),
    }
}

async fn authorize_stop_json(
    State(state): State<EmpEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    match json::parse_authorize_stop_request(&body) {
        Ok(request) => {
            let result = state.handler.authorize_stop(request).await;
            let path = Operation::AuthorizeStop.json_path(&party);
            state.inbound.answer(
                json::build_authorization_stop(&path, &result),
                &result.status_code,
            )
        }
        Err(e) => state.inbound.reject_json(&e),
    }
}

async fn charge_detail_record_json(
    State(state): State<EmpEndpointState>,
    Path(party): Path<String>,
    body: String,
) -> Response {
    state
        .inbound
        .json_ack(
            Operation::SendChargeDetailRecord,
            &party,
            &body,
            json::parse_charge_detail_record,
            |record| state.handler.charge_detail_record(record),
        )
        .await
}

// ── Serving ────────────────────────────────────────────────────────

/// A running endpoint listener.
pub struct Endpoint {
    local_addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl Endpoint {
    /// Bind `address` and serve `router` until `shutdown` fires.
    pub async fn serve(
        address: &str,
        router: Router,
        shutdown: ShutdownSignal,
    ) -> Result<Self, ServerError> {
        let listener =
            tokio::net::TcpListener::bind(address)
                .await
                .map_err(|source| ServerError::Bind {
                    address: address.to_string(),
                    source,
                })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "Hub endpoint listening");

        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            shutdown.wait().await;
            info!("Hub endpoint received shutdown signal");
        });

        let task = tokio::spawn(async move {
            if let Err(e) = server.await {
                error!(error = %e, "Hub endpoint stopped with error");
            }
        });

        Ok(Self { local_addr, task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the listener task to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "Hub endpoint task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::UnattachedBackend;
    use crate::codec::HubRequest;
    use crate::domain::{
        AuthorizationOutcome, AuthorizationStart, AuthorizationStop, AuthorizeRemoteReservationStartRequest,
        AuthorizeRemoteReservationStopRequest, AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest,
        AuthorizeStartRequest, AuthorizeStopRequest, ChargeDetailRecord,
    };
    use crate::notifications::{create_event_bus, EventFilter};
    use crate::test_support::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn note(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl CpoRemoteHandler for RecordingBackend {
        async fn remote_start(&self, request: AuthorizeRemoteStartRequest) -> Acknowledgement {
            self.note("remote_start");
            Acknowledgement::success().with_correlation(request.correlation())
        }

        async fn remote_stop(&self, request: AuthorizeRemoteStopRequest) -> Acknowledgement {
            self.note("remote_stop");
            Acknowledgement::success().with_correlation(request.correlation())
        }

        async fn reservation_start(
            &self,
            _request: AuthorizeRemoteReservationStartRequest,
        ) -> Acknowledgement {
            self.note("reservation_start");
            Acknowledgement::success()
        }

        async fn reservation_stop(
            &self,
            _request: AuthorizeRemoteReservationStopRequest,
        ) -> Acknowledgement {
            self.note("reservation_stop");
            Acknowledgement::success()
        }
    }

    #[async_trait]
    impl EmpAuthorizationHandler for RecordingBackend {
        async fn authorize_start(&self, request: AuthorizeStartRequest) -> AuthorizationStart {
            self.note("authorize_start");
            let mut result =
                AuthorizationStart::new(AuthorizationOutcome::Authorized, StatusCode::success());
            result.session_id = request.session_id;
            result
        }

        async fn authorize_stop(&self, request: AuthorizeStopRequest) -> AuthorizationStop {
            self.note("authorize_stop");
            let mut result =
                AuthorizationStop::new(AuthorizationOutcome::Authorized, StatusCode::success());
            result.session_id = Some(request.session_id);
            result
        }

        async fn charge_detail_record(&self, _record: ChargeDetailRecord) -> Acknowledgement {
            self.note("charge_detail_record");
            Acknowledgement::success()
        }
    }

    fn soap_post(path: &str, action: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, WireFormat::Soap.content_type());
        if let Some(action) = action {
            builder = builder.header("SOAPAction", format!("\"{}\"", action));
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn json_post(path: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (HttpStatus, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn cpo_soap_routes_every_remote_command() {
        let backend = Arc::new(RecordingBackend::default());
        let router = cpo_router(backend.clone(), None);

        let bodies = [
            remote_start().encode(WireFormat::Soap),
            remote_stop().encode(WireFormat::Soap),
            reservation_start().encode(WireFormat::Soap),
            reservation_stop().encode(WireFormat::Soap),
        ];
        for envelope in bodies {
            let (status, body) = send(
                router.clone(),
                soap_post(&envelope.path, envelope.soap_action, envelope.body),
            )
            .await;
            assert_eq!(status, HttpStatus::OK);
            let ack = soap::common::parse_acknowledgement(envelope.operation, &body).unwrap();
            assert!(ack.is_success());
        }

        assert_eq!(
            backend.calls(),
            vec!["remote_start", "remote_stop", "reservation_start", "reservation_stop"]
        );
    }

    #[tokio::test]
    async fn undecodable_soap_gets_a_fault() {
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe(EventFilter::all());
        let backend = Arc::new(RecordingBackend::default());
        let router = cpo_router(backend.clone(), Some(bus));

        let (status, body) = send(
            router,
            soap_post(
                Operation::AuthorizeRemoteStart.soap_path(),
                Some("eRoamingAuthorizeRemoteStart"),
                "<not-a-soap-envelope".to_string(),
            ),
        )
        .await;

        assert_eq!(status, HttpStatus::INTERNAL_SERVER_ERROR);
        assert!(soap::detect_fault(&body).is_some());
        assert!(backend.calls().is_empty());

        let message = subscriber.recv().await.unwrap();
        match message.event {
            Event::InboundRequest(event) => {
                assert!(!event.decoded);
                assert_eq!(event.status_code, StatusCode::DATA_ERROR);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn cpo_json_remote_stop_echoes_session() {
        let backend = Arc::new(RecordingBackend::default());
        let router = cpo_router(backend.clone(), None);
        let request = remote_stop();
        let session = request.session_id.clone();
        let envelope = request.encode(WireFormat::Json);

        let (status, body) = send(router, json_post(&envelope.path, envelope.body)).await;

        assert_eq!(status, HttpStatus::OK);
        let ack = json::parse_acknowledgement(Operation::AuthorizeRemoteStop, &body).unwrap();
        assert!(ack.is_success());
        assert_eq!(ack.session_id, Some(session));
        assert_eq!(backend.calls(), vec!["remote_stop"]);
    }

    #[tokio::test]
    async fn malformed_json_is_a_data_error() {
        let router = cpo_router(Arc::new(RecordingBackend::default()), None);
        let path = Operation::AuthorizeRemoteStart.json_path("DE*ICE");

        let (status, body) = send(router, json_post(&path, "{\"EvseID\": 7".to_string())).await;

        assert_eq!(status, HttpStatus::BAD_REQUEST);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["StatusCode"]["Code"], "022");
    }

    #[tokio::test]
    async fn emp_soap_answers_authorization_and_cdr() {
        let backend = Arc::new(RecordingBackend::default());
        let router = emp_router(backend.clone(), None);

        let start = authorize_start().encode(WireFormat::Soap);
        let (status, body) = send(
            router.clone(),
            soap_post(&start.path, start.soap_action, start.body),
        )
        .await;
        assert_eq!(status, HttpStatus::OK);
        let result =
            soap::authorization::parse_authorization_start(Operation::AuthorizeStart, &body)
                .unwrap();
        assert_eq!(result.authorization_status.as_deref(), Some("Authorized"));

        let stop = authorize_stop().encode(WireFormat::Soap);
        let (status, _) = send(
            router.clone(),
            soap_post(&stop.path, stop.soap_action, stop.body),
        )
        .await;
        assert_eq!(status, HttpStatus::OK);

        // No SOAPAction header: routed by payload
        let cdr = charge_detail_record().encode(WireFormat::Soap);
        let (status, body) = send(router, soap_post(&cdr.path, None, cdr.body)).await;
        assert_eq!(status, HttpStatus::OK);
        let ack =
            soap::common::parse_acknowledgement(Operation::SendChargeDetailRecord, &body).unwrap();
        assert!(ack.result);

        assert_eq!(
            backend.calls(),
            vec!["authorize_start", "authorize_stop", "charge_detail_record"]
        );
    }

    #[tokio::test]
    async fn emp_rejects_operations_it_does_not_serve() {
        let backend = Arc::new(RecordingBackend::default());
        let router = emp_router(backend.clone(), None);
        let envelope = push_evse_status().encode(WireFormat::Soap);

        let (status, body) = send(
            router,
            soap_post(
                Operation::AuthorizeStart.soap_path(),
                envelope.soap_action,
                envelope.body,
            ),
        )
        .await;

        assert_eq!(status, HttpStatus::INTERNAL_SERVER_ERROR);
        assert!(body.contains("not served"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn emp_json_authorize_start_without_backend() {
        let router = emp_router(Arc::new(UnattachedBackend), None);
        let envelope = authorize_start().encode(WireFormat::Json);

        let (status, body) = send(router, json_post(&envelope.path, envelope.body)).await;

        assert_eq!(status, HttpStatus::OK);
        let result = json::parse_authorization_start(Operation::AuthorizeStart, &body).unwrap();
        assert_eq!(result.authorization_status.as_deref(), Some("NotAuthorized"));
        assert_eq!(result.status_code.code, StatusCode::SERVICE_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_role() {
        let router = emp_router(Arc::new(UnattachedBackend), None);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(body.contains("\"emp\""));
    }

    #[tokio::test]
    async fn endpoint_stops_on_shutdown() {
        let shutdown = ShutdownSignal::new();
        let endpoint = Endpoint::serve(
            "127.0.0.1:0",
            cpo_router(Arc::new(UnattachedBackend), None),
            shutdown.clone(),
        )
        .await
        .unwrap();
        assert_ne!(endpoint.local_addr().port(), 0);

        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(5), endpoint.join())
            .await
            .unwrap();
    }
}
