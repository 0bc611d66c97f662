//! EMP side: remote commands to the hub, authorization served to the hub.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use super::{log_wire_event, EndpointOptions};
use crate::application::{
    CallOptions, DispatchOutcome, EmpAuthorizationHandler, ListenerId, SharedDispatchEngine,
};
use crate::domain::{
    Acknowledgement, AuthorizeRemoteReservationStartRequest, AuthorizeRemoteReservationStopRequest,
    AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest, EvseId, Identification, ProviderId,
    SessionId,
};
use crate::infrastructure::server::{emp_router, Endpoint, ServerError, ShutdownSignal};

/// Everything an EMP sends to the hub.
pub struct EmpClient {
    engine: SharedDispatchEngine,
    provider_id: ProviderId,
}

impl EmpClient {
    pub fn new(engine: SharedDispatchEngine, provider_id: ProviderId) -> Self {
        Self {
            engine,
            provider_id,
        }
    }

    pub fn provider_id(&self) -> &ProviderId {
        &self.provider_id
    }

    pub fn engine(&self) -> &SharedDispatchEngine {
        &self.engine
    }

    /// Remote start request on behalf of this provider.
    pub fn remote_start_request(
        &self,
        evse_id: EvseId,
        identification: Identification,
    ) -> AuthorizeRemoteStartRequest {
        AuthorizeRemoteStartRequest::new(self.provider_id.clone(), evse_id, identification)
    }

    /// Remote stop request on behalf of this provider.
    pub fn remote_stop_request(
        &self,
        session_id: SessionId,
        evse_id: EvseId,
    ) -> AuthorizeRemoteStopRequest {
        AuthorizeRemoteStopRequest::new(session_id, self.provider_id.clone(), evse_id)
    }

    pub async fn remote_start(
        &self,
        request: AuthorizeRemoteStartRequest,
        options: CallOptions,
    ) -> DispatchOutcome<Acknowledgement> {
        self.engine.dispatch(request, options).await
    }

    pub async fn remote_stop(
        &self,
        request: AuthorizeRemoteStopRequest,
        options: CallOptions,
    ) -> DispatchOutcome<Acknowledgement> {
        self.engine.dispatch(request, options).await
    }

    pub async fn reservation_start(
        &self,
        request: AuthorizeRemoteReservationStartRequest,
        options: CallOptions,
    ) -> DispatchOutcome<Acknowledgement> {
        self.engine.dispatch(request, options).await
    }

    pub async fn reservation_stop(
        &self,
        request: AuthorizeRemoteReservationStopRequest,
        options: CallOptions,
    ) -> DispatchOutcome<Acknowledgement> {
        self.engine.dispatch(request, options).await
    }
}

/// EMP client plus the endpoint answering the hub's authorization requests.
pub struct EmpRoamingService {
    client: Arc<EmpClient>,
    endpoint: Endpoint,
    shutdown: ShutdownSignal,
    wire_listener: ListenerId,
}

impl EmpRoamingService {
    pub async fn start(
        client: EmpClient,
        handler: Arc<dyn EmpAuthorizationHandler>,
        options: EndpointOptions,
    ) -> Result<Self, ServerError> {
        let router = emp_router(handler, options.event_bus);
        let endpoint = Endpoint::serve(&options.address, router, options.shutdown.clone()).await?;
        let wire_listener = client.engine.add_listener(log_wire_event);

        info!(
            provider_id = %client.provider_id,
            address = %endpoint.local_addr(),
            "EMP roaming service started"
        );

        Ok(Self {
            client: Arc::new(client),
            endpoint,
            shutdown: options.shutdown,
            wire_listener,
        })
    }

    pub fn client(&self) -> Arc<EmpClient> {
        self.client.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn is_running(&self) -> bool {
        !self.endpoint.is_finished()
    }

    pub async fn wait(self) {
        self.endpoint.join().await;
        self.client.engine.remove_listener(self.wire_listener);
        info!("EMP roaming service stopped");
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.wait().await;
    }
}
