//! CPO side: the client that talks to the hub and the service that also
//! serves the hub's remote commands.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use super::{log_wire_event, AuthorizationReply, EndpointOptions};
use crate::application::{
    retry_with_backoff, CallOptions, CpoRemoteHandler, DispatchOutcome, ListenerId, RetryConfig,
    SharedDispatchEngine, StatusDiffPublisher, StatusDiffReport, StatusInterpreter,
};
use crate::codec::{validate_evse_data_record, SkippedRecord};
use crate::domain::{
    Acknowledgement, ActionType, AuthorizeStartRequest, AuthorizeStopRequest, ChargeDetailRecord,
    EvseDataRecord, EvseId, EvseStatusDiff, EvseStatusRecord, OperatorId, PushEvseDataRequest,
    PushEvseStatusRequest,
};
use crate::infrastructure::server::{cpo_router, Endpoint, ServerError, ShutdownSignal};

/// Outcome of an EVSE data push plus the records left out of it.
#[derive(Debug, Clone)]
pub struct DataPushReport {
    /// `None` when every record was left out and nothing was sent.
    pub outcome: Option<DispatchOutcome<Acknowledgement>>,
    pub skipped: Vec<SkippedRecord>,
}

impl DataPushReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
            && self
                .outcome
                .as_ref()
                .is_some_and(|o| !o.is_fault() && o.result().is_success())
    }
}

/// Everything a CPO sends to the hub.
pub struct CpoClient {
    engine: SharedDispatchEngine,
    operator_id: OperatorId,
    operator_name: Option<String>,
    interpreter: StatusInterpreter,
    publisher: StatusDiffPublisher,
    push_retry: Option<RetryConfig>,
}

impl CpoClient {
    pub fn new(engine: SharedDispatchEngine, operator_id: OperatorId) -> Self {
        Self {
            publisher: StatusDiffPublisher::new(engine.clone(), operator_id.clone()),
            engine,
            operator_id,
            operator_name: None,
            interpreter: StatusInterpreter::default(),
            push_retry: None,
        }
    }

    pub fn with_operator_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.publisher = StatusDiffPublisher::new(self.engine.clone(), self.operator_id.clone())
            .with_operator_name(name.clone());
        self.operator_name = Some(name);
        self
    }

    pub fn with_interpreter(mut self, interpreter: StatusInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Resend EVSE data and status pushes after transport faults.
    pub fn with_push_retry(mut self, config: RetryConfig) -> Self {
        self.push_retry = Some(config);
        self
    }

    pub fn operator_id(&self) -> &OperatorId {
        &self.operator_id
    }

    pub fn engine(&self) -> &SharedDispatchEngine {
        &self.engine
    }

    /// Push EVSE data records. Records that cannot be published are left
    /// out and reported; the rest still go out.
    pub async fn push_evse_data(
        &self,
        action: ActionType,
        records: Vec<EvseDataRecord>,
        options: CallOptions,
    ) -> DataPushReport {
        let total = records.len();
        let mut skipped = Vec::new();
        let publishable: Vec<EvseDataRecord> = records
            .into_iter()
            .filter(|record| match validate_evse_data_record(record) {
                Ok(()) => true,
                Err(reason) => {
                    warn!(evse_id = %record.evse_id, %reason, "Leaving EVSE out of data push");
                    skipped.push(SkippedRecord {
                        evse_id: record.evse_id.clone(),
                        reason,
                    });
                    false
                }
            })
            .collect();

        if total > 0 && publishable.is_empty() {
            warn!(
                operator_id = %self.operator_id,
                skipped = skipped.len(),
                "No publishable EVSE data records, push not sent"
            );
            return DataPushReport {
                outcome: None,
                skipped,
            };
        }

        let mut request = PushEvseDataRequest::new(action, self.operator_id.clone(), publishable);
        request.operator_name = self.operator_name.clone();

        let outcome = match &self.push_retry {
            Some(config) => {
                retry_with_backoff(
                    config.clone(),
                    || self.engine.dispatch(request.clone(), options.clone()),
                    crate::application::is_transient,
                    "push_evse_data",
                )
                .await
            }
            None => self.engine.dispatch(request, options).await,
        };

        DataPushReport {
            outcome: Some(outcome),
            skipped,
        }
    }

    pub async fn push_evse_status(
        &self,
        action: ActionType,
        records: Vec<EvseStatusRecord>,
        options: CallOptions,
    ) -> DispatchOutcome<Acknowledgement> {
        let mut request = PushEvseStatusRequest::new(action, self.operator_id.clone(), records);
        request.operator_name = self.operator_name.clone();

        match &self.push_retry {
            Some(config) => {
                retry_with_backoff(
                    config.clone(),
                    || self.engine.dispatch(request.clone(), options.clone()),
                    crate::application::is_transient,
                    "push_evse_status",
                )
                .await
            }
            None => self.engine.dispatch(request, options).await,
        }
    }

    pub async fn authorize_start(
        &self,
        request: AuthorizeStartRequest,
        options: CallOptions,
    ) -> AuthorizationReply<crate::domain::AuthorizationStart> {
        let outcome = self.engine.dispatch(request, options).await;
        let decision = self.interpreter.interpret_start(outcome.result());
        AuthorizationReply { outcome, decision }
    }

    pub async fn authorize_stop(
        &self,
        request: AuthorizeStopRequest,
        options: CallOptions,
    ) -> AuthorizationReply<crate::domain::AuthorizationStop> {
        let outcome = self.engine.dispatch(request, options).await;
        let decision = self.interpreter.interpret_stop(outcome.result());
        AuthorizationReply { outcome, decision }
    }

    pub async fn send_charge_detail_record(
        &self,
        record: ChargeDetailRecord,
        options: CallOptions,
    ) -> DispatchOutcome<Acknowledgement> {
        self.engine.dispatch(record, options).await
    }

    pub async fn publish_status_diff(
        &self,
        diff: &EvseStatusDiff,
        invalid_ids: &HashSet<EvseId>,
        options: CallOptions,
    ) -> StatusDiffReport {
        self.publisher.publish(diff, invalid_ids, options).await
    }
}

/// CPO client plus the endpoint serving the hub's remote commands.
pub struct CpoRoamingService {
    client: Arc<CpoClient>,
    endpoint: Endpoint,
    shutdown: ShutdownSignal,
    wire_listener: ListenerId,
}

impl CpoRoamingService {
    pub async fn start(
        client: CpoClient,
        handler: Arc<dyn CpoRemoteHandler>,
        options: EndpointOptions,
    ) -> Result<Self, ServerError> {
        let router = cpo_router(handler, options.event_bus);
        let endpoint = Endpoint::serve(&options.address, router, options.shutdown.clone()).await?;
        let wire_listener = client.engine.add_listener(log_wire_event);

        info!(
            operator_id = %client.operator_id,
            address = %endpoint.local_addr(),
            "CPO roaming service started"
        );

        Ok(Self {
            client: Arc::new(client),
            endpoint,
            shutdown: options.shutdown,
            wire_listener,
        })
    }

    pub fn client(&self) -> Arc<CpoClient> {
        self.client.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn is_running(&self) -> bool {
        !self.endpoint.is_finished()
    }

    /// Wait until the shutdown signal stops the endpoint.
    pub async fn wait(self) {
        self.endpoint.join().await;
        self.client.engine.remove_listener(self.wire_listener);
        info!("CPO roaming service stopped");
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.wait().await;
    }
}
