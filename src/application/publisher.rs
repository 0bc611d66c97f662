//! Status-diff publisher
//!
//! Pushes an [`EvseStatusDiff`] as up to three independent status pushes:
//! new EVSEs with `insert`, changed EVSEs with `update`, removed EVSEs with
//! `delete` and status `OutOfService`. The phases run concurrently and each
//! reports its own outcome; a failing phase neither blocks nor rolls back
//! the others. Nothing is retried.

use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use super::dispatch::{CallOptions, DispatchOutcome, SharedDispatchEngine};
use crate::domain::{
    Acknowledgement, ActionType, EvseId, EvseStatus, EvseStatusDiff, EvseStatusRecord, OperatorId,
    PushEvseStatusRequest,
};

/// Per-phase outcome; `None` when the phase had nothing to publish.
#[derive(Debug, Clone, Default)]
pub struct StatusDiffReport {
    pub new: Option<DispatchOutcome<Acknowledgement>>,
    pub changed: Option<DispatchOutcome<Acknowledgement>>,
    pub removed: Option<DispatchOutcome<Acknowledgement>>,
    /// Ids left out because they were listed as invalid.
    pub filtered: Vec<EvseId>,
}

impl StatusDiffReport {
    pub fn phases(&self) -> impl Iterator<Item = &DispatchOutcome<Acknowledgement>> {
        [&self.new, &self.changed, &self.removed]
            .into_iter()
            .flatten()
    }

    /// Every attempted phase was acknowledged by the hub.
    pub fn is_success(&self) -> bool {
        self.phases()
            .all(|outcome| !outcome.is_fault() && outcome.result().is_success())
    }
}

pub struct StatusDiffPublisher {
    engine: SharedDispatchEngine,
    operator_id: OperatorId,
    operator_name: Option<String>,
}

impl StatusDiffPublisher {
    pub fn new(engine: SharedDispatchEngine, operator_id: OperatorId) -> Self {
        Self {
            engine,
            operator_id,
            operator_name: None,
        }
    }

    pub fn with_operator_name(mut self, name: impl Into<String>) -> Self {
        self.operator_name = Some(name.into());
        self
    }

    /// Publish `diff`, skipping every id in `invalid_ids`.
    pub async fn publish(
        &self,
        diff: &EvseStatusDiff,
        invalid_ids: &HashSet<EvseId>,
        options: CallOptions,
    ) -> StatusDiffReport {
        let mut filtered = Vec::new();
        let new = self.records(diff.new_evses(), None, invalid_ids, &mut filtered);
        let changed = self.records(diff.changed_evses(), None, invalid_ids, &mut filtered);
        let removed = self.records(
            diff.removed_evses(),
            Some(EvseStatus::OutOfService),
            invalid_ids,
            &mut filtered,
        );

        if !filtered.is_empty() {
            warn!(
                operator_id = %self.operator_id,
                count = filtered.len(),
                "Leaving invalid EVSE ids out of status push"
            );
        }

        info!(
            operator_id = %self.operator_id,
            new = new.len(),
            changed = changed.len(),
            removed = removed.len(),
            "Publishing EVSE status diff"
        );

        let (new, changed, removed) = tokio::join!(
            self.phase(ActionType::Insert, new, &options),
            self.phase(ActionType::Update, changed, &options),
            self.phase(ActionType::Delete, removed, &options),
        );

        StatusDiffReport {
            new,
            changed,
            removed,
            filtered,
        }
    }

    fn records(
        &self,
        set: &BTreeMap<EvseId, EvseStatus>,
        forced: Option<EvseStatus>,
        invalid_ids: &HashSet<EvseId>,
        filtered: &mut Vec<EvseId>,
    ) -> Vec<EvseStatusRecord> {
        set.iter()
            .filter(|(id, _)| {
                if invalid_ids.contains(*id) {
                    filtered.push((*id).clone());
                    false
                } else {
                    true
                }
            })
            .map(|(id, status)| EvseStatusRecord::new(id.clone(), forced.unwrap_or(*status)))
            .collect()
    }

    async fn phase(
        &self,
        action: ActionType,
        records: Vec<EvseStatusRecord>,
        options: &CallOptions,
    ) -> Option<DispatchOutcome<Acknowledgement>> {
        if records.is_empty() {
            return None;
        }

        let mut request = PushEvseStatusRequest::new(action, self.operator_id.clone(), records);
        request.operator_name = self.operator_name.clone();

        let mut options = options.clone();
        if let Some(id) = options.request_id.take() {
            options.request_id = Some(format!("{}-{}", id, action));
        }

        let outcome = self.engine.dispatch(request, options).await;
        if outcome.is_fault() {
            warn!(
                operator_id = %self.operator_id,
                %action,
                outcome = outcome.kind().as_str(),
                code = outcome.result().status_code.code,
                "Status diff phase failed"
            );
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatch::{DispatchEngine, OutcomeKind};
    use crate::codec::{soap, Operation, WireFormat};
    use crate::infrastructure::http::HttpResponse;
    use crate::test_support::*;
    use std::sync::Arc;

    fn ack() -> String {
        soap::common::build_acknowledgement(Operation::PushEvseStatus, &Acknowledgement::success())
            .body
    }

    /// Accepts insert/update, faults on delete.
    fn hub_rejecting_deletes() -> Arc<ScriptedTransport> {
        ScriptedTransport::new(|request| {
            if request.body.contains(">delete<") {
                Ok(HttpResponse::new(
                    500,
                    soap::build_fault("soapenv:Server", "delete not permitted"),
                ))
            } else {
                Ok(HttpResponse::new(200, ack()))
            }
        })
    }

    fn diff(new: &[&str], changed: &[&str], removed: &[&str]) -> EvseStatusDiff {
        let set = |ids: &[&str], status| {
            ids.iter()
                .map(|id| (evse(id), status))
                .collect::<BTreeMap<_, _>>()
        };
        EvseStatusDiff::new(
            set(new, EvseStatus::Available),
            set(changed, EvseStatus::Occupied),
            set(removed, EvseStatus::Available),
        )
        .unwrap()
    }

    fn publisher(transport: Arc<ScriptedTransport>) -> StatusDiffPublisher {
        let engine = DispatchEngine::new(transport, WireFormat::Soap);
        StatusDiffPublisher::new(Arc::new(engine), operator())
    }

    #[tokio::test]
    async fn failing_delete_does_not_affect_other_phases() {
        let transport = hub_rejecting_deletes();
        let report = publisher(transport.clone())
            .publish(
                &diff(&["DE*GEF*E1*1", "DE*GEF*E1*2"], &["DE*GEF*E2*1"], &["DE*GEF*E3*1"]),
                &HashSet::new(),
                CallOptions::default(),
            )
            .await;

        assert_eq!(report.new.as_ref().unwrap().kind(), OutcomeKind::Success);
        assert_eq!(report.changed.as_ref().unwrap().kind(), OutcomeKind::Success);
        let removed = report.removed.as_ref().unwrap();
        assert_eq!(removed.kind(), OutcomeKind::ProtocolFault);
        assert_eq!(removed.status_code().code, 22);
        assert!(!report.is_success());
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn removed_evses_go_out_of_service() {
        let transport = ScriptedTransport::replying(200, ack());
        let report = publisher(transport.clone())
            .publish(&diff(&[], &[], &["DE*GEF*E3*1"]), &HashSet::new(), CallOptions::default())
            .await;

        assert!(report.new.is_none());
        assert!(report.changed.is_none());
        assert!(report.is_success());

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("OutOfService"));
        assert!(!sent[0].body.contains("Available"));
    }

    #[tokio::test]
    async fn two_new_one_changed_nothing_removed() {
        let transport = ScriptedTransport::replying(200, ack());
        let report = publisher(transport.clone())
            .publish(
                &diff(&["DE*GEF*E1*1", "DE*GEF*E1*2"], &["DE*GEF*E2*1"], &[]),
                &HashSet::new(),
                CallOptions::default(),
            )
            .await;

        assert_eq!(report.phases().count(), 2);
        assert!(report.removed.is_none());
        assert!(report.is_success());
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn invalid_ids_are_filtered() {
        let transport = ScriptedTransport::replying(200, ack());
        let invalid: HashSet<EvseId> = [evse("DE*GEF*E1*2")].into_iter().collect();
        let report = publisher(transport.clone())
            .publish(
                &diff(&["DE*GEF*E1*1", "DE*GEF*E1*2"], &[], &[]),
                &invalid,
                CallOptions::default(),
            )
            .await;

        assert_eq!(report.filtered, vec![evse("DE*GEF*E1*2")]);
        let body = &transport.sent()[0].body;
        assert!(body.contains("DE*GEF*E1*1"));
        assert!(!body.contains("DE*GEF*E1*2"));
    }

    #[tokio::test]
    async fn empty_diff_sends_nothing() {
        let transport = ScriptedTransport::replying(200, ack());
        let report = publisher(transport.clone())
            .publish(&EvseStatusDiff::default(), &HashSet::new(), CallOptions::default())
            .await;

        assert_eq!(report.phases().count(), 0);
        assert!(report.is_success());
        assert!(transport.sent().is_empty());
    }
}
