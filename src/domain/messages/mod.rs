//! Request and result value objects exchanged with the hub

pub mod authorization;
pub mod cdr;
pub mod push;
pub mod remote;
pub mod status_code;

pub use authorization::{
    AuthorizationOutcome, AuthorizationStart, AuthorizationStop, AuthorizeStartRequest,
    AuthorizeStopRequest, Identification,
};
pub use cdr::ChargeDetailRecord;
pub use push::{PushEvseDataRequest, PushEvseStatusRequest};
pub use remote::{
    AuthorizeRemoteReservationStartRequest, AuthorizeRemoteReservationStopRequest,
    AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest,
};
pub use status_code::StatusCode;

use crate::domain::ids::{PartnerSessionId, ProviderId, SessionId};

/// Session identifiers copied from a request into a synthesized result,
/// so failed calls still correlate with the session they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub provider_id: Option<ProviderId>,
}

/// Generic result of data pushes, CDRs and remote commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub result: bool,
    pub status_code: StatusCode,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub provider_id: Option<ProviderId>,
}

impl Acknowledgement {
    pub fn success() -> Self {
        Self {
            result: true,
            status_code: StatusCode::success(),
            session_id: None,
            partner_session_id: None,
            provider_id: None,
        }
    }

    pub fn failure(status_code: StatusCode) -> Self {
        Self {
            result: false,
            status_code,
            session_id: None,
            partner_session_id: None,
            provider_id: None,
        }
    }

    pub fn with_correlation(mut self, correlation: Correlation) -> Self {
        self.session_id = correlation.session_id;
        self.partner_session_id = correlation.partner_session_id;
        self.provider_id = correlation.provider_id;
        self
    }

    pub fn is_success(&self) -> bool {
        self.result && self.status_code.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_success_requires_both_flags() {
        assert!(Acknowledgement::success().is_success());

        let mut ack = Acknowledgement::success();
        ack.status_code = StatusCode::new(22, "Data error");
        assert!(!ack.is_success());

        let mut ack = Acknowledgement::success();
        ack.result = false;
        assert!(!ack.is_success());
    }

    #[test]
    fn failure_keeps_correlation() {
        let session = SessionId::new_random();
        let ack = Acknowledgement::failure(StatusCode::new(320, "Service not available"))
            .with_correlation(Correlation {
                session_id: Some(session.clone()),
                ..Correlation::default()
            });
        assert_eq!(ack.session_id, Some(session));
        assert!(!ack.result);
    }
}
