//! Inbound ports: requests the hub sends to us
//!
//! The endpoints decode the wire message and hand the typed request to one
//! of these. Implementations answer with the operation's result type; the
//! endpoint encodes it in the dialect the request arrived in.

use async_trait::async_trait;

use crate::domain::{
    Acknowledgement, AuthorizationStart, AuthorizationStop, AuthorizeRemoteReservationStartRequest,
    AuthorizeRemoteReservationStopRequest, AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest,
    AuthorizeStartRequest, AuthorizeStopRequest, ChargeDetailRecord, StatusCode,
};

/// CPO side: an EMP asks, through the hub, to start/stop or reserve.
#[async_trait]
pub trait CpoRemoteHandler: Send + Sync {
    async fn remote_start(&self, request: AuthorizeRemoteStartRequest) -> Acknowledgement;

    async fn remote_stop(&self, request: AuthorizeRemoteStopRequest) -> Acknowledgement;

    async fn reservation_start(
        &self,
        request: AuthorizeRemoteReservationStartRequest,
    ) -> Acknowledgement;

    async fn reservation_stop(
        &self,
        request: AuthorizeRemoteReservationStopRequest,
    ) -> Acknowledgement;
}

/// EMP side: a CPO asks, through the hub, whether a token may charge, and
/// reports finished sessions.
#[async_trait]
pub trait EmpAuthorizationHandler: Send + Sync {
    async fn authorize_start(&self, request: AuthorizeStartRequest) -> AuthorizationStart;

    async fn authorize_stop(&self, request: AuthorizeStopRequest) -> AuthorizationStop;

    async fn charge_detail_record(&self, record: ChargeDetailRecord) -> Acknowledgement;
}

/// Answers everything with `320 Service not available`. Used when the
/// service runs without a backend attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnattachedBackend;

impl UnattachedBackend {
    fn status() -> StatusCode {
        StatusCode::new(StatusCode::SERVICE_NOT_AVAILABLE, "Service not available")
            .with_additional_info("no backend attached")
    }
}

#[async_trait]
impl CpoRemoteHandler for UnattachedBackend {
    async fn remote_start(&self, request: AuthorizeRemoteStartRequest) -> Acknowledgement {
        Acknowledgement::failure(Self::status()).with_correlation(request.correlation())
    }

    async fn remote_stop(&self, request: AuthorizeRemoteStopRequest) -> Acknowledgement {
        Acknowledgement::failure(Self::status()).with_correlation(request.correlation())
    }

    async fn reservation_start(
        &self,
        request: AuthorizeRemoteReservationStartRequest,
    ) -> Acknowledgement {
        Acknowledgement::failure(Self::status()).with_correlation(request.correlation())
    }

    async fn reservation_stop(
        &self,
        request: AuthorizeRemoteReservationStopRequest,
    ) -> Acknowledgement {
        Acknowledgement::failure(Self::status()).with_correlation(request.correlation())
    }
}

#[async_trait]
impl EmpAuthorizationHandler for UnattachedBackend {
    async fn authorize_start(&self, request: AuthorizeStartRequest) -> AuthorizationStart {
        let correlation = request.correlation();
        let mut result = AuthorizationStart::new(
            crate::domain::AuthorizationOutcome::NotAuthorized,
            Self::status(),
        );
        result.session_id = correlation.session_id;
        result.partner_session_id = correlation.partner_session_id;
        result
    }

    async fn authorize_stop(&self, request: AuthorizeStopRequest) -> AuthorizationStop {
        let mut result = AuthorizationStop::new(
            crate::domain::AuthorizationOutcome::NotAuthorized,
            Self::status(),
        );
        result.session_id = Some(request.session_id);
        result.partner_session_id = request.partner_session_id;
        result
    }

    async fn charge_detail_record(&self, record: ChargeDetailRecord) -> Acknowledgement {
        Acknowledgement::failure(Self::status()).with_correlation(record.correlation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[tokio::test]
    async fn unattached_backend_refuses_with_correlation() {
        let request = remote_stop();
        let session = request.session_id.clone();
        let ack = CpoRemoteHandler::remote_stop(&UnattachedBackend, request).await;
        assert!(!ack.result);
        assert_eq!(ack.status_code.code, 320);
        assert_eq!(ack.session_id, Some(session));

        let stop = EmpAuthorizationHandler::authorize_stop(&UnattachedBackend, authorize_stop()).await;
        assert_eq!(stop.authorization_status.as_deref(), Some("NotAuthorized"));
    }
}
