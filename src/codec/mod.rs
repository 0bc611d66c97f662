//! Message codec
//!
//! Pure functions between the typed request/result values in
//! [`crate::domain`] and the two wire dialects the hub speaks: SOAP/XML and
//! JSON over HTTP. Nothing in here performs I/O; the dispatch engine owns the
//! transport and the fault classification built on [`detect_fault`].

pub mod json;
pub mod records;
pub mod soap;
pub mod xml;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Acknowledgement, AuthorizationStart, AuthorizationStop, AuthorizeRemoteReservationStartRequest,
    AuthorizeRemoteReservationStopRequest, AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest,
    AuthorizeStartRequest, AuthorizeStopRequest, ChargeDetailRecord, Correlation,
    PushEvseDataRequest, PushEvseStatusRequest, StatusCode,
};

pub use records::{validate_evse_data_record, SkipReason, SkippedRecord};

/// Which dialect to speak with the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Soap,
    Json,
}

impl WireFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Soap => "text/xml; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Soap => "soap",
            Self::Json => "json",
        })
    }
}

/// Every hub operation this crate issues or serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PushEvseData,
    PushEvseStatus,
    AuthorizeStart,
    AuthorizeStop,
    SendChargeDetailRecord,
    AuthorizeRemoteStart,
    AuthorizeRemoteStop,
    AuthorizeRemoteReservationStart,
    AuthorizeRemoteReservationStop,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::PushEvseData,
        Operation::PushEvseStatus,
        Operation::AuthorizeStart,
        Operation::AuthorizeStop,
        Operation::SendChargeDetailRecord,
        Operation::AuthorizeRemoteStart,
        Operation::AuthorizeRemoteStop,
        Operation::AuthorizeRemoteReservationStart,
        Operation::AuthorizeRemoteReservationStop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PushEvseData => "PushEvseData",
            Self::PushEvseStatus => "PushEvseStatus",
            Self::AuthorizeStart => "AuthorizeStart",
            Self::AuthorizeStop => "AuthorizeStop",
            Self::SendChargeDetailRecord => "SendChargeDetailRecord",
            Self::AuthorizeRemoteStart => "AuthorizeRemoteStart",
            Self::AuthorizeRemoteStop => "AuthorizeRemoteStop",
            Self::AuthorizeRemoteReservationStart => "AuthorizeRemoteReservationStart",
            Self::AuthorizeRemoteReservationStop => "AuthorizeRemoteReservationStop",
        }
    }

    /// `SOAPAction` header value.
    pub fn soap_action(&self) -> &'static str {
        match self {
            Self::PushEvseData => "eRoamingPushEvseData",
            Self::PushEvseStatus => "eRoamingPushEvseStatus",
            Self::AuthorizeStart => "eRoamingAuthorizeStart",
            Self::AuthorizeStop => "eRoamingAuthorizeStop",
            Self::SendChargeDetailRecord => "eRoamingChargeDetailRecord",
            Self::AuthorizeRemoteStart => "eRoamingAuthorizeRemoteStart",
            Self::AuthorizeRemoteStop => "eRoamingAuthorizeRemoteStop",
            Self::AuthorizeRemoteReservationStart => "eRoamingAuthorizeRemoteReservationStart",
            Self::AuthorizeRemoteReservationStop => "eRoamingAuthorizeRemoteReservationStop",
        }
    }

    /// SOAP service path, relative to the hub base URL.
    pub fn soap_path(&self) -> &'static str {
        match self {
            Self::PushEvseData => "/ibis/ws/eRoamingEvseData_V2.0",
            Self::PushEvseStatus => "/ibis/ws/eRoamingEvseStatus_V2.0",
            Self::AuthorizeStart
            | Self::AuthorizeStop
            | Self::SendChargeDetailRecord
            | Self::AuthorizeRemoteStart
            | Self::AuthorizeRemoteStop => "/ibis/ws/eRoamingAuthorization_V2.0",
            Self::AuthorizeRemoteReservationStart | Self::AuthorizeRemoteReservationStop => {
                "/ibis/ws/eRoamingReservation_V1.0"
            }
        }
    }

    /// JSON service path for the given operator (CPO operations) or
    /// provider (EMP operations).
    pub fn json_path(&self, party: &str) -> String {
        match self {
            Self::PushEvseData => format!("/api/oicp/evsepush/v23/operators/{}/data-records", party),
            Self::PushEvseStatus => {
                format!("/api/oicp/evsepush/v21/operators/{}/status-records", party)
            }
            Self::AuthorizeStart => {
                format!("/api/oicp/charging/v21/operators/{}/authorize/start", party)
            }
            Self::AuthorizeStop => {
                format!("/api/oicp/charging/v21/operators/{}/authorize/stop", party)
            }
            Self::SendChargeDetailRecord => {
                format!("/api/oicp/cdrmgmt/v22/operators/{}/charge-detail-record", party)
            }
            Self::AuthorizeRemoteStart => format!(
                "/api/oicp/charging/v21/providers/{}/authorize-remote/start",
                party
            ),
            Self::AuthorizeRemoteStop => format!(
                "/api/oicp/charging/v21/providers/{}/authorize-remote/stop",
                party
            ),
            Self::AuthorizeRemoteReservationStart => format!(
                "/api/oicp/charging/v21/providers/{}/authorize-remote-reservation/start",
                party
            ),
            Self::AuthorizeRemoteReservationStop => format!(
                "/api/oicp/charging/v21/providers/{}/authorize-remote-reservation/stop",
                party
            ),
        }
    }

    /// Resolve an operation from a `SOAPAction` header; quotes are ignored.
    pub fn from_soap_action(action: &str) -> Option<Self> {
        let action = action.trim().trim_matches('"');
        Self::ALL.into_iter().find(|op| op.soap_action() == action)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serialized request or response, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEnvelope {
    pub operation: Operation,
    pub format: WireFormat,
    /// Path relative to the hub base URL.
    pub path: String,
    pub soap_action: Option<&'static str>,
    pub content_type: &'static str,
    pub body: String,
}

impl WireEnvelope {
    pub(crate) fn new(operation: Operation, format: WireFormat, path: String, body: String) -> Self {
        Self {
            operation,
            format,
            path,
            soap_action: match format {
                WireFormat::Soap => Some(operation.soap_action()),
                WireFormat::Json => None,
            },
            content_type: format.content_type(),
            body,
        }
    }
}

/// A response (or inbound request) body that could not be decoded.
///
/// Carries the raw body so callers can log or forward it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode {operation} message: {reason}")]
pub struct DecodeError {
    pub operation: Operation,
    pub reason: String,
    pub raw_body: String,
}

impl DecodeError {
    pub fn new(operation: Operation, reason: impl Into<String>, raw_body: &str) -> Self {
        Self {
            operation,
            reason: reason.into(),
            raw_body: raw_body.to_string(),
        }
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result of serializing an EVSE data batch.
#[derive(Debug, Clone)]
pub struct BuiltBatch {
    pub envelope: WireEnvelope,
    pub emitted: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// A hub-level fault recognised in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultEnvelope {
    /// Short human readable reason (fault string or error message).
    pub reason: String,
}

/// Look for a fault/error envelope in a response body.
///
/// SOAP: a `Fault` element inside the envelope body. JSON: an object that
/// carries an error message or a bare `StatusCode` without the result field
/// of the operation.
pub fn detect_fault(format: WireFormat, operation: Operation, body: &str) -> Option<FaultEnvelope> {
    match format {
        WireFormat::Soap => soap::detect_fault(body),
        WireFormat::Json => json::detect_fault(operation, body),
    }
}

/// Request types the dispatch engine can send.
///
/// Each implementation ties a request to its operation, its result type and
/// the codec functions for both dialects.
pub trait HubRequest: Send + Sync + 'static {
    type Response: HubResponse;

    const OPERATION: Operation;

    fn encode(&self, format: WireFormat) -> WireEnvelope;

    fn decode(format: WireFormat, body: &str) -> DecodeResult<Self::Response>;

    fn correlation(&self) -> Correlation;
}

/// Result types the dispatch engine can synthesize when no hub answer is
/// available.
pub trait HubResponse: Clone + Send + Sync + fmt::Debug + 'static {
    fn synthesize(status_code: StatusCode, correlation: Correlation) -> Self;

    fn status_code(&self) -> &StatusCode;
}

impl HubResponse for Acknowledgement {
    fn synthesize(status_code: StatusCode, correlation: Correlation) -> Self {
        Acknowledgement::failure(status_code).with_correlation(correlation)
    }

    fn status_code(&self) -> &StatusCode {
        &self.status_code
    }
}

impl HubResponse for AuthorizationStart {
    fn synthesize(status_code: StatusCode, correlation: Correlation) -> Self {
        AuthorizationStart {
            authorization_status: None,
            status_code,
            session_id: correlation.session_id,
            partner_session_id: correlation.partner_session_id,
            provider_id: correlation.provider_id,
            authorization_stop_identifications: Vec::new(),
        }
    }

    fn status_code(&self) -> &StatusCode {
        &self.status_code
    }
}

impl HubResponse for AuthorizationStop {
    fn synthesize(status_code: StatusCode, correlation: Correlation) -> Self {
        AuthorizationStop {
            authorization_status: None,
            status_code,
            session_id: correlation.session_id,
            partner_session_id: correlation.partner_session_id,
            provider_id: correlation.provider_id,
        }
    }

    fn status_code(&self) -> &StatusCode {
        &self.status_code
    }
}

/// Serialize an EVSE data push, leaving out records that cannot be
/// published. The batch still goes out with the remaining records.
pub fn build_push_evse_data(format: WireFormat, request: &PushEvseDataRequest) -> BuiltBatch {
    let (publishable, skipped) = records::partition(&request.records);
    let emitted = publishable.len();
    let envelope = match format {
        WireFormat::Soap => soap::evse::build_push_evse_data(request, &publishable),
        WireFormat::Json => json::build_push_evse_data(request, &publishable),
    };
    BuiltBatch {
        envelope,
        emitted,
        skipped,
    }
}

macro_rules! hub_request {
    ($request:ty, $response:ty, $op:ident, $soap_build:path, $json_build:path, $soap_parse:path, $json_parse:path) => {
        impl HubRequest for $request {
            type Response = $response;

            const OPERATION: Operation = Operation::$op;

            fn encode(&self, format: WireFormat) -> WireEnvelope {
                match format {
                    WireFormat::Soap => $soap_build(self),
                    WireFormat::Json => $json_build(self),
                }
            }

            fn decode(format: WireFormat, body: &str) -> DecodeResult<Self::Response> {
                match format {
                    WireFormat::Soap => $soap_parse(Operation::$op, body),
                    WireFormat::Json => $json_parse(Operation::$op, body),
                }
            }

            fn correlation(&self) -> Correlation {
                <$request>::correlation(self)
            }
        }
    };
}

impl HubRequest for PushEvseDataRequest {
    type Response = Acknowledgement;

    const OPERATION: Operation = Operation::PushEvseData;

    fn encode(&self, format: WireFormat) -> WireEnvelope {
        let batch = build_push_evse_data(format, self);
        for skipped in &batch.skipped {
            tracing::warn!(
                evse_id = %skipped.evse_id,
                reason = %skipped.reason,
                "Leaving EVSE out of data push"
            );
        }
        batch.envelope
    }

    fn decode(format: WireFormat, body: &str) -> DecodeResult<Self::Response> {
        match format {
            WireFormat::Soap => soap::common::parse_acknowledgement(Operation::PushEvseData, body),
            WireFormat::Json => json::parse_acknowledgement(Operation::PushEvseData, body),
        }
    }

    fn correlation(&self) -> Correlation {
        Correlation::default()
    }
}

impl HubRequest for PushEvseStatusRequest {
    type Response = Acknowledgement;

    const OPERATION: Operation = Operation::PushEvseStatus;

    fn encode(&self, format: WireFormat) -> WireEnvelope {
        match format {
            WireFormat::Soap => soap::evse::build_push_evse_status(self),
            WireFormat::Json => json::build_push_evse_status(self),
        }
    }

    fn decode(format: WireFormat, body: &str) -> DecodeResult<Self::Response> {
        match format {
            WireFormat::Soap => soap::common::parse_acknowledgement(Operation::PushEvseStatus, body),
            WireFormat::Json => json::parse_acknowledgement(Operation::PushEvseStatus, body),
        }
    }

    fn correlation(&self) -> Correlation {
        Correlation::default()
    }
}

hub_request!(
    AuthorizeStartRequest,
    AuthorizationStart,
    AuthorizeStart,
    soap::authorization::build_authorize_start,
    json::build_authorize_start,
    soap::authorization::parse_authorization_start,
    json::parse_authorization_start
);

hub_request!(
    AuthorizeStopRequest,
    AuthorizationStop,
    AuthorizeStop,
    soap::authorization::build_authorize_stop,
    json::build_authorize_stop,
    soap::authorization::parse_authorization_stop,
    json::parse_authorization_stop
);

hub_request!(
    ChargeDetailRecord,
    Acknowledgement,
    SendChargeDetailRecord,
    soap::cdr::build_charge_detail_record,
    json::build_charge_detail_record,
    soap::common::parse_acknowledgement,
    json::parse_acknowledgement
);

hub_request!(
    AuthorizeRemoteStartRequest,
    Acknowledgement,
    AuthorizeRemoteStart,
    soap::remote::build_remote_start,
    json::build_remote_start,
    soap::common::parse_acknowledgement,
    json::parse_acknowledgement
);

hub_request!(
    AuthorizeRemoteStopRequest,
    Acknowledgement,
    AuthorizeRemoteStop,
    soap::remote::build_remote_stop,
    json::build_remote_stop,
    soap::common::parse_acknowledgement,
    json::parse_acknowledgement
);

hub_request!(
    AuthorizeRemoteReservationStartRequest,
    Acknowledgement,
    AuthorizeRemoteReservationStart,
    soap::remote::build_reservation_start,
    json::build_reservation_start,
    soap::common::parse_acknowledgement,
    json::parse_acknowledgement
);

hub_request!(
    AuthorizeRemoteReservationStopRequest,
    Acknowledgement,
    AuthorizeRemoteReservationStop,
    soap::remote::build_reservation_stop,
    json::build_reservation_stop,
    soap::common::parse_acknowledgement,
    json::parse_acknowledgement
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soap_action_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_soap_action(op.soap_action()), Some(op));
            assert_eq!(
                Operation::from_soap_action(&format!("\"{}\"", op.soap_action())),
                Some(op)
            );
        }
        assert_eq!(Operation::from_soap_action("eRoamingPullEvseData"), None);
    }

    #[test]
    fn json_paths_embed_party() {
        assert_eq!(
            Operation::AuthorizeStart.json_path("DE*GEF"),
            "/api/oicp/charging/v21/operators/DE*GEF/authorize/start"
        );
        assert_eq!(
            Operation::AuthorizeRemoteStop.json_path("DE*ICE"),
            "/api/oicp/charging/v21/providers/DE*ICE/authorize-remote/stop"
        );
    }

    #[test]
    fn envelope_headers_follow_format() {
        let soap = WireEnvelope::new(
            Operation::PushEvseStatus,
            WireFormat::Soap,
            "/x".into(),
            String::new(),
        );
        assert_eq!(soap.soap_action, Some("eRoamingPushEvseStatus"));
        assert!(soap.content_type.starts_with("text/xml"));

        let json = WireEnvelope::new(
            Operation::PushEvseStatus,
            WireFormat::Json,
            "/x".into(),
            String::new(),
        );
        assert_eq!(json.soap_action, None);
        assert_eq!(json.content_type, "application/json");
    }

    #[test]
    fn synthesized_results_carry_correlation() {
        let correlation = Correlation {
            session_id: Some(crate::domain::SessionId::new_random()),
            ..Correlation::default()
        };
        let start = AuthorizationStart::synthesize(
            StatusCode::new(StatusCode::SERVICE_NOT_AVAILABLE, "Service not available"),
            correlation.clone(),
        );
        assert_eq!(start.session_id, correlation.session_id);
        assert_eq!(start.authorization_status, None);
        assert_eq!(start.status_code().code, 320);
    }
}
