//! Remote start/stop and reservation start/stop (EMP → hub → CPO)
//!
//! Both families share one layout; only the namespace prefix differs.

use roxmltree::Node;

use super::common::{parse_identification, write_identification};
use super::{parse_document, Family, AUTHORIZATION, RESERVATION};
use crate::codec::xml::{self, XmlWriter};
use crate::codec::{DecodeError, DecodeResult, Operation, WireEnvelope, WireFormat};
use crate::domain::{
    AuthorizeRemoteReservationStartRequest, AuthorizeRemoteReservationStopRequest,
    AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest, EvseId, Identification,
    PartnerProductId, PartnerSessionId, ProviderId, SessionId,
};

struct Names {
    family: Family,
    session_id: &'static str,
    partner_session_id: &'static str,
    provider_id: &'static str,
    evse_id: &'static str,
    identification: &'static str,
    partner_product_id: &'static str,
    duration: &'static str,
}

const AUTHORIZATION_NAMES: Names = Names {
    family: AUTHORIZATION,
    session_id: "Authorization:SessionID",
    partner_session_id: "Authorization:PartnerSessionID",
    provider_id: "Authorization:ProviderID",
    evse_id: "Authorization:EVSEID",
    identification: "Authorization:Identification",
    partner_product_id: "Authorization:PartnerProductID",
    duration: "Authorization:Duration",
};

const RESERVATION_NAMES: Names = Names {
    family: RESERVATION,
    session_id: "Reservation:SessionID",
    partner_session_id: "Reservation:PartnerSessionID",
    provider_id: "Reservation:ProviderID",
    evse_id: "Reservation:EVSEID",
    identification: "Reservation:Identification",
    partner_product_id: "Reservation:PartnerProductID",
    duration: "Reservation:Duration",
};

/// Fields of a start-type request, borrowed from either request struct.
struct StartFields<'a> {
    session_id: Option<&'a SessionId>,
    partner_session_id: Option<&'a PartnerSessionId>,
    provider_id: &'a ProviderId,
    evse_id: &'a EvseId,
    identification: &'a Identification,
    partner_product_id: Option<&'a PartnerProductId>,
    duration: Option<u32>,
}

fn write_start(names: &Names, root: &'static str, fields: StartFields<'_>) -> XmlWriter {
    let mut w = super::begin(names.family);
    w.open(root)
        .opt_leaf(names.session_id, fields.session_id.map(|s| s.as_str()))
        .opt_leaf(
            names.partner_session_id,
            fields.partner_session_id.map(|s| s.as_str()),
        )
        .leaf(names.provider_id, fields.provider_id.to_string())
        .leaf(names.evse_id, fields.evse_id.to_string());
    write_identification(&mut w, names.identification, fields.identification);
    w.opt_leaf(
        names.partner_product_id,
        fields.partner_product_id.map(|p| p.as_str()),
    )
    .opt_leaf(names.duration, fields.duration.map(|d| d.to_string()));
    w
}

fn write_stop(
    names: &Names,
    root: &'static str,
    session_id: &SessionId,
    partner_session_id: Option<&PartnerSessionId>,
    provider_id: &ProviderId,
    evse_id: &EvseId,
) -> XmlWriter {
    let mut w = super::begin(names.family);
    w.open(root)
        .leaf(names.session_id, session_id.as_str())
        .opt_leaf(names.partner_session_id, partner_session_id.map(|s| s.as_str()))
        .leaf(names.provider_id, provider_id.to_string())
        .leaf(names.evse_id, evse_id.to_string());
    w
}

fn envelope(operation: Operation, w: XmlWriter) -> WireEnvelope {
    WireEnvelope::new(
        operation,
        WireFormat::Soap,
        operation.soap_path().to_string(),
        w.finish(),
    )
}

pub fn build_remote_start(request: &AuthorizeRemoteStartRequest) -> WireEnvelope {
    let w = write_start(
        &AUTHORIZATION_NAMES,
        "Authorization:eRoamingAuthorizeRemoteStart",
        StartFields {
            session_id: request.session_id.as_ref(),
            partner_session_id: request.partner_session_id.as_ref(),
            provider_id: &request.provider_id,
            evse_id: &request.evse_id,
            identification: &request.identification,
            partner_product_id: request.partner_product_id.as_ref(),
            duration: None,
        },
    );
    envelope(Operation::AuthorizeRemoteStart, w)
}

pub fn build_remote_stop(request: &AuthorizeRemoteStopRequest) -> WireEnvelope {
    let w = write_stop(
        &AUTHORIZATION_NAMES,
        "Authorization:eRoamingAuthorizeRemoteStop",
        &request.session_id,
        request.partner_session_id.as_ref(),
        &request.provider_id,
        &request.evse_id,
    );
    envelope(Operation::AuthorizeRemoteStop, w)
}

pub fn build_reservation_start(request: &AuthorizeRemoteReservationStartRequest) -> WireEnvelope {
    let w = write_start(
        &RESERVATION_NAMES,
        "Reservation:eRoamingAuthorizeRemoteReservationStart",
        StartFields {
            session_id: request.session_id.as_ref(),
            partner_session_id: request.partner_session_id.as_ref(),
            provider_id: &request.provider_id,
            evse_id: &request.evse_id,
            identification: &request.identification,
            partner_product_id: request.partner_product_id.as_ref(),
            duration: request.duration,
        },
    );
    envelope(Operation::AuthorizeRemoteReservationStart, w)
}

pub fn build_reservation_stop(request: &AuthorizeRemoteReservationStopRequest) -> WireEnvelope {
    let w = write_stop(
        &RESERVATION_NAMES,
        "Reservation:eRoamingAuthorizeRemoteReservationStop",
        &request.session_id,
        request.partner_session_id.as_ref(),
        &request.provider_id,
        &request.evse_id,
    );
    envelope(Operation::AuthorizeRemoteReservationStop, w)
}

struct ParsedStart {
    session_id: Option<SessionId>,
    partner_session_id: Option<PartnerSessionId>,
    provider_id: ProviderId,
    evse_id: EvseId,
    identification: Identification,
    partner_product_id: Option<PartnerProductId>,
    duration: Option<u32>,
}

fn parse_start(op: Operation, raw: &str, node: &Node<'_, '_>) -> DecodeResult<ParsedStart> {
    let wrapper = xml::require_child(op, raw, node, "Identification")?;
    Ok(ParsedStart {
        session_id: xml::parse_opt(op, raw, node, "SessionID", SessionId::parse)?,
        partner_session_id: xml::parse_opt(
            op,
            raw,
            node,
            "PartnerSessionID",
            PartnerSessionId::parse,
        )?,
        provider_id: xml::parse_req(op, raw, node, "ProviderID", ProviderId::parse)?,
        evse_id: xml::parse_req(op, raw, node, "EVSEID", EvseId::parse)?,
        identification: parse_identification(op, raw, &wrapper)?,
        partner_product_id: xml::parse_opt(
            op,
            raw,
            node,
            "PartnerProductID",
            PartnerProductId::parse,
        )?,
        duration: xml::parse_opt(op, raw, node, "Duration", |t| t.parse::<u32>())?,
    })
}

type ParsedStop = (SessionId, Option<PartnerSessionId>, ProviderId, EvseId);

fn parse_stop(op: Operation, raw: &str, node: &Node<'_, '_>) -> DecodeResult<ParsedStop> {
    Ok((
        xml::parse_req(op, raw, node, "SessionID", SessionId::parse)?,
        xml::parse_opt(op, raw, node, "PartnerSessionID", PartnerSessionId::parse)?,
        xml::parse_req(op, raw, node, "ProviderID", ProviderId::parse)?,
        xml::parse_req(op, raw, node, "EVSEID", EvseId::parse)?,
    ))
}

/// Any inbound CPO-side command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    Start(AuthorizeRemoteStartRequest),
    Stop(AuthorizeRemoteStopRequest),
    ReservationStart(AuthorizeRemoteReservationStartRequest),
    ReservationStop(AuthorizeRemoteReservationStopRequest),
}

impl RemoteCommand {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Start(_) => Operation::AuthorizeRemoteStart,
            Self::Stop(_) => Operation::AuthorizeRemoteStop,
            Self::ReservationStart(_) => Operation::AuthorizeRemoteReservationStart,
            Self::ReservationStop(_) => Operation::AuthorizeRemoteReservationStop,
        }
    }
}

/// Server side: decode whichever remote command the body carries.
pub fn parse_remote_command(raw: &str) -> DecodeResult<RemoteCommand> {
    let probe = Operation::AuthorizeRemoteStart;
    let doc = parse_document(probe, raw)?;
    let payload = super::body_payload(probe, raw, &doc)?;

    match payload.tag_name().name() {
        "eRoamingAuthorizeRemoteStart" => {
            let op = Operation::AuthorizeRemoteStart;
            let p = parse_start(op, raw, &payload)?;
            Ok(RemoteCommand::Start(AuthorizeRemoteStartRequest {
                provider_id: p.provider_id,
                evse_id: p.evse_id,
                identification: p.identification,
                session_id: p.session_id,
                partner_session_id: p.partner_session_id,
                partner_product_id: p.partner_product_id,
            }))
        }
        "eRoamingAuthorizeRemoteStop" => {
            let (session_id, partner_session_id, provider_id, evse_id) =
                parse_stop(Operation::AuthorizeRemoteStop, raw, &payload)?;
            Ok(RemoteCommand::Stop(AuthorizeRemoteStopRequest {
                session_id,
                provider_id,
                evse_id,
                partner_session_id,
            }))
        }
        "eRoamingAuthorizeRemoteReservationStart" => {
            let op = Operation::AuthorizeRemoteReservationStart;
            let p = parse_start(op, raw, &payload)?;
            Ok(RemoteCommand::ReservationStart(
                AuthorizeRemoteReservationStartRequest {
                    provider_id: p.provider_id,
                    evse_id: p.evse_id,
                    identification: p.identification,
                    session_id: p.session_id,
                    partner_session_id: p.partner_session_id,
                    partner_product_id: p.partner_product_id,
                    duration: p.duration,
                },
            ))
        }
        "eRoamingAuthorizeRemoteReservationStop" => {
            let (session_id, partner_session_id, provider_id, evse_id) =
                parse_stop(Operation::AuthorizeRemoteReservationStop, raw, &payload)?;
            Ok(RemoteCommand::ReservationStop(
                AuthorizeRemoteReservationStopRequest {
                    session_id,
                    provider_id,
                    evse_id,
                    partner_session_id,
                },
            ))
        }
        other => Err(DecodeError::new(
            probe,
            format!("unexpected remote command <{}>", other),
            raw,
        )),
    }
}

/// Local name of the body payload, used by the endpoints to route a
/// request before decoding it.
pub fn payload_name(raw: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(raw).ok()?;
    let payload = super::body_payload(Operation::AuthorizeStart, raw, &doc).ok()?;
    Some(payload.tag_name().name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EvcoId, Uid};

    fn provider() -> ProviderId {
        ProviderId::parse("DE*ICE").unwrap()
    }

    fn evse() -> EvseId {
        EvseId::parse("DE*GEF*E1234*1").unwrap()
    }

    #[test]
    fn reservation_uses_reservation_namespace() {
        let mut request = AuthorizeRemoteReservationStartRequest::new(
            provider(),
            evse(),
            Identification::Remote(EvcoId::parse("DE*ICE*123456*X").unwrap()),
        );
        request.duration = Some(15);
        let envelope = build_reservation_start(&request);

        assert_eq!(envelope.path, "/ibis/ws/eRoamingReservation_V1.0");
        assert!(envelope
            .body
            .contains("xmlns:Reservation=\"http://www.hubject.com/b2b/services/reservation/v1.0\""));
        assert!(envelope.body.contains("<Reservation:Duration>15</Reservation:Duration>"));

        assert_eq!(
            parse_remote_command(&envelope.body).unwrap(),
            RemoteCommand::ReservationStart(request)
        );
    }

    #[test]
    fn remote_start_has_no_duration() {
        let request = AuthorizeRemoteStartRequest::new(
            provider(),
            evse(),
            Identification::RfidId(Uid::parse("AABBCCDD").unwrap()),
        );
        let envelope = build_remote_start(&request);
        assert!(!envelope.body.contains("Duration"));
        assert!(!envelope.body.contains("SessionID"));
        assert_eq!(
            parse_remote_command(&envelope.body).unwrap(),
            RemoteCommand::Start(request)
        );
    }

    #[test]
    fn stops_round_trip() {
        let stop = AuthorizeRemoteStopRequest::new(SessionId::new_random(), provider(), evse());
        let envelope = build_remote_stop(&stop);
        let command = parse_remote_command(&envelope.body).unwrap();
        assert_eq!(command.operation(), Operation::AuthorizeRemoteStop);
        assert_eq!(command, RemoteCommand::Stop(stop));

        let cancel =
            AuthorizeRemoteReservationStopRequest::new(SessionId::new_random(), provider(), evse());
        let envelope = build_reservation_stop(&cancel);
        assert_eq!(
            parse_remote_command(&envelope.body).unwrap(),
            RemoteCommand::ReservationStop(cancel)
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        let raw = "<Envelope><Body><eRoamingPullEvseData/></Body></Envelope>";
        let err = parse_remote_command(raw).unwrap_err();
        assert!(err.reason.contains("eRoamingPullEvseData"));
        assert_eq!(payload_name(raw).as_deref(), Some("eRoamingPullEvseData"));
    }
}
