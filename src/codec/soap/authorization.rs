//! eRoamingAuthorizeStart / eRoamingAuthorizeStop and their results

use roxmltree::Node;

use super::common::{
    parse_identification, parse_session_ids, parse_status_code, write_identification,
    write_status_code,
};
use super::{expect_payload, parse_document, AUTHORIZATION};
use crate::codec::xml::{self, XmlWriter};
use crate::codec::{DecodeResult, Operation, WireEnvelope, WireFormat};
use crate::domain::{
    AuthorizationStart, AuthorizationStop, AuthorizeStartRequest, AuthorizeStopRequest, EvseId,
    Identification, OperatorId, PartnerProductId, PartnerSessionId, ProviderId, SessionId,
};

fn envelope(operation: Operation, w: XmlWriter) -> WireEnvelope {
    WireEnvelope::new(
        operation,
        WireFormat::Soap,
        operation.soap_path().to_string(),
        w.finish(),
    )
}

pub fn build_authorize_start(request: &AuthorizeStartRequest) -> WireEnvelope {
    let mut w = super::begin(AUTHORIZATION);
    w.open("Authorization:eRoamingAuthorizeStart")
        .opt_leaf("Authorization:SessionID", request.session_id.as_ref().map(|s| s.as_str()))
        .opt_leaf(
            "Authorization:PartnerSessionID",
            request.partner_session_id.as_ref().map(|s| s.as_str()),
        )
        .leaf("Authorization:OperatorID", request.operator_id.to_string())
        .opt_leaf("Authorization:EVSEID", request.evse_id.as_ref().map(|e| e.to_string()));
    write_identification(&mut w, "Authorization:Identification", &request.identification);
    w.opt_leaf(
        "Authorization:PartnerProductID",
        request.partner_product_id.as_ref().map(|p| p.as_str()),
    );
    envelope(Operation::AuthorizeStart, w)
}

pub fn build_authorize_stop(request: &AuthorizeStopRequest) -> WireEnvelope {
    let mut w = super::begin(AUTHORIZATION);
    w.open("Authorization:eRoamingAuthorizeStop")
        .leaf("Authorization:SessionID", request.session_id.as_str())
        .opt_leaf(
            "Authorization:PartnerSessionID",
            request.partner_session_id.as_ref().map(|s| s.as_str()),
        )
        .leaf("Authorization:OperatorID", request.operator_id.to_string())
        .opt_leaf("Authorization:EVSEID", request.evse_id.as_ref().map(|e| e.to_string()));
    write_identification(&mut w, "Authorization:Identification", &request.identification);
    envelope(Operation::AuthorizeStop, w)
}

pub fn parse_authorization_start(
    operation: Operation,
    raw: &str,
) -> DecodeResult<AuthorizationStart> {
    let doc = parse_document(operation, raw)?;
    let payload = expect_payload(operation, raw, &doc, "eRoamingAuthorizationStart")?;

    let status_code = parse_status_code(operation, raw, &payload)?;
    let (session_id, partner_session_id, provider_id) =
        parse_session_ids(operation, raw, &payload)?;
    let authorization_stop_identifications = match xml::child(&payload, "AuthorizationStopIdentifications") {
        Some(list) => xml::children(&list, "Identification")
            .map(|node| parse_identification(operation, raw, &node))
            .collect::<DecodeResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(AuthorizationStart {
        authorization_status: xml::child_text(&payload, "AuthorizationStatus").map(str::to_string),
        status_code,
        session_id,
        partner_session_id,
        provider_id,
        authorization_stop_identifications,
    })
}

pub fn parse_authorization_stop(
    operation: Operation,
    raw: &str,
) -> DecodeResult<AuthorizationStop> {
    let doc = parse_document(operation, raw)?;
    let payload = expect_payload(operation, raw, &doc, "eRoamingAuthorizationStop")?;

    let status_code = parse_status_code(operation, raw, &payload)?;
    let (session_id, partner_session_id, provider_id) =
        parse_session_ids(operation, raw, &payload)?;

    Ok(AuthorizationStop {
        authorization_status: xml::child_text(&payload, "AuthorizationStatus").map(str::to_string),
        status_code,
        session_id,
        partner_session_id,
        provider_id,
    })
}

struct CommonFields {
    session_id: Option<SessionId>,
    partner_session_id: Option<PartnerSessionId>,
    operator_id: OperatorId,
    evse_id: Option<EvseId>,
    identification: Identification,
}

fn parse_common(operation: Operation, raw: &str, node: &Node<'_, '_>) -> DecodeResult<CommonFields> {
    let wrapper = xml::require_child(operation, raw, node, "Identification")?;
    Ok(CommonFields {
        session_id: xml::parse_opt(operation, raw, node, "SessionID", SessionId::parse)?,
        partner_session_id: xml::parse_opt(
            operation,
            raw,
            node,
            "PartnerSessionID",
            PartnerSessionId::parse,
        )?,
        operator_id: xml::parse_req(operation, raw, node, "OperatorID", OperatorId::parse)?,
        evse_id: xml::parse_opt(operation, raw, node, "EVSEID", EvseId::parse)?,
        identification: parse_identification(operation, raw, &wrapper)?,
    })
}

/// Server side: decode an inbound `eRoamingAuthorizeStart`.
pub fn parse_authorize_start_request(raw: &str) -> DecodeResult<AuthorizeStartRequest> {
    let operation = Operation::AuthorizeStart;
    let doc = parse_document(operation, raw)?;
    let payload = expect_payload(operation, raw, &doc, "eRoamingAuthorizeStart")?;
    let common = parse_common(operation, raw, &payload)?;

    Ok(AuthorizeStartRequest {
        operator_id: common.operator_id,
        identification: common.identification,
        evse_id: common.evse_id,
        session_id: common.session_id,
        partner_session_id: common.partner_session_id,
        partner_product_id: xml::parse_opt(
            operation,
            raw,
            &payload,
            "PartnerProductID",
            PartnerProductId::parse,
        )?,
    })
}

/// Server side: decode an inbound `eRoamingAuthorizeStop`.
pub fn parse_authorize_stop_request(raw: &str) -> DecodeResult<AuthorizeStopRequest> {
    let operation = Operation::AuthorizeStop;
    let doc = parse_document(operation, raw)?;
    let payload = expect_payload(operation, raw, &doc, "eRoamingAuthorizeStop")?;
    let common = parse_common(operation, raw, &payload)?;
    let session_id = common.session_id.ok_or_else(|| {
        crate::codec::DecodeError::new(operation, "missing <SessionID>", raw)
    })?;

    Ok(AuthorizeStopRequest {
        operator_id: common.operator_id,
        session_id,
        identification: common.identification,
        evse_id: common.evse_id,
        partner_session_id: common.partner_session_id,
    })
}

fn write_result_ids(
    w: &mut XmlWriter,
    session_id: Option<&SessionId>,
    partner_session_id: Option<&PartnerSessionId>,
    provider_id: Option<&ProviderId>,
) {
    w.opt_leaf("Authorization:SessionID", session_id.map(|s| s.as_str()))
        .opt_leaf(
            "Authorization:PartnerSessionID",
            partner_session_id.map(|s| s.as_str()),
        )
        .opt_leaf("Authorization:ProviderID", provider_id.map(|p| p.to_string()));
}

/// Server side: encode an `eRoamingAuthorizationStart` answer.
pub fn build_authorization_start(result: &AuthorizationStart) -> WireEnvelope {
    let mut w = super::begin(AUTHORIZATION);
    w.open("Authorization:eRoamingAuthorizationStart");
    write_result_ids(
        &mut w,
        result.session_id.as_ref(),
        result.partner_session_id.as_ref(),
        result.provider_id.as_ref(),
    );
    w.opt_leaf(
        "Authorization:AuthorizationStatus",
        result.authorization_status.as_deref(),
    );
    write_status_code(&mut w, "Authorization:StatusCode", &result.status_code);
    if !result.authorization_stop_identifications.is_empty() {
        w.open("Authorization:AuthorizationStopIdentifications");
        for id in &result.authorization_stop_identifications {
            write_identification(&mut w, "Authorization:Identification", id);
        }
        w.close();
    }
    envelope(Operation::AuthorizeStart, w)
}

/// Server side: encode an `eRoamingAuthorizationStop` answer.
pub fn build_authorization_stop(result: &AuthorizationStop) -> WireEnvelope {
    let mut w = super::begin(AUTHORIZATION);
    w.open("Authorization:eRoamingAuthorizationStop");
    write_result_ids(
        &mut w,
        result.session_id.as_ref(),
        result.partner_session_id.as_ref(),
        result.provider_id.as_ref(),
    );
    w.opt_leaf(
        "Authorization:AuthorizationStatus",
        result.authorization_status.as_deref(),
    );
    write_status_code(&mut w, "Authorization:StatusCode", &result.status_code);
    envelope(Operation::AuthorizeStop, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthorizationOutcome, EvcoId, StatusCode, Uid};

    fn start_request() -> AuthorizeStartRequest {
        AuthorizeStartRequest::new(
            OperatorId::parse("DE*GEF").unwrap(),
            Identification::RfidMifareFamily(Uid::parse("AABBCCDD").unwrap()),
        )
        .with_evse(EvseId::parse("DE*GEF*E1234*1").unwrap())
    }

    #[test]
    fn absent_fields_are_omitted() {
        let envelope = build_authorize_start(&start_request());
        let body = &envelope.body;

        assert!(body.contains("<Authorization:OperatorID>DE*GEF</Authorization:OperatorID>"));
        assert!(body.contains("<Authorization:EVSEID>DE*GEF*E1234*1</Authorization:EVSEID>"));
        assert!(body.contains("<CommonTypes:UID>AABBCCDD</CommonTypes:UID>"));
        assert!(!body.contains("SessionID"));
        assert!(!body.contains("PartnerProductID"));
        assert_eq!(envelope.soap_action, Some("eRoamingAuthorizeStart"));
        assert_eq!(envelope.path, "/ibis/ws/eRoamingAuthorization_V2.0");
    }

    #[test]
    fn inbound_start_request_round_trips() {
        let request = start_request()
            .with_partner_session(PartnerSessionId::parse("cpo-42").unwrap())
            .with_product(PartnerProductId::parse("AC1").unwrap());
        let envelope = build_authorize_start(&request);

        assert_eq!(parse_authorize_start_request(&envelope.body).unwrap(), request);
    }

    #[test]
    fn stop_request_requires_session() {
        let raw = r#"<Envelope><Body><eRoamingAuthorizeStop>
              <OperatorID>DE*GEF</OperatorID>
              <Identification><RFIDIdentification><UID>AABBCCDD</UID></RFIDIdentification></Identification>
            </eRoamingAuthorizeStop></Body></Envelope>"#;
        let err = parse_authorize_stop_request(raw).unwrap_err();
        assert!(err.reason.contains("SessionID"));
    }

    #[test]
    fn authorization_start_keeps_raw_status_and_stop_ids() {
        let mut result = AuthorizationStart::new(AuthorizationOutcome::Authorized, StatusCode::success());
        result.session_id = Some(SessionId::new_random());
        result.provider_id = Some(ProviderId::parse("DE*ICE").unwrap());
        result.authorization_stop_identifications = vec![
            Identification::RfidId(Uid::parse("11223344").unwrap()),
            Identification::Remote(EvcoId::parse("DE*ICE*123456*X").unwrap()),
        ];

        let envelope = build_authorization_start(&result);
        let decoded = parse_authorization_start(Operation::AuthorizeStart, &envelope.body).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn unexpected_status_text_is_preserved() {
        let raw = r#"<Envelope><Body><eRoamingAuthorizationStop>
              <AuthorizationStatus>authorized</AuthorizationStatus>
              <StatusCode><Code>400</Code><Description>Session is invalid</Description></StatusCode>
            </eRoamingAuthorizationStop></Body></Envelope>"#;
        let stop = parse_authorization_stop(Operation::AuthorizeStop, raw).unwrap();
        assert_eq!(stop.authorization_status.as_deref(), Some("authorized"));
        assert_eq!(stop.status_code.code, 400);
    }

    #[test]
    fn wrong_payload_is_a_decode_error() {
        let ack = crate::codec::soap::common::build_acknowledgement(
            Operation::AuthorizeStart,
            &crate::domain::Acknowledgement::success(),
        );
        let err = parse_authorization_start(Operation::AuthorizeStart, &ack.body).unwrap_err();
        assert!(err.reason.contains("eRoamingAuthorizationStart"));
        assert_eq!(err.raw_body, ack.body);
    }
}
