//! CommonTypes blocks: identification, status code and acknowledgement

use roxmltree::Node;

use super::{parse_document, AUTHORIZATION};
use crate::codec::xml::{self, XmlWriter};
use crate::codec::{DecodeError, DecodeResult, Operation, WireEnvelope, WireFormat};
use crate::domain::{
    Acknowledgement, EvcoId, Identification, PartnerSessionId, ProviderId, SessionId, StatusCode,
    Uid,
};

/// `<wrapper>` containing one identification variant.
pub fn write_identification(w: &mut XmlWriter, wrapper: &'static str, id: &Identification) {
    w.open(wrapper);
    match id {
        Identification::RfidMifareFamily(uid) => {
            w.open("CommonTypes:RFIDmifarefamilyIdentification")
                .leaf("CommonTypes:UID", uid.as_str())
                .close();
        }
        Identification::RfidId(uid) => {
            w.open("CommonTypes:RFIDIdentification")
                .leaf("CommonTypes:UID", uid.as_str())
                .close();
        }
        Identification::QrCode {
            evco_id,
            hashed_pin,
        } => {
            w.open("CommonTypes:QRCodeIdentification")
                .leaf("CommonTypes:EVCOID", evco_id.to_string());
            if let Some(pin) = hashed_pin {
                w.open("CommonTypes:HashedPIN")
                    .leaf("CommonTypes:Value", pin)
                    .leaf("CommonTypes:Function", "Bcrypt")
                    .close();
            }
            w.close();
        }
        Identification::PlugAndCharge(evco_id) => {
            w.open("CommonTypes:PlugAndChargeIdentification")
                .leaf("CommonTypes:EVCOID", evco_id.to_string())
                .close();
        }
        Identification::Remote(evco_id) => {
            w.open("CommonTypes:RemoteIdentification")
                .leaf("CommonTypes:EVCOID", evco_id.to_string())
                .close();
        }
    }
    w.close();
}

/// Decode the variant element inside an identification wrapper.
pub fn parse_identification(
    operation: Operation,
    raw: &str,
    wrapper: &Node<'_, '_>,
) -> DecodeResult<Identification> {
    let variant = xml::first_element(wrapper)
        .ok_or_else(|| DecodeError::new(operation, "empty identification", raw))?;
    let name = variant.tag_name().name();
    let evco = |node: &Node<'_, '_>| xml::parse_req(operation, raw, node, "EVCOID", EvcoId::parse);
    let uid = |node: &Node<'_, '_>| xml::parse_req(operation, raw, node, "UID", Uid::parse);

    if name.eq_ignore_ascii_case("RFIDMifareFamilyIdentification") {
        Ok(Identification::RfidMifareFamily(uid(&variant)?))
    } else if name.eq_ignore_ascii_case("RFIDIdentification") {
        Ok(Identification::RfidId(uid(&variant)?))
    } else if name.eq_ignore_ascii_case("QRCodeIdentification") {
        let hashed_pin = xml::child(&variant, "HashedPIN")
            .and_then(|pin| xml::child_text(&pin, "Value"))
            .or_else(|| xml::child_text(&variant, "PIN"))
            .map(str::to_string);
        Ok(Identification::QrCode {
            evco_id: evco(&variant)?,
            hashed_pin,
        })
    } else if name.eq_ignore_ascii_case("PlugAndChargeIdentification") {
        Ok(Identification::PlugAndCharge(evco(&variant)?))
    } else if name.eq_ignore_ascii_case("RemoteIdentification") {
        Ok(Identification::Remote(evco(&variant)?))
    } else {
        Err(DecodeError::new(
            operation,
            format!("unknown identification <{}>", name),
            raw,
        ))
    }
}

pub fn write_status_code(w: &mut XmlWriter, wrapper: &'static str, status: &StatusCode) {
    w.open(wrapper)
        .leaf("CommonTypes:Code", status.wire_code())
        .opt_leaf("CommonTypes:Description", status.description.as_deref())
        .opt_leaf("CommonTypes:AdditionalInfo", status.additional_info.as_deref())
        .close();
}

pub fn parse_status_code(
    operation: Operation,
    raw: &str,
    parent: &Node<'_, '_>,
) -> DecodeResult<StatusCode> {
    let node = xml::require_child(operation, raw, parent, "StatusCode")?;
    let code = xml::parse_req(operation, raw, &node, "Code", |text| {
        StatusCode::parse_code(text).ok_or_else(|| format!("invalid status code '{}'", text))
    })?;
    Ok(StatusCode {
        code,
        description: xml::child_text(&node, "Description").map(str::to_string),
        additional_info: xml::child_text(&node, "AdditionalInfo").map(str::to_string),
    })
}

/// Session identifiers echoed in a result block.
pub fn parse_session_ids(
    operation: Operation,
    raw: &str,
    node: &Node<'_, '_>,
) -> DecodeResult<(Option<SessionId>, Option<PartnerSessionId>, Option<ProviderId>)> {
    Ok((
        xml::parse_opt(operation, raw, node, "SessionID", SessionId::parse)?,
        xml::parse_opt(operation, raw, node, "PartnerSessionID", PartnerSessionId::parse)?,
        xml::parse_opt(operation, raw, node, "ProviderID", ProviderId::parse)?,
    ))
}

/// Client side: decode `eRoamingAcknowledgement`.
pub fn parse_acknowledgement(operation: Operation, raw: &str) -> DecodeResult<Acknowledgement> {
    let doc = parse_document(operation, raw)?;
    let payload = super::expect_payload(operation, raw, &doc, "eRoamingAcknowledgement")?;

    let result = xml::parse_req(operation, raw, &payload, "Result", xml::parse_bool)?;
    let status_code = parse_status_code(operation, raw, &payload)?;
    let (session_id, partner_session_id, provider_id) =
        parse_session_ids(operation, raw, &payload)?;

    Ok(Acknowledgement {
        result,
        status_code,
        session_id,
        partner_session_id,
        provider_id,
    })
}

/// Server side: answer any request with an acknowledgement.
pub fn build_acknowledgement(operation: Operation, ack: &Acknowledgement) -> WireEnvelope {
    let mut w = super::begin(AUTHORIZATION);
    w.open("CommonTypes:eRoamingAcknowledgement")
        .leaf("CommonTypes:Result", if ack.result { "true" } else { "false" });
    write_status_code(&mut w, "CommonTypes:StatusCode", &ack.status_code);
    w.opt_leaf("CommonTypes:SessionID", ack.session_id.as_ref().map(|s| s.as_str()))
        .opt_leaf(
            "CommonTypes:PartnerSessionID",
            ack.partner_session_id.as_ref().map(|s| s.as_str()),
        );
    WireEnvelope::new(
        operation,
        WireFormat::Soap,
        operation.soap_path().to_string(),
        w.finish(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_decodes_status_and_session() {
        let session = SessionId::new_random();
        let ack = Acknowledgement {
            result: false,
            status_code: StatusCode::new(300, "Partner not found").with_additional_info("DE*XYZ"),
            session_id: Some(session.clone()),
            partner_session_id: None,
            provider_id: None,
        };
        let envelope = build_acknowledgement(Operation::AuthorizeRemoteStart, &ack);
        let decoded = parse_acknowledgement(Operation::AuthorizeRemoteStart, &envelope.body).unwrap();

        assert!(!decoded.result);
        assert_eq!(decoded.status_code.code, 300);
        assert_eq!(decoded.status_code.additional_info.as_deref(), Some("DE*XYZ"));
        assert_eq!(decoded.session_id, Some(session));
    }

    #[test]
    fn hub_prefixes_are_irrelevant() {
        let raw = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" xmlns:c="urn:c">
            <s:Body>
              <c:eRoamingAcknowledgement>
                <c:Result>true</c:Result>
                <c:StatusCode><c:Code>000</c:Code></c:StatusCode>
              </c:eRoamingAcknowledgement>
            </s:Body>
          </s:Envelope>"#;
        let ack = parse_acknowledgement(Operation::PushEvseData, raw).unwrap();
        assert!(ack.is_success());
        assert_eq!(ack.status_code.description, None);
    }

    #[test]
    fn missing_status_code_fails_with_raw_body() {
        let raw = r#"<Envelope><Body><eRoamingAcknowledgement><Result>true</Result></eRoamingAcknowledgement></Body></Envelope>"#;
        let err = parse_acknowledgement(Operation::PushEvseStatus, raw).unwrap_err();
        assert_eq!(err.operation, Operation::PushEvseStatus);
        assert_eq!(err.raw_body, raw);
        assert!(err.reason.contains("StatusCode"));
    }

    #[test]
    fn identification_variants_decode() {
        let raw = r#"<Envelope><Body><W>
              <QRCodeIdentification><EVCOID>DE*ICE*123456*X</EVCOID><HashedPIN><Value>abc</Value></HashedPIN></QRCodeIdentification>
            </W></Body></Envelope>"#;
        let doc = roxmltree::Document::parse(raw).unwrap();
        let wrapper = doc.descendants().find(|n| n.tag_name().name() == "W").unwrap();
        let id = parse_identification(Operation::AuthorizeStart, raw, &wrapper).unwrap();
        assert_eq!(
            id,
            Identification::QrCode {
                evco_id: EvcoId::parse("DE*ICE*123456*X").unwrap(),
                hashed_pin: Some("abc".into()),
            }
        );
    }

    #[test]
    fn unknown_identification_is_rejected() {
        let raw = "<W><FingerprintIdentification/></W>";
        let doc = roxmltree::Document::parse(raw).unwrap();
        let err = parse_identification(Operation::AuthorizeStart, raw, &doc.root_element())
            .unwrap_err();
        assert!(err.reason.contains("FingerprintIdentification"));
    }
}
