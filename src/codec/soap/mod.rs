//! SOAP 1.1 dialect
//!
//! Every message is wrapped in an envelope with an empty header. Element
//! prefixes follow the hub's own schema names; decoding ignores prefixes.

pub mod authorization;
pub mod cdr;
pub mod common;
pub mod evse;
pub mod remote;

use roxmltree::{Document, Node};

use super::xml::{self, XmlWriter};
use super::{DecodeError, DecodeResult, FaultEnvelope, Operation};

pub const NS_SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const NS_COMMON_TYPES: &str = "http://www.hubject.com/b2b/services/commontypes/v2.0";
pub const NS_AUTHORIZATION: &str = "http://www.hubject.com/b2b/services/authorization/v2.0";
pub const NS_EVSE_DATA: &str = "http://www.hubject.com/b2b/services/evsedata/v2.0";
pub const NS_EVSE_STATUS: &str = "http://www.hubject.com/b2b/services/evsestatus/v2.0";
pub const NS_RESERVATION: &str = "http://www.hubject.com/b2b/services/reservation/v1.0";

/// Namespace bindings of one message family.
#[derive(Debug, Clone, Copy)]
pub struct Family {
    pub prefix: &'static str,
    pub uri: &'static str,
}

pub const AUTHORIZATION: Family = Family {
    prefix: "Authorization",
    uri: NS_AUTHORIZATION,
};
pub const EVSE_DATA: Family = Family {
    prefix: "EVSEData",
    uri: NS_EVSE_DATA,
};
pub const EVSE_STATUS: Family = Family {
    prefix: "EVSEStatus",
    uri: NS_EVSE_STATUS,
};
pub const RESERVATION: Family = Family {
    prefix: "Reservation",
    uri: NS_RESERVATION,
};

/// Start an envelope for `family` and leave the writer inside `<soapenv:Body>`.
pub fn begin(family: Family) -> XmlWriter {
    let mut w = XmlWriter::new();
    let family_attr = format!("xmlns:{}", family.prefix);
    w.declaration().open_with(
        "soapenv:Envelope",
        &[
            ("xmlns:soapenv", NS_SOAP_ENV),
            (family_attr.as_str(), family.uri),
            ("xmlns:CommonTypes", NS_COMMON_TYPES),
        ],
    );
    w.empty("soapenv:Header");
    w.open("soapenv:Body");
    w
}

/// Parse a SOAP document; the caller then asks for [`body_payload`].
pub fn parse_document(operation: Operation, raw: &str) -> DecodeResult<Document<'_>> {
    Document::parse(raw)
        .map_err(|e| DecodeError::new(operation, format!("malformed XML: {}", e), raw))
}

/// The single payload element inside `Envelope/Body`.
pub fn body_payload<'a, 'input>(
    operation: Operation,
    raw: &str,
    doc: &'a Document<'input>,
) -> DecodeResult<Node<'a, 'input>> {
    let root = doc.root_element();
    if !xml::is(&root, "Envelope") {
        return Err(DecodeError::new(
            operation,
            format!("expected <Envelope>, found <{}>", root.tag_name().name()),
            raw,
        ));
    }
    let body = xml::require_child(operation, raw, &root, "Body")?;
    xml::first_element(&body)
        .ok_or_else(|| DecodeError::new(operation, "empty SOAP body", raw))
}

/// Like [`body_payload`] but also checks the payload element name.
pub fn expect_payload<'a, 'input>(
    operation: Operation,
    raw: &str,
    doc: &'a Document<'input>,
    local: &str,
) -> DecodeResult<Node<'a, 'input>> {
    let payload = body_payload(operation, raw, doc)?;
    if !xml::is(&payload, local) {
        return Err(DecodeError::new(
            operation,
            format!(
                "expected <{}>, found <{}>",
                local,
                payload.tag_name().name()
            ),
            raw,
        ));
    }
    Ok(payload)
}

/// A `Fault` element in the envelope body, if any.
pub fn detect_fault(raw: &str) -> Option<FaultEnvelope> {
    let doc = Document::parse(raw).ok()?;
    let root = doc.root_element();
    if !xml::is(&root, "Envelope") {
        return None;
    }
    let body = xml::child(&root, "Body")?;
    let fault = xml::child(&body, "Fault")?;
    let reason = xml::child_text(&fault, "faultstring")
        .or_else(|| xml::child_text(&fault, "faultcode"))
        .unwrap_or("SOAP fault")
        .to_string();
    Some(FaultEnvelope { reason })
}

/// Server side: a `soapenv:Fault` answer for a request that could not be
/// handled.
pub fn build_fault(fault_code: &str, fault_string: &str) -> String {
    let mut w = XmlWriter::new();
    w.declaration()
        .open_with("soapenv:Envelope", &[("xmlns:soapenv", NS_SOAP_ENV)]);
    w.empty("soapenv:Header");
    w.open("soapenv:Body")
        .open("soapenv:Fault")
        .leaf("faultcode", fault_code)
        .leaf("faultstring", fault_string);
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_binds_family_namespaces() {
        let mut w = begin(EVSE_STATUS);
        w.leaf("EVSEStatus:Probe", "x");
        let xml = w.finish();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("xmlns:EVSEStatus=\"http://www.hubject.com/b2b/services/evsestatus/v2.0\""));
        assert!(xml.contains("<soapenv:Header/>"));

        let doc = Document::parse(&xml).unwrap();
        let payload = body_payload(Operation::PushEvseStatus, &xml, &doc).unwrap();
        assert_eq!(payload.tag_name().name(), "Probe");
        assert_eq!(payload.tag_name().namespace(), Some(NS_EVSE_STATUS));
    }

    #[test]
    fn fault_round_trip() {
        let xml = build_fault("soapenv:Client", "Unknown SOAPAction");
        let fault = detect_fault(&xml).unwrap();
        assert_eq!(fault.reason, "Unknown SOAPAction");
    }

    #[test]
    fn non_fault_bodies_are_not_faults() {
        let mut w = begin(AUTHORIZATION);
        w.leaf("CommonTypes:eRoamingAcknowledgement", "");
        assert!(detect_fault(&w.finish()).is_none());
        assert!(detect_fault("not xml").is_none());
        assert!(detect_fault("<html><body>Fault</body></html>").is_none());
    }

    #[test]
    fn wrong_root_is_a_decode_error() {
        let raw = "<html/>";
        let doc = Document::parse(raw).unwrap();
        let err = body_payload(Operation::AuthorizeStart, raw, &doc).unwrap_err();
        assert_eq!(err.raw_body, raw);
        assert!(err.reason.contains("Envelope"));
    }
}
