//! eRoamingChargeDetailRecord

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use super::common::{parse_identification, write_identification};
use super::{expect_payload, parse_document, AUTHORIZATION};
use crate::codec::xml;
use crate::codec::{DecodeResult, Operation, WireEnvelope, WireFormat};
use crate::domain::{
    ChargeDetailRecord, EvseId, HubOperatorId, HubProviderId, PartnerProductId, PartnerSessionId,
    SessionId,
};

pub(crate) fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

pub fn build_charge_detail_record(cdr: &ChargeDetailRecord) -> WireEnvelope {
    let mut w = super::begin(AUTHORIZATION);
    w.open("Authorization:eRoamingChargeDetailRecord")
        .leaf("Authorization:SessionID", cdr.session_id.as_str())
        .opt_leaf(
            "Authorization:PartnerSessionID",
            cdr.partner_session_id.as_ref().map(|s| s.as_str()),
        )
        .opt_leaf(
            "Authorization:PartnerProductID",
            cdr.partner_product_id.as_ref().map(|p| p.as_str()),
        )
        .leaf("Authorization:EvseID", cdr.evse_id.to_string());
    write_identification(&mut w, "Authorization:Identification", &cdr.identification);
    w.opt_leaf("Authorization:ChargingStart", cdr.charging_start.as_ref().map(timestamp))
        .opt_leaf("Authorization:ChargingEnd", cdr.charging_end.as_ref().map(timestamp))
        .leaf("Authorization:SessionStart", timestamp(&cdr.session_start))
        .leaf("Authorization:SessionEnd", timestamp(&cdr.session_end))
        .opt_leaf(
            "Authorization:MeterValueStart",
            cdr.meter_value_start.map(|v| v.to_string()),
        )
        .opt_leaf(
            "Authorization:MeterValueEnd",
            cdr.meter_value_end.map(|v| v.to_string()),
        );
    if !cdr.meter_values_in_between.is_empty() {
        w.open("Authorization:MeterValueInBetween");
        for value in &cdr.meter_values_in_between {
            w.leaf("Authorization:MeterValue", value.to_string());
        }
        w.close();
    }
    w.opt_leaf(
        "Authorization:ConsumedEnergy",
        cdr.consumed_energy.map(|v| v.to_string()),
    )
    .opt_leaf(
        "Authorization:MeteringSignature",
        cdr.metering_signature.as_deref(),
    )
    .opt_leaf(
        "Authorization:HubOperatorID",
        cdr.hub_operator_id.as_ref().map(|id| id.to_string()),
    )
    .opt_leaf(
        "Authorization:HubProviderID",
        cdr.hub_provider_id.as_ref().map(|id| id.to_string()),
    );

    WireEnvelope::new(
        Operation::SendChargeDetailRecord,
        WireFormat::Soap,
        Operation::SendChargeDetailRecord.soap_path().to_string(),
        w.finish(),
    )
}

/// Server side: decode an inbound `eRoamingChargeDetailRecord`.
pub fn parse_charge_detail_record(raw: &str) -> DecodeResult<ChargeDetailRecord> {
    let op = Operation::SendChargeDetailRecord;
    let doc = parse_document(op, raw)?;
    let node = expect_payload(op, raw, &doc, "eRoamingChargeDetailRecord")?;
    let identification = parse_identification(
        op,
        raw,
        &xml::require_child(op, raw, &node, "Identification")?,
    )?;
    let meter_values_in_between = match xml::child(&node, "MeterValueInBetween") {
        Some(list) => xml::children(&list, "MeterValue")
            .map(|v| {
                let text = v.text().unwrap_or_default().trim();
                Decimal::from_str(text).map_err(|e| {
                    crate::codec::DecodeError::new(op, format!("<MeterValue>: {}", e), raw)
                })
            })
            .collect::<DecodeResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(ChargeDetailRecord {
        session_id: xml::parse_req(op, raw, &node, "SessionID", SessionId::parse)?,
        partner_session_id: xml::parse_opt(
            op,
            raw,
            &node,
            "PartnerSessionID",
            PartnerSessionId::parse,
        )?,
        partner_product_id: xml::parse_opt(
            op,
            raw,
            &node,
            "PartnerProductID",
            PartnerProductId::parse,
        )?,
        evse_id: xml::parse_req(op, raw, &node, "EvseID", EvseId::parse)?,
        identification,
        charging_start: xml::parse_opt(op, raw, &node, "ChargingStart", parse_timestamp)?,
        charging_end: xml::parse_opt(op, raw, &node, "ChargingEnd", parse_timestamp)?,
        session_start: xml::parse_req(op, raw, &node, "SessionStart", parse_timestamp)?,
        session_end: xml::parse_req(op, raw, &node, "SessionEnd", parse_timestamp)?,
        meter_value_start: xml::parse_opt(op, raw, &node, "MeterValueStart", Decimal::from_str)?,
        meter_value_end: xml::parse_opt(op, raw, &node, "MeterValueEnd", Decimal::from_str)?,
        meter_values_in_between,
        consumed_energy: xml::parse_opt(op, raw, &node, "ConsumedEnergy", Decimal::from_str)?,
        metering_signature: xml::child_text(&node, "MeteringSignature").map(str::to_string),
        hub_operator_id: xml::parse_opt(op, raw, &node, "HubOperatorID", HubOperatorId::parse)?,
        hub_provider_id: xml::parse_opt(op, raw, &node, "HubProviderID", HubProviderId::parse)?,
    })
}
