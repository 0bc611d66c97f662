//! eRoamingPushEvseData / eRoamingPushEvseStatus

use super::{EVSE_DATA, EVSE_STATUS};
use crate::codec::records::format_geo;
use crate::codec::xml::XmlWriter;
use crate::codec::{Operation, WireEnvelope, WireFormat};
use crate::domain::{EvseDataRecord, PushEvseDataRequest, PushEvseStatusRequest};

/// `records` are the already validated subset of `request.records`.
pub fn build_push_evse_data(
    request: &PushEvseDataRequest,
    records: &[&EvseDataRecord],
) -> WireEnvelope {
    let mut w = super::begin(EVSE_DATA);
    w.open("EVSEData:eRoamingPushEvseData")
        .leaf("EVSEData:ActionType", request.action.as_str())
        .open("EVSEData:OperatorEvseData")
        .leaf("EVSEData:OperatorID", request.operator_id.to_string())
        .opt_leaf("EVSEData:OperatorName", request.operator_name.as_deref());
    for record in records {
        write_record(&mut w, record);
    }

    WireEnvelope::new(
        Operation::PushEvseData,
        WireFormat::Soap,
        Operation::PushEvseData.soap_path().to_string(),
        w.finish(),
    )
}

fn write_record(w: &mut XmlWriter, record: &EvseDataRecord) {
    w.open("EVSEData:EvseDataRecord")
        .leaf("EVSEData:EvseId", record.evse_id.to_string())
        .opt_leaf(
            "EVSEData:ChargingPoolId",
            record.charging_pool_id.as_ref().map(|id| id.as_str()),
        )
        .opt_leaf(
            "EVSEData:ChargingStationId",
            record.charging_station_id.as_ref().map(|id| id.as_str()),
        )
        .opt_leaf(
            "EVSEData:ChargingStationName",
            record.charging_station_name.as_deref(),
        );

    let address = &record.address;
    w.open("EVSEData:Address")
        .leaf("CommonTypes:Country", &address.country)
        .leaf("CommonTypes:City", &address.city)
        .leaf("CommonTypes:Street", &address.street)
        .opt_leaf("CommonTypes:PostalCode", address.postal_code.as_deref())
        .opt_leaf("CommonTypes:HouseNum", address.house_number.as_deref())
        .opt_leaf("CommonTypes:Floor", address.floor.as_deref())
        .opt_leaf("CommonTypes:Region", address.region.as_deref())
        .opt_leaf("CommonTypes:TimeZone", address.time_zone.as_deref())
        .close();

    let (latitude, longitude) = format_geo(&record.geo_coordinates);
    w.open("EVSEData:GeoCoordinates")
        .open("CommonTypes:DecimalDegree")
        .leaf("CommonTypes:Longitude", longitude)
        .leaf("CommonTypes:Latitude", latitude)
        .close()
        .close();

    if !record.plugs.is_empty() {
        w.open("EVSEData:Plugs");
        for name in record.plugs.iter().filter_map(|p| p.wire_name()) {
            w.leaf("EVSEData:Plug", name);
        }
        w.close();
    }

    if !record.charging_facilities.is_empty() {
        w.open("EVSEData:ChargingFacilities");
        for facility in &record.charging_facilities {
            w.open("EVSEData:ChargingFacility")
                .leaf("EVSEData:PowerType", &facility.power_type)
                .opt_leaf("EVSEData:Power", facility.power_kw.map(|p| p.to_string()))
                .opt_leaf("EVSEData:Voltage", facility.voltage.map(|v| v.to_string()))
                .opt_leaf("EVSEData:Amperage", facility.amperage.map(|a| a.to_string()))
                .close();
        }
        w.close();
    }

    if !record.authentication_modes.is_empty() {
        w.open("EVSEData:AuthenticationModes");
        for mode in &record.authentication_modes {
            w.leaf("EVSEData:AuthenticationMode", mode.as_str());
        }
        w.close();
    }

    if !record.payment_options.is_empty() {
        w.open("EVSEData:PaymentOptions");
        for option in &record.payment_options {
            w.leaf("EVSEData:PaymentOption", option);
        }
        w.close();
    }

    w.opt_leaf("EVSEData:Accessibility", record.accessibility.as_deref())
        .opt_leaf(
            "EVSEData:HotlinePhoneNum",
            record.hotline_phone_number.as_deref(),
        )
        .opt_leaf("EVSEData:AdditionalInfo", record.additional_info.as_deref())
        .leaf("EVSEData:IsOpen24Hours", bool_text(record.is_open_24_hours));
    if !record.is_open_24_hours {
        w.opt_leaf("EVSEData:OpeningTime", record.opening_times.as_deref());
    }
    w.opt_leaf(
        "EVSEData:HubOperatorID",
        record.hub_operator_id.as_ref().map(|id| id.to_string()),
    )
    .leaf(
        "EVSEData:IsHubjectCompatible",
        bool_text(record.is_hubject_compatible),
    )
    .leaf(
        "EVSEData:DynamicInfoAvailable",
        bool_text(record.dynamic_info_available),
    )
    .close();
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn build_push_evse_status(request: &PushEvseStatusRequest) -> WireEnvelope {
    let mut w = super::begin(EVSE_STATUS);
    w.open("EVSEStatus:eRoamingPushEvseStatus")
        .leaf("EVSEStatus:ActionType", request.action.as_str())
        .open("EVSEStatus:OperatorEvseStatus")
        .leaf("EVSEStatus:OperatorID", request.operator_id.to_string())
        .opt_leaf("EVSEStatus:OperatorName", request.operator_name.as_deref());
    for record in &request.records {
        w.open("EVSEStatus:EvseStatusRecord")
            .leaf("EVSEStatus:EvseId", record.evse_id.to_string())
            .leaf("EVSEStatus:EvseStatus", record.status.as_str())
            .close();
    }

    WireEnvelope::new(
        Operation::PushEvseStatus,
        WireFormat::Soap,
        Operation::PushEvseStatus.soap_path().to_string(),
        w.finish(),
    )
}

#[cfg(test)]
mod tests {
    use roxmltree::Document;

    use super::*;
    use crate::codec::{build_push_evse_data as build_batch, WireFormat};
    use crate::domain::{
        ActionType, Address, EvseId, EvseStatus, EvseStatusRecord, GeoCoordinates, OperatorId, Plug,
    };

    fn record(id: &str) -> EvseDataRecord {
        let mut record = EvseDataRecord::new(
            EvseId::parse(id).unwrap(),
            Address {
                country: "DEU".into(),
                city: "Jena".into(),
                street: "Leutragraben".into(),
                house_number: Some("1".into()),
                ..Address::default()
            },
            GeoCoordinates::new(50.92812, 11.589612345),
        );
        record.plugs = vec![Plug::Type2Outlet];
        record
    }

    #[test]
    fn batch_with_one_bad_plug_emits_n_minus_one_records() {
        let mut records: Vec<_> = (1..=5).map(|i| record(&format!("DE*GEF*E{}", i))).collect();
        records[2].plugs.push(Plug::Unspecified("???".into()));
        let request =
            PushEvseDataRequest::new(ActionType::FullLoad, OperatorId::parse("DE*GEF").unwrap(), records);

        let batch = build_batch(WireFormat::Soap, &request);
        assert_eq!(batch.emitted, 4);
        assert_eq!(batch.skipped.len(), 1);

        let doc = Document::parse(&batch.envelope.body).unwrap();
        let emitted = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "EvseDataRecord")
            .count();
        assert_eq!(emitted, 4);
        assert!(!batch.envelope.body.contains("DE*GEF*E3"));
    }

    #[test]
    fn data_record_rendering() {
        let request = PushEvseDataRequest::new(
            ActionType::Insert,
            OperatorId::parse("DE*GEF").unwrap(),
            vec![record("DE*GEF*E1")],
        );
        let body = build_batch(WireFormat::Soap, &request).envelope.body;

        assert!(body.contains("<EVSEData:ActionType>insert</EVSEData:ActionType>"));
        assert!(body.contains("<CommonTypes:Latitude>50.92812</CommonTypes:Latitude>"));
        assert!(body.contains("<CommonTypes:Longitude>11.589612</CommonTypes:Longitude>"));
        assert!(body.contains("<EVSEData:Plug>Type 2 Outlet</EVSEData:Plug>"));
        assert!(body.contains("<EVSEData:IsOpen24Hours>true</EVSEData:IsOpen24Hours>"));
        assert!(!body.contains("OpeningTime"));
        assert!(!body.contains("PostalCode"));
        assert!(!body.contains("OperatorName"));
    }

    #[test]
    fn status_push_lists_every_record() {
        let request = PushEvseStatusRequest::new(
            ActionType::Update,
            OperatorId::parse("DE*GEF").unwrap(),
            vec![
                EvseStatusRecord::new(EvseId::parse("DE*GEF*E1").unwrap(), EvseStatus::Available),
                EvseStatusRecord::new(EvseId::parse("DE*GEF*E2").unwrap(), EvseStatus::Occupied),
            ],
        )
        .with_operator_name("GraphDefined");
        let envelope = build_push_evse_status(&request);

        let doc = Document::parse(&envelope.body).unwrap();
        let statuses: Vec<_> = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "EvseStatus")
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(statuses, vec!["Available", "Occupied"]);
        assert!(envelope.body.contains("<EVSEStatus:OperatorName>GraphDefined</EVSEStatus:OperatorName>"));
        assert_eq!(envelope.path, "/ibis/ws/eRoamingEvseStatus_V2.0");
    }
}
