//! JSON dialect
//!
//! PascalCase bodies mirroring the SOAP elements. Absent values are left out
//! of the document (`skip_serializing_if`), never sent as `null`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::records::format_geo;
use super::{DecodeError, DecodeResult, FaultEnvelope, Operation, WireEnvelope, WireFormat};
use crate::domain::{
    Acknowledgement, AuthorizationStart, AuthorizationStop, AuthorizeRemoteReservationStartRequest,
    AuthorizeRemoteReservationStopRequest, AuthorizeRemoteStartRequest, AuthorizeRemoteStopRequest,
    AuthorizeStartRequest, AuthorizeStopRequest, ChargeDetailRecord, EvcoId, EvseDataRecord,
    EvseId, HubOperatorId, HubProviderId, Identification, OperatorId, PartnerProductId,
    PartnerSessionId, ProviderId, PushEvseDataRequest, PushEvseStatusRequest, SessionId,
    StatusCode, Uid,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCodeDto {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl From<&StatusCode> for StatusCodeDto {
    fn from(status: &StatusCode) -> Self {
        Self {
            code: status.wire_code(),
            description: status.description.clone(),
            additional_info: status.additional_info.clone(),
        }
    }
}

impl StatusCodeDto {
    fn into_domain(self) -> Result<StatusCode, String> {
        let code = StatusCode::parse_code(&self.code)
            .ok_or_else(|| format!("invalid status code '{}'", self.code))?;
        Ok(StatusCode {
            code,
            description: self.description,
            additional_info: self.additional_info,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UidDto {
    #[serde(rename = "UID")]
    uid: Uid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvcoDto {
    #[serde(rename = "EvcoID")]
    evco_id: EvcoId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HashedPinDto {
    value: String,
    function: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QrCodeDto {
    #[serde(rename = "EvcoID")]
    evco_id: EvcoId,
    #[serde(rename = "HashedPIN", default, skip_serializing_if = "Option::is_none")]
    hashed_pin: Option<HashedPinDto>,
}

/// Exactly one member is set on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IdentificationDto {
    #[serde(
        rename = "RFIDMifareFamilyIdentification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    rfid_mifare: Option<UidDto>,
    #[serde(rename = "RFIDIdentification", default, skip_serializing_if = "Option::is_none")]
    rfid: Option<UidDto>,
    #[serde(rename = "QRCodeIdentification", default, skip_serializing_if = "Option::is_none")]
    qr_code: Option<QrCodeDto>,
    #[serde(
        rename = "PlugAndChargeIdentification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    plug_and_charge: Option<EvcoDto>,
    #[serde(rename = "RemoteIdentification", default, skip_serializing_if = "Option::is_none")]
    remote: Option<EvcoDto>,
}

impl From<&Identification> for IdentificationDto {
    fn from(id: &Identification) -> Self {
        let mut dto = Self::default();
        match id {
            Identification::RfidMifareFamily(uid) => {
                dto.rfid_mifare = Some(UidDto { uid: uid.clone() })
            }
            Identification::RfidId(uid) => dto.rfid = Some(UidDto { uid: uid.clone() }),
            Identification::QrCode {
                evco_id,
                hashed_pin,
            } => {
                dto.qr_code = Some(QrCodeDto {
                    evco_id: evco_id.clone(),
                    hashed_pin: hashed_pin.as_ref().map(|value| HashedPinDto {
                        value: value.clone(),
                        function: "Bcrypt".to_string(),
                    }),
                })
            }
            Identification::PlugAndCharge(evco_id) => {
                dto.plug_and_charge = Some(EvcoDto {
                    evco_id: evco_id.clone(),
                })
            }
            Identification::Remote(evco_id) => {
                dto.remote = Some(EvcoDto {
                    evco_id: evco_id.clone(),
                })
            }
        }
        dto
    }
}

impl IdentificationDto {
    fn into_domain(self) -> Result<Identification, String> {
        if let Some(UidDto { uid }) = self.rfid_mifare {
            Ok(Identification::RfidMifareFamily(uid))
        } else if let Some(UidDto { uid }) = self.rfid {
            Ok(Identification::RfidId(uid))
        } else if let Some(qr) = self.qr_code {
            Ok(Identification::QrCode {
                evco_id: qr.evco_id,
                hashed_pin: qr.hashed_pin.map(|pin| pin.value),
            })
        } else if let Some(EvcoDto { evco_id }) = self.plug_and_charge {
            Ok(Identification::PlugAndCharge(evco_id))
        } else if let Some(EvcoDto { evco_id }) = self.remote {
            Ok(Identification::Remote(evco_id))
        } else {
            Err("identification carries no known variant".to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorizeStartDto {
    #[serde(rename = "SessionID", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    #[serde(rename = "CPOPartnerSessionID", default, skip_serializing_if = "Option::is_none")]
    partner_session_id: Option<PartnerSessionId>,
    #[serde(rename = "OperatorID")]
    operator_id: OperatorId,
    #[serde(rename = "EvseID", default, skip_serializing_if = "Option::is_none")]
    evse_id: Option<EvseId>,
    #[serde(rename = "Identification")]
    identification: IdentificationDto,
    #[serde(rename = "PartnerProductID", default, skip_serializing_if = "Option::is_none")]
    partner_product_id: Option<PartnerProductId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorizeStopDto {
    #[serde(rename = "SessionID")]
    session_id: SessionId,
    #[serde(rename = "CPOPartnerSessionID", default, skip_serializing_if = "Option::is_none")]
    partner_session_id: Option<PartnerSessionId>,
    #[serde(rename = "OperatorID")]
    operator_id: OperatorId,
    #[serde(rename = "EvseID", default, skip_serializing_if = "Option::is_none")]
    evse_id: Option<EvseId>,
    #[serde(rename = "Identification")]
    identification: IdentificationDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorizationResultDto {
    #[serde(rename = "SessionID", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    #[serde(
        rename = "PartnerSessionID",
        alias = "CPOPartnerSessionID",
        alias = "EMPPartnerSessionID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    partner_session_id: Option<PartnerSessionId>,
    #[serde(rename = "ProviderID", default, skip_serializing_if = "Option::is_none")]
    provider_id: Option<ProviderId>,
    #[serde(rename = "AuthorizationStatus", default, skip_serializing_if = "Option::is_none")]
    authorization_status: Option<String>,
    #[serde(rename = "StatusCode")]
    status_code: StatusCodeDto,
    #[serde(
        rename = "AuthorizationStopIdentifications",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    authorization_stop_identifications: Vec<IdentificationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AcknowledgementDto {
    #[serde(rename = "Result")]
    result: bool,
    #[serde(rename = "StatusCode")]
    status_code: StatusCodeDto,
    #[serde(rename = "SessionID", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    #[serde(
        rename = "PartnerSessionID",
        alias = "CPOPartnerSessionID",
        alias = "EMPPartnerSessionID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    partner_session_id: Option<PartnerSessionId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AddressDto<'a> {
    country: &'a str,
    city: &'a str,
    street: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    house_num: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    floor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DecimalDegreeDto {
    latitude: String,
    longitude: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GeoDto {
    decimal_degree: DecimalDegreeDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChargingFacilityDto<'a> {
    power_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voltage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amperage: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct EvseDataRecordDto<'a> {
    #[serde(rename = "EvseID")]
    evse_id: String,
    #[serde(rename = "ChargingPoolID", skip_serializing_if = "Option::is_none")]
    charging_pool_id: Option<&'a str>,
    #[serde(rename = "ChargingStationID", skip_serializing_if = "Option::is_none")]
    charging_station_id: Option<&'a str>,
    #[serde(rename = "ChargingStationName", skip_serializing_if = "Option::is_none")]
    charging_station_name: Option<&'a str>,
    #[serde(rename = "Address")]
    address: AddressDto<'a>,
    #[serde(rename = "GeoCoordinates")]
    geo_coordinates: GeoDto,
    #[serde(rename = "Plugs", skip_serializing_if = "Vec::is_empty")]
    plugs: Vec<&'static str>,
    #[serde(rename = "ChargingFacilities", skip_serializing_if = "Vec::is_empty")]
    charging_facilities: Vec<ChargingFacilityDto<'a>>,
    #[serde(rename = "AuthenticationModes", skip_serializing_if = "Vec::is_empty")]
    authentication_modes: Vec<&'static str>,
    #[serde(rename = "PaymentOptions", skip_serializing_if = "Vec::is_empty")]
    payment_options: Vec<&'a str>,
    #[serde(rename = "Accessibility", skip_serializing_if = "Option::is_none")]
    accessibility: Option<&'a str>,
    #[serde(rename = "HotlinePhoneNumber", skip_serializing_if = "Option::is_none")]
    hotline_phone_number: Option<&'a str>,
    #[serde(rename = "AdditionalInfo", skip_serializing_if = "Option::is_none")]
    additional_info: Option<&'a str>,
    #[serde(rename = "IsOpen24Hours")]
    is_open_24_hours: bool,
    #[serde(rename = "OpeningTimes", skip_serializing_if = "Option::is_none")]
    opening_times: Option<&'a str>,
    #[serde(rename = "HubOperatorID", skip_serializing_if = "Option::is_none")]
    hub_operator_id: Option<String>,
    #[serde(rename = "IsHubjectCompatible")]
    is_hubject_compatible: bool,
    #[serde(rename = "DynamicInfoAvailable")]
    dynamic_info_available: bool,
}

impl<'a> From<&'a EvseDataRecord> for EvseDataRecordDto<'a> {
    fn from(record: &'a EvseDataRecord) -> Self {
        let address = &record.address;
        let (latitude, longitude) = format_geo(&record.geo_coordinates);
        Self {
            evse_id: record.evse_id.to_string(),
            charging_pool_id: record.charging_pool_id.as_ref().map(|id| id.as_str()),
            charging_station_id: record.charging_station_id.as_ref().map(|id| id.as_str()),
            charging_station_name: record.charging_station_name.as_deref(),
            address: AddressDto {
                country: &address.country,
                city: &address.city,
                street: &address.street,
                postal_code: address.postal_code.as_deref(),
                house_num: address.house_number.as_deref(),
                floor: address.floor.as_deref(),
                region: address.region.as_deref(),
                time_zone: address.time_zone.as_deref(),
            },
            geo_coordinates: GeoDto {
                decimal_degree: DecimalDegreeDto {
                    latitude,
                    longitude,
                },
            },
            plugs: record.plugs.iter().filter_map(|p| p.wire_name()).collect(),
            charging_facilities: record
                .charging_facilities
                .iter()
                .map(|f| ChargingFacilityDto {
                    power_type: &f.power_type,
                    power: f.power_kw,
                    voltage: f.voltage,
                    amperage: f.amperage,
                })
                .collect(),
            authentication_modes: record.authentication_modes.iter().map(|m| m.as_str()).collect(),
            payment_options: record.payment_options.iter().map(String::as_str).collect(),
            accessibility: record.accessibility.as_deref(),
            hotline_phone_number: record.hotline_phone_number.as_deref(),
            additional_info: record.additional_info.as_deref(),
            is_open_24_hours: record.is_open_24_hours,
            opening_times: if record.is_open_24_hours {
                None
            } else {
                record.opening_times.as_deref()
            },
            hub_operator_id: record.hub_operator_id.as_ref().map(|id| id.to_string()),
            is_hubject_compatible: record.is_hubject_compatible,
            dynamic_info_available: record.dynamic_info_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvseStatusRecordDto {
    #[serde(rename = "EvseID")]
    evse_id: EvseId,
    #[serde(rename = "EvseStatus")]
    evse_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChargeDetailRecordDto {
    #[serde(rename = "SessionID")]
    session_id: SessionId,
    #[serde(rename = "CPOPartnerSessionID", default, skip_serializing_if = "Option::is_none")]
    partner_session_id: Option<PartnerSessionId>,
    #[serde(rename = "PartnerProductID", default, skip_serializing_if = "Option::is_none")]
    partner_product_id: Option<PartnerProductId>,
    #[serde(rename = "EvseID")]
    evse_id: EvseId,
    #[serde(rename = "Identification")]
    identification: IdentificationDto,
    #[serde(rename = "ChargingStart", default, skip_serializing_if = "Option::is_none")]
    charging_start: Option<DateTime<Utc>>,
    #[serde(rename = "ChargingEnd", default, skip_serializing_if = "Option::is_none")]
    charging_end: Option<DateTime<Utc>>,
    #[serde(rename = "SessionStart")]
    session_start: DateTime<Utc>,
    #[serde(rename = "SessionEnd")]
    session_end: DateTime<Utc>,
    #[serde(rename = "MeterValueStart", default, skip_serializing_if = "Option::is_none")]
    meter_value_start: Option<Decimal>,
    #[serde(rename = "MeterValueEnd", default, skip_serializing_if = "Option::is_none")]
    meter_value_end: Option<Decimal>,
    #[serde(rename = "MeterValueInBetween", default, skip_serializing_if = "Vec::is_empty")]
    meter_values_in_between: Vec<Decimal>,
    #[serde(rename = "ConsumedEnergy", default, skip_serializing_if = "Option::is_none")]
    consumed_energy: Option<Decimal>,
    #[serde(rename = "MeteringSignature", default, skip_serializing_if = "Option::is_none")]
    metering_signature: Option<String>,
    #[serde(rename = "HubOperatorID", default, skip_serializing_if = "Option::is_none")]
    hub_operator_id: Option<HubOperatorId>,
    #[serde(rename = "HubProviderID", default, skip_serializing_if = "Option::is_none")]
    hub_provider_id: Option<HubProviderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteStartDto {
    #[serde(rename = "SessionID", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    #[serde(rename = "EMPPartnerSessionID", default, skip_serializing_if = "Option::is_none")]
    partner_session_id: Option<PartnerSessionId>,
    #[serde(rename = "ProviderID")]
    provider_id: ProviderId,
    #[serde(rename = "EvseID")]
    evse_id: EvseId,
    #[serde(rename = "Identification")]
    identification: IdentificationDto,
    #[serde(rename = "PartnerProductID", default, skip_serializing_if = "Option::is_none")]
    partner_product_id: Option<PartnerProductId>,
    #[serde(rename = "Duration", default, skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteStopDto {
    #[serde(rename = "SessionID")]
    session_id: SessionId,
    #[serde(rename = "EMPPartnerSessionID", default, skip_serializing_if = "Option::is_none")]
    partner_session_id: Option<PartnerSessionId>,
    #[serde(rename = "ProviderID")]
    provider_id: ProviderId,
    #[serde(rename = "EvseID")]
    evse_id: EvseId,
}

fn to_body<T: Serialize>(value: &T) -> String {
    // Serializing plain structs of strings, numbers and bools cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}

fn envelope<T: Serialize>(operation: Operation, party: &str, dto: &T) -> WireEnvelope {
    WireEnvelope::new(
        operation,
        WireFormat::Json,
        operation.json_path(party),
        to_body(dto),
    )
}

fn from_body<T: DeserializeOwned>(operation: Operation, raw: &str) -> DecodeResult<T> {
    serde_json::from_str(raw).map_err(|e| DecodeError::new(operation, e.to_string(), raw))
}

pub fn build_push_evse_data(request: &PushEvseDataRequest, records: &[&EvseDataRecord]) -> WireEnvelope {
    #[derive(Serialize)]
    struct OperatorEvseData<'a> {
        #[serde(rename = "OperatorID")]
        operator_id: String,
        #[serde(rename = "OperatorName", skip_serializing_if = "Option::is_none")]
        operator_name: Option<&'a str>,
        #[serde(rename = "EvseDataRecord")]
        records: Vec<EvseDataRecordDto<'a>>,
    }

    #[derive(Serialize)]
    struct Body<'a> {
        #[serde(rename = "ActionType")]
        action: &'static str,
        #[serde(rename = "OperatorEvseData")]
        data: OperatorEvseData<'a>,
    }

    let operator = request.operator_id.to_string();
    let body = Body {
        action: request.action.as_str(),
        data: OperatorEvseData {
            operator_id: operator.clone(),
            operator_name: request.operator_name.as_deref(),
            records: records.iter().map(|r| EvseDataRecordDto::from(*r)).collect(),
        },
    };
    envelope(Operation::PushEvseData, &operator, &body)
}

pub fn build_push_evse_status(request: &PushEvseStatusRequest) -> WireEnvelope {
    #[derive(Serialize)]
    struct OperatorEvseStatus<'a> {
        #[serde(rename = "OperatorID")]
        operator_id: String,
        #[serde(rename = "OperatorName", skip_serializing_if = "Option::is_none")]
        operator_name: Option<&'a str>,
        #[serde(rename = "EvseStatusRecord")]
        records: Vec<EvseStatusRecordDto>,
    }

    #[derive(Serialize)]
    struct Body<'a> {
        #[serde(rename = "ActionType")]
        action: &'static str,
        #[serde(rename = "OperatorEvseStatus")]
        status: OperatorEvseStatus<'a>,
    }

    let operator = request.operator_id.to_string();
    let body = Body {
        action: request.action.as_str(),
        status: OperatorEvseStatus {
            operator_id: operator.clone(),
            operator_name: request.operator_name.as_deref(),
            records: request
                .records
                .iter()
                .map(|r| EvseStatusRecordDto {
                    evse_id: r.evse_id.clone(),
                    evse_status: r.status.as_str().to_string(),
                })
                .collect(),
        },
    };
    envelope(Operation::PushEvseStatus, &operator, &body)
}

pub fn build_authorize_start(request: &AuthorizeStartRequest) -> WireEnvelope {
    let dto = AuthorizeStartDto {
        session_id: request.session_id.clone(),
        partner_session_id: request.partner_session_id.clone(),
        operator_id: request.operator_id.clone(),
        evse_id: request.evse_id.clone(),
        identification: (&request.identification).into(),
        partner_product_id: request.partner_product_id.clone(),
    };
    envelope(Operation::AuthorizeStart, &request.operator_id.to_string(), &dto)
}

pub fn build_authorize_stop(request: &AuthorizeStopRequest) -> WireEnvelope {
    let dto = AuthorizeStopDto {
        session_id: request.session_id.clone(),
        partner_session_id: request.partner_session_id.clone(),
        operator_id: request.operator_id.clone(),
        evse_id: request.evse_id.clone(),
        identification: (&request.identification).into(),
    };
    envelope(Operation::AuthorizeStop, &request.operator_id.to_string(), &dto)
}

pub fn build_charge_detail_record(cdr: &ChargeDetailRecord) -> WireEnvelope {
    let dto = ChargeDetailRecordDto {
        session_id: cdr.session_id.clone(),
        partner_session_id: cdr.partner_session_id.clone(),
        partner_product_id: cdr.partner_product_id.clone(),
        evse_id: cdr.evse_id.clone(),
        identification: (&cdr.identification).into(),
        charging_start: cdr.charging_start,
        charging_end: cdr.charging_end,
        session_start: cdr.session_start,
        session_end: cdr.session_end,
        meter_value_start: cdr.meter_value_start,
        meter_value_end: cdr.meter_value_end,
        meter_values_in_between: cdr.meter_values_in_between.clone(),
        consumed_energy: cdr.consumed_energy,
        metering_signature: cdr.metering_signature.clone(),
        hub_operator_id: cdr.hub_operator_id.clone(),
        hub_provider_id: cdr.hub_provider_id.clone(),
    };
    envelope(
        Operation::SendChargeDetailRecord,
        &cdr.evse_id.operator_id().to_string(),
        &dto,
    )
}

fn remote_start_dto(
    session_id: &Option<SessionId>,
    partner_session_id: &Option<PartnerSessionId>,
    provider_id: &ProviderId,
    evse_id: &EvseId,
    identification: &Identification,
    partner_product_id: &Option<PartnerProductId>,
    duration: Option<u32>,
) -> RemoteStartDto {
    RemoteStartDto {
        session_id: session_id.clone(),
        partner_session_id: partner_session_id.clone(),
        provider_id: provider_id.clone(),
        evse_id: evse_id.clone(),
        identification: identification.into(),
        partner_product_id: partner_product_id.clone(),
        duration,
    }
}

pub fn build_remote_start(request: &AuthorizeRemoteStartRequest) -> WireEnvelope {
    let dto = remote_start_dto(
        &request.session_id,
        &request.partner_session_id,
        &request.provider_id,
        &request.evse_id,
        &request.identification,
        &request.partner_product_id,
        None,
    );
    envelope(Operation::AuthorizeRemoteStart, &request.provider_id.to_string(), &dto)
}

pub fn build_reservation_start(request: &AuthorizeRemoteReservationStartRequest) -> WireEnvelope {
    let dto = remote_start_dto(
        &request.session_id,
        &request.partner_session_id,
        &request.provider_id,
        &request.evse_id,
        &request.identification,
        &request.partner_product_id,
        request.duration,
    );
    envelope(
        Operation::AuthorizeRemoteReservationStart,
        &request.provider_id.to_string(),
        &dto,
    )
}

pub fn build_remote_stop(request: &AuthorizeRemoteStopRequest) -> WireEnvelope {
    let dto = RemoteStopDto {
        session_id: request.session_id.clone(),
        partner_session_id: request.partner_session_id.clone(),
        provider_id: request.provider_id.clone(),
        evse_id: request.evse_id.clone(),
    };
    envelope(Operation::AuthorizeRemoteStop, &request.provider_id.to_string(), &dto)
}

pub fn build_reservation_stop(request: &AuthorizeRemoteReservationStopRequest) -> WireEnvelope {
    let dto = RemoteStopDto {
        session_id: request.session_id.clone(),
        partner_session_id: request.partner_session_id.clone(),
        provider_id: request.provider_id.clone(),
        evse_id: request.evse_id.clone(),
    };
    envelope(
        Operation::AuthorizeRemoteReservationStop,
        &request.provider_id.to_string(),
        &dto,
    )
}

pub fn parse_acknowledgement(operation: Operation, raw: &str) -> DecodeResult<Acknowledgement> {
    let dto: AcknowledgementDto = from_body(operation, raw)?;
    Ok(Acknowledgement {
        result: dto.result,
        status_code: dto
            .status_code
            .into_domain()
            .map_err(|reason| DecodeError::new(operation, reason, raw))?,
        session_id: dto.session_id,
        partner_session_id: dto.partner_session_id,
        provider_id: None,
    })
}

fn parse_authorization(operation: Operation, raw: &str) -> DecodeResult<AuthorizationStart> {
    let dto: AuthorizationResultDto = from_body(operation, raw)?;
    let fail = |reason: String| DecodeError::new(operation, reason, raw);
    Ok(AuthorizationStart {
        authorization_status: dto.authorization_status,
        status_code: dto.status_code.into_domain().map_err(fail)?,
        session_id: dto.session_id,
        partner_session_id: dto.partner_session_id,
        provider_id: dto.provider_id,
        authorization_stop_identifications: dto
            .authorization_stop_identifications
            .into_iter()
            .map(|id| id.into_domain().map_err(fail))
            .collect::<DecodeResult<Vec<_>>>()?,
    })
}

pub fn parse_authorization_start(
    operation: Operation,
    raw: &str,
) -> DecodeResult<AuthorizationStart> {
    parse_authorization(operation, raw)
}

pub fn parse_authorization_stop(operation: Operation, raw: &str) -> DecodeResult<AuthorizationStop> {
    let start = parse_authorization(operation, raw)?;
    Ok(AuthorizationStop {
        authorization_status: start.authorization_status,
        status_code: start.status_code,
        session_id: start.session_id,
        partner_session_id: start.partner_session_id,
        provider_id: start.provider_id,
    })
}

/// Result field whose absence marks an error envelope.
fn result_key(operation: Operation) -> &'static str {
    match operation {
        Operation::AuthorizeStart | Operation::AuthorizeStop => "AuthorizationStatus",
        _ => "Result",
    }
}

pub fn detect_fault(operation: Operation, raw: &str) -> Option<FaultEnvelope> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    if object.contains_key(result_key(operation)) {
        return None;
    }
    let message = ["message", "Message", "error", "Error"]
        .iter()
        .find_map(|key| object.get(*key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    let status = object
        .get("StatusCode")
        .and_then(|s| s.get("Description"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if object.contains_key("StatusCode") || message.is_some() {
        Some(FaultEnvelope {
            reason: message.or(status).unwrap_or_else(|| raw.to_string()),
        })
    } else {
        None
    }
}

// Server side

pub fn parse_authorize_start_request(raw: &str) -> DecodeResult<AuthorizeStartRequest> {
    let op = Operation::AuthorizeStart;
    let dto: AuthorizeStartDto = from_body(op, raw)?;
    Ok(AuthorizeStartRequest {
        operator_id: dto.operator_id,
        identification: dto
            .identification
            .into_domain()
            .map_err(|r| DecodeError::new(op, r, raw))?,
        evse_id: dto.evse_id,
        session_id: dto.session_id,
        partner_session_id: dto.partner_session_id,
        partner_product_id: dto.partner_product_id,
    })
}

pub fn parse_authorize_stop_request(raw: &str) -> DecodeResult<AuthorizeStopRequest> {
    let op = Operation::AuthorizeStop;
    let dto: AuthorizeStopDto = from_body(op, raw)?;
    Ok(AuthorizeStopRequest {
        operator_id: dto.operator_id,
        session_id: dto.session_id,
        identification: dto
            .identification
            .into_domain()
            .map_err(|r| DecodeError::new(op, r, raw))?,
        evse_id: dto.evse_id,
        partner_session_id: dto.partner_session_id,
    })
}

pub fn parse_charge_detail_record(raw: &str) -> DecodeResult<ChargeDetailRecord> {
    let op = Operation::SendChargeDetailRecord;
    let dto: ChargeDetailRecordDto = from_body(op, raw)?;
    Ok(ChargeDetailRecord {
        session_id: dto.session_id,
        partner_session_id: dto.partner_session_id,
        partner_product_id: dto.partner_product_id,
        evse_id: dto.evse_id,
        identification: dto
            .identification
            .into_domain()
            .map_err(|r| DecodeError::new(op, r, raw))?,
        charging_start: dto.charging_start,
        charging_end: dto.charging_end,
        session_start: dto.session_start,
        session_end: dto.session_end,
        meter_value_start: dto.meter_value_start,
        meter_value_end: dto.meter_value_end,
        meter_values_in_between: dto.meter_values_in_between,
        consumed_energy: dto.consumed_energy,
        metering_signature: dto.metering_signature,
        hub_operator_id: dto.hub_operator_id,
        hub_provider_id: dto.hub_provider_id,
    })
}

pub fn parse_remote_start_request(raw: &str) -> DecodeResult<AuthorizeRemoteStartRequest> {
    let op = Operation::AuthorizeRemoteStart;
    let dto: RemoteStartDto = from_body(op, raw)?;
    Ok(AuthorizeRemoteStartRequest {
        provider_id: dto.provider_id,
        evse_id: dto.evse_id,
        identification: dto
            .identification
            .into_domain()
            .map_err(|r| DecodeError::new(op, r, raw))?,
        session_id: dto.session_id,
        partner_session_id: dto.partner_session_id,
        partner_product_id: dto.partner_product_id,
    })
}

pub fn parse_reservation_start_request(
    raw: &str,
) -> DecodeResult<AuthorizeRemoteReservationStartRequest> {
    let op = Operation::AuthorizeRemoteReservationStart;
    let dto: RemoteStartDto = from_body(op, raw)?;
    Ok(AuthorizeRemoteReservationStartRequest {
        provider_id: dto.provider_id,
        evse_id: dto.evse_id,
        identification: dto
            .identification
            .into_domain()
            .map_err(|r| DecodeError::new(op, r, raw))?,
        session_id: dto.session_id,
        partner_session_id: dto.partner_session_id,
        partner_product_id: dto.partner_product_id,
        duration: dto.duration,
    })
}

pub fn parse_remote_stop_request(raw: &str) -> DecodeResult<AuthorizeRemoteStopRequest> {
    let dto: RemoteStopDto = from_body(Operation::AuthorizeRemoteStop, raw)?;
    Ok(AuthorizeRemoteStopRequest {
        session_id: dto.session_id,
        provider_id: dto.provider_id,
        evse_id: dto.evse_id,
        partner_session_id: dto.partner_session_id,
    })
}

pub fn parse_reservation_stop_request(
    raw: &str,
) -> DecodeResult<AuthorizeRemoteReservationStopRequest> {
    let dto: RemoteStopDto = from_body(Operation::AuthorizeRemoteReservationStop, raw)?;
    Ok(AuthorizeRemoteReservationStopRequest {
        session_id: dto.session_id,
        provider_id: dto.provider_id,
        evse_id: dto.evse_id,
        partner_session_id: dto.partner_session_id,
    })
}

fn authorization_body(
    authorization_status: &Option<String>,
    status_code: &StatusCode,
    session_id: &Option<SessionId>,
    partner_session_id: &Option<PartnerSessionId>,
    provider_id: &Option<ProviderId>,
    stop_ids: &[Identification],
) -> String {
    to_body(&AuthorizationResultDto {
        session_id: session_id.clone(),
        partner_session_id: partner_session_id.clone(),
        provider_id: provider_id.clone(),
        authorization_status: authorization_status.clone(),
        status_code: status_code.into(),
        authorization_stop_identifications: stop_ids.iter().map(Into::into).collect(),
    })
}

pub fn build_authorization_start(path: &str, result: &AuthorizationStart) -> WireEnvelope {
    WireEnvelope::new(
        Operation::AuthorizeStart,
        WireFormat::Json,
        path.to_string(),
        authorization_body(
            &result.authorization_status,
            &result.status_code,
            &result.session_id,
            &result.partner_session_id,
            &result.provider_id,
            &result.authorization_stop_identifications,
        ),
    )
}

pub fn build_authorization_stop(path: &str, result: &AuthorizationStop) -> WireEnvelope {
    WireEnvelope::new(
        Operation::AuthorizeStop,
        WireFormat::Json,
        path.to_string(),
        authorization_body(
            &result.authorization_status,
            &result.status_code,
            &result.session_id,
            &result.partner_session_id,
            &result.provider_id,
            &[],
        ),
    )
}

pub fn build_acknowledgement(operation: Operation, path: &str, ack: &Acknowledgement) -> WireEnvelope {
    WireEnvelope::new(
        operation,
        WireFormat::Json,
        path.to_string(),
        to_body(&AcknowledgementDto {
            result: ack.result,
            status_code: (&ack.status_code).into(),
            session_id: ack.session_id.clone(),
            partner_session_id: ack.partner_session_id.clone(),
        }),
    )
}

/// Server side: an error envelope for a request that could not be handled.
pub fn build_error(status: &StatusCode) -> String {
    #[derive(Serialize)]
    struct ErrorBody {
        #[serde(rename = "StatusCode")]
        status_code: StatusCodeDto,
    }
    to_body(&ErrorBody {
        status_code: status.into(),
    })
}
