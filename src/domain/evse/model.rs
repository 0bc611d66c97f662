//! EVSE projections consumed by the codec
//!
//! These are read-only views of an operator's station records: only the
//! fields the roaming hub publishes. The station/pool model itself lives
//! with the caller.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ids::{ChargingPoolId, ChargingStationId, EvseId, HubOperatorId};

/// Live status of one EVSE as published to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvseStatus {
    Available,
    Reserved,
    Occupied,
    OutOfService,
    EvseNotFound,
    Unknown,
}

impl EvseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Reserved => "Reserved",
            Self::Occupied => "Occupied",
            Self::OutOfService => "OutOfService",
            Self::EvseNotFound => "EvseNotFound",
            Self::Unknown => "Unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Available" => Self::Available,
            "Reserved" => Self::Reserved,
            "Occupied" => Self::Occupied,
            "OutOfService" => Self::OutOfService,
            "EvseNotFound" => Self::EvseNotFound,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for EvseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the hub should apply a pushed data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "fullLoad")]
    FullLoad,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "insert")]
    Insert,
    #[serde(rename = "delete")]
    Delete,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullLoad => "fullLoad",
            Self::Update => "update",
            Self::Insert => "insert",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address of a charging station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// ISO 3166 alpha-3 as the hub expects it (e.g. `DEU`).
    pub country: String,
    pub city: String,
    pub street: String,
    pub postal_code: Option<String>,
    pub house_number: Option<String>,
    pub floor: Option<String>,
    pub region: Option<String>,
    pub time_zone: Option<String>,
}

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Socket outlet / plug type.
///
/// `Unspecified` keeps whatever the station record said; such a plug
/// cannot be published and makes its EVSE record fail serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plug {
    SmallPaddleInductive,
    LargePaddleInductive,
    AvconConnector,
    TeslaConnector,
    NemaFivePlug,
    TypeEFrenchStandard,
    TypeFSchuko,
    TypeGBritishStandard,
    TypeJSwissStandard,
    Type1Connector,
    Type2Outlet,
    Type2Connector,
    Type3Outlet,
    IecBlueIndustrial,
    IecRedIndustrial,
    CcsCombo2,
    CcsCombo1,
    Chademo,
    Unspecified(String),
}

impl Plug {
    /// Wire text, or `None` for a plug the hub has no name for.
    pub fn wire_name(&self) -> Option<&'static str> {
        Some(match self {
            Self::SmallPaddleInductive => "Small Paddle Inductive",
            Self::LargePaddleInductive => "Large Paddle Inductive",
            Self::AvconConnector => "AVCON Connector",
            Self::TeslaConnector => "Tesla Connector",
            Self::NemaFivePlug => "NEMA 5-20",
            Self::TypeEFrenchStandard => "Type E French Standard",
            Self::TypeFSchuko => "Type F Schuko",
            Self::TypeGBritishStandard => "Type G British Standard",
            Self::TypeJSwissStandard => "Type J Swiss Standard",
            Self::Type1Connector => "Type 1 Connector (Cable Attached)",
            Self::Type2Outlet => "Type 2 Outlet",
            Self::Type2Connector => "Type 2 Connector (Cable Attached)",
            Self::Type3Outlet => "Type 3 Outlet",
            Self::IecBlueIndustrial => "IEC 60309 Single Phase",
            Self::IecRedIndustrial => "IEC 60309 Three Phase",
            Self::CcsCombo2 => "CCS Combo 2 Plug (Cable Attached)",
            Self::CcsCombo1 => "CCS Combo 1 Plug (Cable Attached)",
            Self::Chademo => "CHAdeMO",
            Self::Unspecified(_) => return None,
        })
    }
}

/// Power delivery capability of an EVSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingFacility {
    /// `AC1`, `AC3` or `DC`
    pub power_type: String,
    pub power_kw: Option<f64>,
    pub voltage: Option<u32>,
    pub amperage: Option<u32>,
}

/// How drivers may authenticate at an EVSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationMode {
    NfcRfidClassic,
    NfcRfidDesfire,
    Pnc,
    Remote,
    DirectPayment,
    NoAuthenticationRequired,
}

impl AuthenticationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NfcRfidClassic => "NFC RFID Classic",
            Self::NfcRfidDesfire => "NFC RFID DESFire",
            Self::Pnc => "PnC",
            Self::Remote => "REMOTE",
            Self::DirectPayment => "Direct Payment",
            Self::NoAuthenticationRequired => "No Authentication Required",
        }
    }
}

/// Static data of one EVSE as pushed with `PushEvseData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvseDataRecord {
    pub evse_id: EvseId,
    pub charging_pool_id: Option<ChargingPoolId>,
    pub charging_station_id: Option<ChargingStationId>,
    pub charging_station_name: Option<String>,
    pub address: Address,
    pub geo_coordinates: GeoCoordinates,
    pub plugs: Vec<Plug>,
    pub charging_facilities: Vec<ChargingFacility>,
    pub authentication_modes: Vec<AuthenticationMode>,
    pub payment_options: Vec<String>,
    pub accessibility: Option<String>,
    pub hotline_phone_number: Option<String>,
    pub additional_info: Option<String>,
    pub is_open_24_hours: bool,
    /// Free text opening times, only published when not open 24 hours.
    pub opening_times: Option<String>,
    pub hub_operator_id: Option<HubOperatorId>,
    pub is_hubject_compatible: bool,
    pub dynamic_info_available: bool,
}

impl EvseDataRecord {
    /// A record with the mandatory fields; everything else empty.
    pub fn new(evse_id: EvseId, address: Address, geo_coordinates: GeoCoordinates) -> Self {
        Self {
            evse_id,
            charging_pool_id: None,
            charging_station_id: None,
            charging_station_name: None,
            address,
            geo_coordinates,
            plugs: Vec::new(),
            charging_facilities: Vec::new(),
            authentication_modes: Vec::new(),
            payment_options: Vec::new(),
            accessibility: None,
            hotline_phone_number: None,
            additional_info: None,
            is_open_24_hours: true,
            opening_times: None,
            hub_operator_id: None,
            is_hubject_compatible: true,
            dynamic_info_available: true,
        }
    }
}

/// One EVSE's status as pushed with `PushEvseStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvseStatusRecord {
    pub evse_id: EvseId,
    pub status: EvseStatus,
}

impl EvseStatusRecord {
    pub fn new(evse_id: EvseId, status: EvseStatus) -> Self {
        Self { evse_id, status }
    }
}

/// An id was placed in more than one set of a status diff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("EVSE {0} appears in more than one set of the status diff")]
pub struct OverlappingDiff(pub String);

/// Incremental status change computed by the caller.
///
/// An EVSE id appears in at most one of the three sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvseStatusDiff {
    new: BTreeMap<EvseId, EvseStatus>,
    changed: BTreeMap<EvseId, EvseStatus>,
    removed: BTreeMap<EvseId, EvseStatus>,
}

impl EvseStatusDiff {
    pub fn new(
        new: BTreeMap<EvseId, EvseStatus>,
        changed: BTreeMap<EvseId, EvseStatus>,
        removed: BTreeMap<EvseId, EvseStatus>,
    ) -> Result<Self, OverlappingDiff> {
        let mut seen = HashSet::new();
        for id in new.keys().chain(changed.keys()).chain(removed.keys()) {
            if !seen.insert(id) {
                return Err(OverlappingDiff(id.to_string()));
            }
        }
        Ok(Self {
            new,
            changed,
            removed,
        })
    }

    pub fn new_evses(&self) -> &BTreeMap<EvseId, EvseStatus> {
        &self.new
    }

    pub fn changed_evses(&self) -> &BTreeMap<EvseId, EvseStatus> {
        &self.changed
    }

    pub fn removed_evses(&self) -> &BTreeMap<EvseId, EvseStatus> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evse(s: &str) -> EvseId {
        EvseId::parse(s).unwrap()
    }

    #[test]
    fn status_text_round_trip() {
        for status in [
            EvseStatus::Available,
            EvseStatus::Reserved,
            EvseStatus::Occupied,
            EvseStatus::OutOfService,
            EvseStatus::EvseNotFound,
            EvseStatus::Unknown,
        ] {
            assert_eq!(EvseStatus::from_str(status.as_str()), status);
        }
        assert_eq!(EvseStatus::from_str("Blocked"), EvseStatus::Unknown);
    }

    #[test]
    fn diff_rejects_overlapping_ids() {
        let mut new = BTreeMap::new();
        new.insert(evse("DE*GEF*E1"), EvseStatus::Available);
        let mut removed = BTreeMap::new();
        removed.insert(evse("DEGEFE1"), EvseStatus::OutOfService);

        let err = EvseStatusDiff::new(new, BTreeMap::new(), removed).unwrap_err();
        assert!(err.to_string().contains("DE"));
    }

    #[test]
    fn diff_accepts_disjoint_sets() {
        let mut new = BTreeMap::new();
        new.insert(evse("DE*GEF*E1"), EvseStatus::Available);
        let mut changed = BTreeMap::new();
        changed.insert(evse("DE*GEF*E2"), EvseStatus::Occupied);

        let diff = EvseStatusDiff::new(new, changed, BTreeMap::new()).unwrap();
        assert!(!diff.is_empty());
        assert_eq!(diff.new_evses().len(), 1);
        assert!(diff.removed_evses().is_empty());
    }

    #[test]
    fn geo_coordinates_validation() {
        assert!(GeoCoordinates::new(50.9, 11.6).is_valid());
        assert!(!GeoCoordinates::new(91.0, 11.6).is_valid());
        assert!(!GeoCoordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn unspecified_plug_has_no_wire_name() {
        assert_eq!(Plug::Type2Outlet.wire_name(), Some("Type 2 Outlet"));
        assert_eq!(Plug::Unspecified("Type 42".into()).wire_name(), None);
    }
}
