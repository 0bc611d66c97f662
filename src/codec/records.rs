//! Per-record checks shared by both dialects
//!
//! An EVSE data record that cannot be published is left out of its batch;
//! the rest of the batch is still sent.

use std::fmt;

use crate::domain::{EvseDataRecord, EvseId, GeoCoordinates};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnspecifiedPlug(String),
    InvalidGeoCoordinates,
    IncompleteAddress(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnspecifiedPlug(name) => write!(f, "plug type '{}' has no wire name", name),
            Self::InvalidGeoCoordinates => f.write_str("geo coordinates out of range"),
            Self::IncompleteAddress(field) => write!(f, "address has no {}", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub evse_id: EvseId,
    pub reason: SkipReason,
}

pub fn validate_evse_data_record(record: &EvseDataRecord) -> Result<(), SkipReason> {
    if let Some(crate::domain::Plug::Unspecified(name)) =
        record.plugs.iter().find(|p| p.wire_name().is_none())
    {
        return Err(SkipReason::UnspecifiedPlug(name.clone()));
    }
    if !record.geo_coordinates.is_valid() {
        return Err(SkipReason::InvalidGeoCoordinates);
    }
    let address = &record.address;
    if address.country.trim().is_empty() {
        return Err(SkipReason::IncompleteAddress("country"));
    }
    if address.city.trim().is_empty() {
        return Err(SkipReason::IncompleteAddress("city"));
    }
    if address.street.trim().is_empty() {
        return Err(SkipReason::IncompleteAddress("street"));
    }
    Ok(())
}

pub(crate) fn partition(records: &[EvseDataRecord]) -> (Vec<&EvseDataRecord>, Vec<SkippedRecord>) {
    let mut publishable = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for record in records {
        match validate_evse_data_record(record) {
            Ok(()) => publishable.push(record),
            Err(reason) => skipped.push(SkippedRecord {
                evse_id: record.evse_id.clone(),
                reason,
            }),
        }
    }
    (publishable, skipped)
}

/// Decimal degrees with '.' as separator and at most six fractional
/// digits, trailing zeros removed.
pub fn format_degree(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

pub fn format_geo(geo: &GeoCoordinates) -> (String, String) {
    (format_degree(geo.latitude), format_degree(geo.longitude))
}
