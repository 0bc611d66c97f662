//! EVSE data and status projections

pub mod model;

pub use model::{
    ActionType, Address, AuthenticationMode, ChargingFacility, EvseDataRecord, EvseStatus,
    EvseStatusDiff, EvseStatusRecord, GeoCoordinates, OverlappingDiff, Plug,
};
