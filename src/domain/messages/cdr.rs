//! Charge detail record

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{Correlation, Identification};
use crate::domain::ids::{
    EvseId, HubOperatorId, HubProviderId, PartnerProductId, PartnerSessionId, SessionId,
};

/// Completed charging session as reported by the CPO
/// (`SendChargeDetailRecord`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeDetailRecord {
    pub session_id: SessionId,
    pub partner_session_id: Option<PartnerSessionId>,
    pub partner_product_id: Option<PartnerProductId>,
    pub evse_id: EvseId,
    pub identification: Identification,
    pub charging_start: Option<DateTime<Utc>>,
    pub charging_end: Option<DateTime<Utc>>,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    /// kWh
    pub meter_value_start: Option<Decimal>,
    /// kWh
    pub meter_value_end: Option<Decimal>,
    pub meter_values_in_between: Vec<Decimal>,
    /// kWh
    pub consumed_energy: Option<Decimal>,
    pub metering_signature: Option<String>,
    pub hub_operator_id: Option<HubOperatorId>,
    pub hub_provider_id: Option<HubProviderId>,
}

impl ChargeDetailRecord {
    pub fn new(
        session_id: SessionId,
        evse_id: EvseId,
        identification: Identification,
        session_start: DateTime<Utc>,
        session_end: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            partner_session_id: None,
            partner_product_id: None,
            evse_id,
            identification,
            charging_start: None,
            charging_end: None,
            session_start,
            session_end,
            meter_value_start: None,
            meter_value_end: None,
            meter_values_in_between: Vec::new(),
            consumed_energy: None,
            metering_signature: None,
            hub_operator_id: None,
            hub_provider_id: None,
        }
    }

    /// Consumed energy, derived from the meter readings when not given.
    pub fn energy(&self) -> Option<Decimal> {
        self.consumed_energy.or_else(|| {
            match (self.meter_value_start, self.meter_value_end) {
                (Some(start), Some(end)) if end >= start => Some(end - start),
                _ => None,
            }
        })
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: Some(self.session_id.clone()),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: None,
        }
    }
}
