//! EVSE data and status push requests

use crate::domain::evse::{ActionType, EvseDataRecord, EvseStatusRecord};
use crate::domain::ids::OperatorId;

/// CPO → hub: static EVSE data.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvseDataRequest {
    pub action: ActionType,
    pub operator_id: OperatorId,
    pub operator_name: Option<String>,
    pub records: Vec<EvseDataRecord>,
}

impl PushEvseDataRequest {
    pub fn new(action: ActionType, operator_id: OperatorId, records: Vec<EvseDataRecord>) -> Self {
        Self {
            action,
            operator_id,
            operator_name: None,
            records,
        }
    }

    pub fn with_operator_name(mut self, name: impl Into<String>) -> Self {
        self.operator_name = Some(name.into());
        self
    }
}

/// CPO → hub: live EVSE status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvseStatusRequest {
    pub action: ActionType,
    pub operator_id: OperatorId,
    pub operator_name: Option<String>,
    pub records: Vec<EvseStatusRecord>,
}

impl PushEvseStatusRequest {
    pub fn new(action: ActionType, operator_id: OperatorId, records: Vec<EvseStatusRecord>) -> Self {
        Self {
            action,
            operator_id,
            operator_name: None,
            records,
        }
    }

    pub fn with_operator_name(mut self, name: impl Into<String>) -> Self {
        self.operator_name = Some(name.into());
        self
    }
}
