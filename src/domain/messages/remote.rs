//! Remote start/stop and reservation requests (EMP → hub → CPO)

use super::{Correlation, Identification};
use crate::domain::ids::{EvseId, PartnerProductId, PartnerSessionId, ProviderId, SessionId};

/// Start charging at an EVSE on behalf of a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRemoteStartRequest {
    pub provider_id: ProviderId,
    pub evse_id: EvseId,
    pub identification: Identification,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub partner_product_id: Option<PartnerProductId>,
}

impl AuthorizeRemoteStartRequest {
    pub fn new(provider_id: ProviderId, evse_id: EvseId, identification: Identification) -> Self {
        Self {
            provider_id,
            evse_id,
            identification,
            session_id: None,
            partner_session_id: None,
            partner_product_id: None,
        }
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: self.session_id.clone(),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: Some(self.provider_id.clone()),
        }
    }
}

/// Stop a remotely started session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRemoteStopRequest {
    pub session_id: SessionId,
    pub provider_id: ProviderId,
    pub evse_id: EvseId,
    pub partner_session_id: Option<PartnerSessionId>,
}

impl AuthorizeRemoteStopRequest {
    pub fn new(session_id: SessionId, provider_id: ProviderId, evse_id: EvseId) -> Self {
        Self {
            session_id,
            provider_id,
            evse_id,
            partner_session_id: None,
        }
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: Some(self.session_id.clone()),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: Some(self.provider_id.clone()),
        }
    }
}

/// Reserve an EVSE for a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRemoteReservationStartRequest {
    pub provider_id: ProviderId,
    pub evse_id: EvseId,
    pub identification: Identification,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub partner_product_id: Option<PartnerProductId>,
    /// Minutes; hub default applies when absent.
    pub duration: Option<u32>,
}

impl AuthorizeRemoteReservationStartRequest {
    pub fn new(provider_id: ProviderId, evse_id: EvseId, identification: Identification) -> Self {
        Self {
            provider_id,
            evse_id,
            identification,
            session_id: None,
            partner_session_id: None,
            partner_product_id: None,
            duration: None,
        }
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: self.session_id.clone(),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: Some(self.provider_id.clone()),
        }
    }
}

/// Cancel a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRemoteReservationStopRequest {
    pub session_id: SessionId,
    pub provider_id: ProviderId,
    pub evse_id: EvseId,
    pub partner_session_id: Option<PartnerSessionId>,
}

impl AuthorizeRemoteReservationStopRequest {
    pub fn new(session_id: SessionId, provider_id: ProviderId, evse_id: EvseId) -> Self {
        Self {
            session_id,
            provider_id,
            evse_id,
            partner_session_id: None,
        }
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: Some(self.session_id.clone()),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: Some(self.provider_id.clone()),
        }
    }
}
