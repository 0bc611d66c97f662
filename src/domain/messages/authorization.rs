//! Authorization start/stop requests and results

use serde::{Deserialize, Serialize};

use super::{Correlation, StatusCode};
use crate::domain::ids::{
    EvcoId, EvseId, OperatorId, PartnerProductId, PartnerSessionId, ProviderId, SessionId, Uid,
};

/// How a driver identified at the EVSE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identification {
    /// RFID card of the MIFARE family, identified by its UID.
    RfidMifareFamily(Uid),
    /// Any other RFID card.
    RfidId(Uid),
    /// QR code scan: contract id and optionally the hashed PIN.
    QrCode {
        evco_id: EvcoId,
        hashed_pin: Option<String>,
    },
    /// ISO 15118 plug & charge.
    PlugAndCharge(EvcoId),
    /// App/backend initiated.
    Remote(EvcoId),
}

impl Identification {
    /// Wire element name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RfidMifareFamily(_) => "RFIDMifareFamilyIdentification",
            Self::RfidId(_) => "RFIDIdentification",
            Self::QrCode { .. } => "QRCodeIdentification",
            Self::PlugAndCharge(_) => "PlugAndChargeIdentification",
            Self::Remote(_) => "RemoteIdentification",
        }
    }

    pub fn evco_id(&self) -> Option<&EvcoId> {
        match self {
            Self::QrCode { evco_id, .. } | Self::PlugAndCharge(evco_id) | Self::Remote(evco_id) => {
                Some(evco_id)
            }
            Self::RfidMifareFamily(_) | Self::RfidId(_) => None,
        }
    }

    pub fn uid(&self) -> Option<&Uid> {
        match self {
            Self::RfidMifareFamily(uid) | Self::RfidId(uid) => Some(uid),
            _ => None,
        }
    }
}

impl std::fmt::Display for Identification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RfidMifareFamily(uid) | Self::RfidId(uid) => write!(f, "UID:{}", uid),
            Self::QrCode { evco_id, .. } => write!(f, "QR:{}", evco_id),
            Self::PlugAndCharge(evco_id) => write!(f, "PnC:{}", evco_id),
            Self::Remote(evco_id) => write!(f, "Remote:{}", evco_id),
        }
    }
}

/// The two authorization outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationOutcome {
    Authorized,
    NotAuthorized,
}

impl AuthorizationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "Authorized",
            Self::NotAuthorized => "NotAuthorized",
        }
    }
}

impl std::fmt::Display for AuthorizationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPO → hub: may this identification start charging at this EVSE?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeStartRequest {
    pub operator_id: OperatorId,
    pub identification: Identification,
    pub evse_id: Option<EvseId>,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub partner_product_id: Option<PartnerProductId>,
}

impl AuthorizeStartRequest {
    pub fn new(operator_id: OperatorId, identification: Identification) -> Self {
        Self {
            operator_id,
            identification,
            evse_id: None,
            session_id: None,
            partner_session_id: None,
            partner_product_id: None,
        }
    }

    pub fn with_evse(mut self, evse_id: EvseId) -> Self {
        self.evse_id = Some(evse_id);
        self
    }

    pub fn with_partner_session(mut self, id: PartnerSessionId) -> Self {
        self.partner_session_id = Some(id);
        self
    }

    pub fn with_product(mut self, id: PartnerProductId) -> Self {
        self.partner_product_id = Some(id);
        self
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: self.session_id.clone(),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: None,
        }
    }
}

/// CPO → hub: may this identification stop the given session?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeStopRequest {
    pub operator_id: OperatorId,
    pub session_id: SessionId,
    pub identification: Identification,
    pub evse_id: Option<EvseId>,
    pub partner_session_id: Option<PartnerSessionId>,
}

impl AuthorizeStopRequest {
    pub fn new(operator_id: OperatorId, session_id: SessionId, identification: Identification) -> Self {
        Self {
            operator_id,
            session_id,
            identification,
            evse_id: None,
            partner_session_id: None,
        }
    }

    pub fn with_evse(mut self, evse_id: EvseId) -> Self {
        self.evse_id = Some(evse_id);
        self
    }

    pub fn with_partner_session(mut self, id: PartnerSessionId) -> Self {
        self.partner_session_id = Some(id);
        self
    }

    pub fn correlation(&self) -> Correlation {
        Correlation {
            session_id: Some(self.session_id.clone()),
            partner_session_id: self.partner_session_id.clone(),
            provider_id: None,
        }
    }
}

/// Hub answer to [`AuthorizeStartRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationStart {
    /// Raw `AuthorizationStatus` text as sent by the hub.
    pub authorization_status: Option<String>,
    pub status_code: StatusCode,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub provider_id: Option<ProviderId>,
    /// Identifications that may also stop the session.
    pub authorization_stop_identifications: Vec<Identification>,
}

impl AuthorizationStart {
    pub fn new(status: AuthorizationOutcome, status_code: StatusCode) -> Self {
        Self {
            authorization_status: Some(status.as_str().to_string()),
            status_code,
            session_id: None,
            partner_session_id: None,
            provider_id: None,
            authorization_stop_identifications: Vec::new(),
        }
    }
}

/// Hub answer to [`AuthorizeStopRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationStop {
    pub authorization_status: Option<String>,
    pub status_code: StatusCode,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub provider_id: Option<ProviderId>,
}

impl AuthorizationStop {
    pub fn new(status: AuthorizationOutcome, status_code: StatusCode) -> Self {
        Self {
            authorization_status: Some(status.as_str().to_string()),
            status_code,
            session_id: None,
            partner_session_id: None,
            provider_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identification_accessors() {
        let uid = Identification::RfidMifareFamily(Uid::parse("AABBCCDD").unwrap());
        assert_eq!(uid.kind(), "RFIDMifareFamilyIdentification");
        assert!(uid.evco_id().is_none());
        assert_eq!(uid.to_string(), "UID:AABBCCDD");

        let remote = Identification::Remote(EvcoId::parse("DE*ICE*123456*X").unwrap());
        assert_eq!(remote.evco_id().unwrap().to_string(), "DE*ICE*123456*X");
        assert!(remote.uid().is_none());
    }

    #[test]
    fn stop_request_correlation_carries_session() {
        let session = SessionId::new_random();
        let req = AuthorizeStopRequest::new(
            OperatorId::parse("DE*GEF").unwrap(),
            session.clone(),
            Identification::RfidId(Uid::parse("AABBCCDD").unwrap()),
        )
        .with_partner_session(PartnerSessionId::parse("p-1").unwrap());

        let c = req.correlation();
        assert_eq!(c.session_id, Some(session));
        assert_eq!(c.partner_session_id.unwrap().as_str(), "p-1");
    }
}
