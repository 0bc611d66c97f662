use super::table::{SharedStatusTable, StatusKind, StatusTable};
use crate::domain::{
    AuthorizationOutcome, AuthorizationStart, AuthorizationStop, PartnerSessionId, ProviderId,
    SessionId, StatusCode,
};
use std::sync::Arc;

/// What one status block means to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub outcome: AuthorizationOutcome,
    pub kind: StatusKind,
    pub description: String,
}

/// Interpreted authorization result with its correlation ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub outcome: AuthorizationOutcome,
    pub code: u16,
    pub kind: StatusKind,
    pub description: String,
    pub session_id: Option<SessionId>,
    pub partner_session_id: Option<PartnerSessionId>,
    pub provider_id: Option<ProviderId>,
}

impl AuthorizationDecision {
    pub fn is_authorized(&self) -> bool {
        self.outcome == AuthorizationOutcome::Authorized
    }
}

#[derive(Debug, Clone)]
pub struct StatusInterpreter {
    table: SharedStatusTable,
}

impl Default for StatusInterpreter {
    fn default() -> Self {
        Self::new(Arc::new(StatusTable::standard()))
    }
}

impl StatusInterpreter {
    pub fn new(table: SharedStatusTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StatusTable {
        &self.table
    }

    /// `Authorized` only when the wire status is literally `Authorized`.
    pub fn interpret(
        &self,
        code: u16,
        description: Option<&str>,
        additional_info: Option<&str>,
        authorization_status: Option<&str>,
    ) -> Interpretation {
        let outcome = match authorization_status {
            Some("Authorized") => AuthorizationOutcome::Authorized,
            _ => AuthorizationOutcome::NotAuthorized,
        };

        let base = match description {
            Some(text) => text.to_string(),
            None => self.table.default_description(code).unwrap_or_default(),
        };
        let description = match additional_info {
            Some(info) if self.table.appends_additional_info(code) && !info.is_empty() => {
                format!("{} - {}", base, info)
            }
            _ => base,
        };

        Interpretation {
            outcome,
            kind: self.table.kind(code),
            description,
        }
    }

    pub fn interpret_status(
        &self,
        status: &StatusCode,
        authorization_status: Option<&str>,
    ) -> Interpretation {
        self.interpret(
            status.code,
            status.description.as_deref(),
            status.additional_info.as_deref(),
            authorization_status,
        )
    }

    pub fn interpret_start(&self, result: &AuthorizationStart) -> AuthorizationDecision {
        let i = self.interpret_status(&result.status_code, result.authorization_status.as_deref());
        AuthorizationDecision {
            outcome: i.outcome,
            code: result.status_code.code,
            kind: i.kind,
            description: i.description,
            session_id: result.session_id.clone(),
            partner_session_id: result.partner_session_id.clone(),
            provider_id: result.provider_id.clone(),
        }
    }

    pub fn interpret_stop(&self, result: &AuthorizationStop) -> AuthorizationDecision {
        let i = self.interpret_status(&result.status_code, result.authorization_status.as_deref());
        AuthorizationDecision {
            outcome: i.outcome,
            code: result.status_code.code,
            kind: i.kind,
            description: i.description,
            session_id: result.session_id.clone(),
            partner_session_id: result.partner_session_id.clone(),
            provider_id: result.provider_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_access_appends_additional_info() {
        let interpreter = StatusInterpreter::default();
        let i = interpreter.interpret(
            17,
            Some("Unauthorized Access"),
            Some("Operator DE*XYZ not registered"),
            Some("NotAuthorized"),
        );
        assert_eq!(i.outcome, AuthorizationOutcome::NotAuthorized);
        assert_eq!(
            i.description,
            "Unauthorized Access - Operator DE*XYZ not registered"
        );
        assert_eq!(i.kind, StatusKind::AuthenticationFailure);
    }

    #[test]
    fn other_codes_keep_description_verbatim() {
        let interpreter = StatusInterpreter::default();
        let i = interpreter.interpret(
            102,
            Some("RFID Authentication failed - invalid UID"),
            Some("ignored"),
            Some("NotAuthorized"),
        );
        assert_eq!(i.description, "RFID Authentication failed - invalid UID");
    }

    #[test]
    fn only_literal_authorized_authorizes() {
        let interpreter = StatusInterpreter::default();
        assert_eq!(
            interpreter.interpret(0, None, None, Some("Authorized")).outcome,
            AuthorizationOutcome::Authorized
        );
        for status in [None, Some("authorized"), Some("Authorized "), Some("Blocked")] {
            assert_eq!(
                interpreter.interpret(0, None, None, status).outcome,
                AuthorizationOutcome::NotAuthorized
            );
        }
    }

    #[test]
    fn missing_description_falls_back_to_table() {
        let interpreter = StatusInterpreter::default();
        let i = interpreter.interpret(400, None, None, None);
        assert_eq!(i.description, "Session is invalid");
        assert_eq!(i.kind, StatusKind::SessionFailure);

        let i = interpreter.interpret(17, None, Some("expired"), None);
        assert_eq!(i.description, "Unauthorized Access - expired");

        assert_eq!(interpreter.interpret(888, None, None, None).description, "");
    }

    #[test]
    fn stop_decision_keeps_correlation() {
        let mut stop = AuthorizationStop::new(
            AuthorizationOutcome::NotAuthorized,
            StatusCode::new(17, "Unauthorized Access").with_additional_info("wrong token"),
        );
        stop.session_id = Some(SessionId::new_random());

        let decision = StatusInterpreter::default().interpret_stop(&stop);
        assert!(!decision.is_authorized());
        assert_eq!(decision.code, 17);
        assert_eq!(decision.description, "Unauthorized Access - wrong token");
        assert_eq!(decision.session_id, stop.session_id);
    }

    #[test]
    fn registered_codes_are_interpreted() {
        let interpreter = StatusInterpreter::default();
        interpreter
            .table()
            .register(777, StatusKind::EvseFailure, "Connector locked");
        let i = interpreter.interpret(777, None, None, None);
        assert_eq!(i.kind, StatusKind::EvseFailure);
        assert_eq!(i.description, "Connector locked");
    }
}
