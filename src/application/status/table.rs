//! Hub status code table
//!
//! One entry per published code. Call sites ask the table instead of
//! comparing codes, so a new hub code only needs a `register` call.

use std::sync::Arc;

use dashmap::DashMap;

/// Broad class of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Success,
    /// The hub itself failed or rejected the message.
    HubFault,
    /// The identification or contract was not accepted.
    AuthenticationFailure,
    /// Unknown, expired or foreign session.
    SessionFailure,
    /// The EVSE cannot serve the request.
    EvseFailure,
    /// A partner or the hub could not be reached.
    Transport,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HubFault => "hub_fault",
            Self::AuthenticationFailure => "authentication_failure",
            Self::SessionFailure => "session_failure",
            Self::EvseFailure => "evse_failure",
            Self::Transport => "transport",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: u16,
    pub kind: StatusKind,
    pub description: String,
    /// Append `" - " + AdditionalInfo` to the hub's description.
    pub append_additional_info: bool,
}

const PUBLISHED: &[(u16, StatusKind, &str)] = &[
    (0, StatusKind::Success, "Success"),
    (1, StatusKind::HubFault, "Hubject system error"),
    (2, StatusKind::HubFault, "Hubject database error"),
    (9, StatusKind::HubFault, "Data transaction error"),
    (17, StatusKind::AuthenticationFailure, "Unauthorized Access"),
    (18, StatusKind::EvseFailure, "Inconsistent EvseID"),
    (19, StatusKind::AuthenticationFailure, "Inconsistent EvcoID"),
    (21, StatusKind::HubFault, "System error"),
    (22, StatusKind::HubFault, "Data error"),
    (101, StatusKind::AuthenticationFailure, "QR Code Authentication failed - Invalid Credentials"),
    (102, StatusKind::AuthenticationFailure, "RFID Authentication failed - invalid UID"),
    (103, StatusKind::AuthenticationFailure, "RFID Authentication failed - card not readable"),
    (105, StatusKind::AuthenticationFailure, "PIN Authentication failed - invalid PIN"),
    (106, StatusKind::EvseFailure, "Parking space occupied"),
    (110, StatusKind::AuthenticationFailure, "No valid contract"),
    (210, StatusKind::AuthenticationFailure, "No positive authentication response"),
    (300, StatusKind::Transport, "Partner not found"),
    (310, StatusKind::Transport, "Partner did not respond"),
    (320, StatusKind::Transport, "Service not available"),
    (400, StatusKind::SessionFailure, "Session is invalid"),
    (501, StatusKind::EvseFailure, "Communication to EVSE failed"),
    (502, StatusKind::EvseFailure, "No EV connected to EVSE"),
    (601, StatusKind::EvseFailure, "EVSE already reserved"),
    (602, StatusKind::EvseFailure, "EVSE already in use/ wrong token"),
    (603, StatusKind::EvseFailure, "Unknown EVSE ID"),
    (604, StatusKind::EvseFailure, "EVSE is out of service"),
];

/// Code → meaning lookup, safe to extend while calls are in flight.
#[derive(Debug, Default)]
pub struct StatusTable {
    entries: DashMap<u16, StatusEntry>,
}

impl StatusTable {
    /// Empty table; every code is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// All published hub codes.
    pub fn standard() -> Self {
        let table = Self::new();
        for (code, kind, description) in PUBLISHED {
            table.register(*code, *kind, *description);
        }
        table.set_append_additional_info(17, true);
        table
    }

    /// Add or replace an entry.
    pub fn register(&self, code: u16, kind: StatusKind, description: impl Into<String>) {
        let append = self
            .entries
            .get(&code)
            .map(|e| e.append_additional_info)
            .unwrap_or(false);
        self.entries.insert(
            code,
            StatusEntry {
                code,
                kind,
                description: description.into(),
                append_additional_info: append,
            },
        );
    }

    /// Returns false when the code is not registered.
    pub fn set_append_additional_info(&self, code: u16, append: bool) -> bool {
        match self.entries.get_mut(&code) {
            Some(mut entry) => {
                entry.append_additional_info = append;
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, code: u16) -> Option<StatusEntry> {
        self.entries.get(&code).map(|e| e.clone())
    }

    /// Unknown codes are treated as hub faults.
    pub fn kind(&self, code: u16) -> StatusKind {
        self.entries
            .get(&code)
            .map(|e| e.kind)
            .unwrap_or(StatusKind::HubFault)
    }

    pub fn default_description(&self, code: u16) -> Option<String> {
        self.entries.get(&code).map(|e| e.description.clone())
    }

    pub fn appends_additional_info(&self, code: u16) -> bool {
        self.entries
            .get(&code)
            .map(|e| e.append_additional_info)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type SharedStatusTable = Arc<StatusTable>;
