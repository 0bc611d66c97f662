use serde::{Deserialize, Serialize};

use crate::codec::HubResponse;
use crate::domain::StatusCode;

/// Terminal state of one dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    ProtocolFault,
    TransportFault,
    SystemError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ProtocolFault => "protocol_fault",
            Self::TransportFault => "transport_fault",
            Self::SystemError => "system_error",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a dispatched call.
///
/// Every variant carries the operation's own result type, so callers that
/// only care about the status code can call [`into_result`](Self::into_result)
/// and branch on it. Faults hold a synthesized result:
///
/// | variant          | status code |
/// |------------------|-------------|
/// | `ProtocolFault`  | 022         |
/// | `TransportFault` | 320         |
/// | `SystemError`    | 021         |
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome<T> {
    Success(T),
    ProtocolFault(T),
    TransportFault(T),
    SystemError(T),
}

impl<T> DispatchOutcome<T> {
    pub(crate) fn of(kind: OutcomeKind, value: T) -> Self {
        match kind {
            OutcomeKind::Success => Self::Success(value),
            OutcomeKind::ProtocolFault => Self::ProtocolFault(value),
            OutcomeKind::TransportFault => Self::TransportFault(value),
            OutcomeKind::SystemError => Self::SystemError(value),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::ProtocolFault(_) => OutcomeKind::ProtocolFault,
            Self::TransportFault(_) => OutcomeKind::TransportFault,
            Self::SystemError(_) => OutcomeKind::SystemError,
        }
    }

    pub fn result(&self) -> &T {
        match self {
            Self::Success(v) | Self::ProtocolFault(v) | Self::TransportFault(v) | Self::SystemError(v) => v,
        }
    }

    pub fn into_result(self) -> T {
        match self {
            Self::Success(v) | Self::ProtocolFault(v) | Self::TransportFault(v) | Self::SystemError(v) => v,
        }
    }

    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DispatchOutcome<U> {
        let kind = self.kind();
        DispatchOutcome::of(kind, f(self.into_result()))
    }
}

impl<T: HubResponse> DispatchOutcome<T> {
    pub fn status_code(&self) -> &StatusCode {
        self.result().status_code()
    }
}
