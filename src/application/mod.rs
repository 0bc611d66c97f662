pub mod dispatch;
pub mod ports;
pub mod publisher;
pub mod retry;
pub mod status;

// Re-export key types for convenience
pub use dispatch::{
    CallOptions, DispatchEngine, DispatchListener, DispatchOutcome, Hooks, ListenerId,
    OutcomeKind, SharedDispatchEngine,
};
pub use ports::{CpoRemoteHandler, EmpAuthorizationHandler, UnattachedBackend};
pub use publisher::{StatusDiffPublisher, StatusDiffReport};
pub use retry::{is_transient, retry_with_backoff, RetryConfig};
pub use status::{AuthorizationDecision, StatusInterpreter, StatusKind, StatusTable};
