//! Dispatch engine
//!
//! One entry point, [`DispatchEngine::dispatch`], for every hub operation.
//! A call never fails: transport errors, hub faults and panics while
//! building or sending all come back as a [`DispatchOutcome`] holding the
//! operation's result type with a synthesized status code.

mod engine;
mod hooks;
mod listeners;
mod outcome;


pub use engine::{CallOptions, DispatchEngine, DEFAULT_TIMEOUT};
pub use hooks::{Hooks, RequestRewriter, ResponseRewriter};
pub use listeners::{DispatchListener, ListenerId, ListenerRegistry};
pub use outcome::{DispatchOutcome, OutcomeKind};

pub type SharedDispatchEngine = std::sync::Arc<DispatchEngine>;
