//! Status interpreter
//!
//! Maps hub status codes to outcomes and caller-facing descriptions.

mod interpreter;
mod table;

pub use interpreter::{AuthorizationDecision, Interpretation, StatusInterpreter};
pub use table::{SharedStatusTable, StatusEntry, StatusKind, StatusTable};
