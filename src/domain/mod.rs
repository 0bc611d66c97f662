//! Domain layer: identifiers, EVSE projections and message value objects.
//!
//! Nothing in here performs I/O.

pub mod error;
pub mod evse;
pub mod ids;
pub mod messages;

pub use error::{FormatError, FormatResult};
pub use evse::*;
pub use ids::*;
pub use messages::*;
