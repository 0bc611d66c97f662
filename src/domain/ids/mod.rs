//! Roaming network identifiers
//!
//! Every identifier is an immutable value validated at construction.
//! Malformed text fails with [`FormatError`](crate::domain::FormatError).
//!
//! All identifiers order by encoded length first and then by the bytes of
//! their canonical text, see [`cmp_canonical`].

pub mod country;
pub mod evco;
pub mod evse;
pub mod party;
pub mod text;

#[cfg(test)]
mod properties;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use country::Country;
pub use evco::{EvcoId, EvcoIdFormat};
pub use evse::{EvseId, EvseIdFormat};
pub use party::{HubOperatorId, HubProviderId, OperatorId, PartyId, ProviderId};
pub use text::{
    ChargingPoolId, ChargingStationId, PartnerProductId, PartnerSessionId, SessionId, Uid,
};

/// Textual dialect of an operator or provider id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdFormat {
    /// `DEGEF`
    Iso,
    /// `DE*GEF`
    IsoStar,
    /// `DE-GEF`
    IsoHyphen,
    /// `+49*822`
    Din,
}

/// Identifier order: shorter canonical text first, then byte order.
pub fn cmp_canonical(a: &str, b: &str) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_compares_length_before_bytes() {
        assert_eq!(cmp_canonical("ZZ", "AAA"), Ordering::Less);
        assert_eq!(cmp_canonical("AB", "AA"), Ordering::Greater);
        assert_eq!(cmp_canonical("AA", "AA"), Ordering::Equal);
    }
}
