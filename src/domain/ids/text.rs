//! Single-string identifiers
//!
//! Session ids, partner session ids, RFID UIDs and the various free-form
//! station/product ids carry no structure beyond a grammar and a length
//! limit.

use std::sync::LazyLock;

use regex::Regex;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::domain::error::{FormatError, FormatResult};

static SESSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]{8}-[A-Za-z0-9]{4}-[A-Za-z0-9]{4}-[A-Za-z0-9]{4}-[A-Za-z0-9]{12}$",
    )
    .expect("static regex")
});

static UID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Fa-f0-9]{8}|[A-Fa-f0-9]{14}|[A-Fa-f0-9]{20})$").expect("static regex")
});

static PRODUCT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("static regex"));

fn validate(
    kind: &'static str,
    text: &str,
    max: usize,
    pattern: Option<&Regex>,
) -> FormatResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FormatError::Empty { kind });
    }
    if trimmed.chars().count() > max {
        return Err(FormatError::TooLong {
            kind,
            text: trimmed.to_string(),
            max,
        });
    }
    if let Some(pattern) = pattern {
        if !pattern.is_match(trimmed) {
            return Err(FormatError::grammar(kind, trimmed));
        }
    }
    Ok(trimmed.to_string())
}

/// Identity byte fold, for ids compared exactly.
fn exact(b: u8) -> u8 {
    b
}

fn ascii_lower(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

fn folded_cmp(a: &str, b: &str, fold: fn(u8) -> u8) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.bytes().map(fold).cmp(b.bytes().map(fold)))
}

/// `$normalize` rewrites the stored text; `$fold` maps bytes before they are
/// compared or hashed, so ids can keep their received spelling and still
/// compare case-insensitively.
macro_rules! text_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $max:expr, $pattern:expr, $normalize:expr, $fold:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(text: &str) -> FormatResult<Self> {
                let pattern: Option<&Regex> = $pattern;
                let normalize: fn(String) -> String = $normalize;
                validate($kind, text, $max, pattern).map(|s| Self(normalize(s)))
            }

            pub fn try_parse(text: &str) -> Option<Self> {
                Self::parse(text).ok()
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl $name {
            const FOLD: fn(u8) -> u8 = $fold;
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                folded_cmp(&self.0, &other.0, Self::FOLD) == Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                for b in self.0.bytes() {
                    state.write_u8(Self::FOLD(b));
                }
                state.write_usize(self.0.len());
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                folded_cmp(&self.0, &other.0, Self::FOLD)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = FormatError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = FormatError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

text_id!(
    /// Hub-issued charging session id (UUID layout).
    SessionId,
    "session id",
    36,
    Some(&*SESSION_PATTERN),
    |s| s,
    ascii_lower
);

text_id!(
    /// Caller-issued session id, echoed back by the hub.
    PartnerSessionId,
    "partner session id",
    250,
    None,
    |s| s,
    exact
);

text_id!(
    /// RFID card UID (4, 7 or 10 bytes, hex encoded).
    Uid,
    "UID",
    20,
    Some(&*UID_PATTERN),
    |s| s.to_ascii_uppercase(),
    exact
);

text_id!(
    /// Operator-local charging station id.
    ChargingStationId,
    "charging station id",
    50,
    None,
    |s| s,
    exact
);

text_id!(
    /// Operator-local charging pool id.
    ChargingPoolId,
    "charging pool id",
    50,
    None,
    |s| s,
    exact
);

text_id!(
    /// Tariff/product id agreed between the partners.
    PartnerProductId,
    "partner product id",
    100,
    Some(&*PRODUCT_PATTERN),
    |s| s,
    exact
);

impl SessionId {
    /// A fresh random session id.
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_accepts_uuid_layout() {
        assert!(SessionId::parse("B2D4E0A1-38F1-4E5B-A41C-1F0C7B5A9E11").is_ok());
        assert!(SessionId::parse("not-a-session").is_err());
    }

    #[test]
    fn session_id_keeps_hub_spelling_but_ignores_case() {
        use std::collections::HashSet;

        let upper = SessionId::parse("B2D4E0A1-38F1-4E5B-A41C-1F0C7B5A9E11").unwrap();
        let lower = SessionId::parse("b2d4e0a1-38f1-4e5b-a41c-1f0c7b5a9e11").unwrap();

        assert_eq!(upper.as_str(), "B2D4E0A1-38F1-4E5B-A41C-1F0C7B5A9E11");
        assert_eq!(upper.to_string(), "B2D4E0A1-38F1-4E5B-A41C-1F0C7B5A9E11");
        assert_eq!(String::from(upper.clone()), "B2D4E0A1-38F1-4E5B-A41C-1F0C7B5A9E11");
        assert_eq!(upper, lower);
        assert_eq!(upper.cmp(&lower), Ordering::Equal);

        let set: HashSet<_> = [upper, lower].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn exact_ids_stay_case_sensitive() {
        assert_ne!(
            PartnerSessionId::parse("cpo-42").unwrap(),
            PartnerSessionId::parse("CPO-42").unwrap()
        );
    }

    #[test]
    fn random_session_ids_are_valid() {
        let id = SessionId::new_random();
        assert_eq!(SessionId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn uid_lengths() {
        assert!(Uid::parse("AABBCCDD").is_ok());
        assert!(Uid::parse("04a1b2c3d4e5f6").is_ok());
        assert!(Uid::parse("00112233445566778899").is_ok());
        assert!(Uid::parse("AABBCC").is_err());
        assert!(Uid::parse("GGHHIIJJ").is_err());
        assert_eq!(Uid::parse("aabbccdd").unwrap().to_string(), "AABBCCDD");
    }

    #[test]
    fn partner_session_id_limits_length() {
        assert!(PartnerSessionId::parse("0815").is_ok());
        assert!(matches!(
            PartnerSessionId::parse(&"x".repeat(251)),
            Err(FormatError::TooLong { max: 250, .. })
        ));
        assert!(matches!(
            PartnerSessionId::parse("   "),
            Err(FormatError::Empty { .. })
        ));
    }

    #[test]
    fn product_id_grammar() {
        assert!(PartnerProductId::parse("AC1_flex-2.0").is_ok());
        assert!(PartnerProductId::parse("AC 1").is_err());
    }

    #[test]
    fn ordering_is_length_first() {
        let a = ChargingStationId::parse("ZZ").unwrap();
        let b = ChargingStationId::parse("AAA").unwrap();
        assert!(a < b);
    }
}
