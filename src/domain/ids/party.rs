//! Operator and provider identifiers
//!
//! A party id is a country plus a three character suffix. The hub accepts
//! it in several spellings which all denote the same party:
//!
//! | Dialect      | Example    |
//! |--------------|------------|
//! | `Iso`        | `DEGEF`    |
//! | `IsoStar`    | `DE*GEF`   |
//! | `IsoHyphen`  | `DE-GEF`   |
//! | `Din`        | `+49*822`  |
//!
//! Equality, hashing and ordering only look at `(country, suffix)`;
//! [`Display`](std::fmt::Display) reproduces the dialect the value was
//! parsed in.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;

use super::country::Country;
use super::{cmp_canonical, IdFormat};
use crate::domain::error::{FormatError, FormatResult};

static ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{2})([*\-]?)([A-Za-z0-9]{3})$").expect("static regex")
});

static DIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?([0-9]{1,3})\*([0-9]{3,6})$").expect("static regex"));

/// Decoded `(country, suffix)` pair shared by every party identifier.
#[derive(Debug, Clone)]
pub struct PartyId {
    country: Country,
    suffix: String,
    format: IdFormat,
}

impl PartyId {
    pub(crate) fn parse(kind: &'static str, text: &str) -> FormatResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FormatError::Empty { kind });
        }

        if let Some(caps) = ISO_PATTERN.captures(trimmed) {
            let country = Country::from_alpha2(&caps[1])?;
            let format = match &caps[2] {
                "*" => IdFormat::IsoStar,
                "-" => IdFormat::IsoHyphen,
                _ => IdFormat::Iso,
            };
            return Ok(Self {
                country,
                suffix: caps[3].to_ascii_uppercase(),
                format,
            });
        }

        if let Some(caps) = DIN_PATTERN.captures(trimmed) {
            let country = Country::from_calling_code(&caps[1])?;
            return Ok(Self {
                country,
                suffix: caps[2].to_string(),
                format: IdFormat::Din,
            });
        }

        Err(FormatError::grammar(kind, trimmed))
    }

    pub(crate) fn new(
        kind: &'static str,
        country: Country,
        suffix: &str,
        format: IdFormat,
    ) -> FormatResult<Self> {
        let candidate = Self {
            country,
            suffix: suffix.to_ascii_uppercase(),
            format,
        };
        // Re-parse the rendered text so the constructor obeys the grammar.
        let rendered = candidate.render(format, kind)?;
        Self::parse(kind, &rendered)
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn format(&self) -> IdFormat {
        self.format
    }

    /// Canonical text used for ordering: alpha-2 code followed by suffix.
    pub fn canonical(&self) -> String {
        format!("{}{}", self.country.alpha2(), self.suffix)
    }

    pub(crate) fn render(&self, format: IdFormat, kind: &'static str) -> FormatResult<String> {
        match format {
            IdFormat::Iso => Ok(format!("{}{}", self.country.alpha2(), self.suffix)),
            IdFormat::IsoStar => Ok(format!("{}*{}", self.country.alpha2(), self.suffix)),
            IdFormat::IsoHyphen => Ok(format!("{}-{}", self.country.alpha2(), self.suffix)),
            IdFormat::Din => {
                if self.suffix.len() < 3
                    || self.suffix.len() > 6
                    || !self.suffix.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(FormatError::Inconsistent {
                        kind,
                        text: self.canonical(),
                        reason: "DIN dialect requires a numeric suffix of 3 to 6 digits",
                    });
                }
                Ok(format!("+{}*{}", self.country.calling_code(), self.suffix))
            }
        }
    }

    fn key(&self) -> (&'static str, &str) {
        (self.country.alpha2(), self.suffix.as_str())
    }
}

impl PartialEq for PartyId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PartyId {}

impl Hash for PartyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for PartyId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartyId {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_canonical(&self.canonical(), &other.canonical())
    }
}

macro_rules! party_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(PartyId);

        impl $name {
            /// Parse any supported dialect.
            pub fn parse(text: &str) -> FormatResult<Self> {
                PartyId::parse($kind, text).map(Self)
            }

            /// Parse, returning `None` instead of an error.
            pub fn try_parse(text: &str) -> Option<Self> {
                Self::parse(text).ok()
            }

            /// Build from decoded parts, rendered in `format`.
            pub fn new(country: Country, suffix: &str, format: IdFormat) -> FormatResult<Self> {
                PartyId::new($kind, country, suffix, format).map(Self)
            }

            pub fn country(&self) -> Country {
                self.0.country()
            }

            pub fn suffix(&self) -> &str {
                self.0.suffix()
            }

            /// The dialect this value was parsed in.
            pub fn format(&self) -> IdFormat {
                self.0.format()
            }

            /// Render in an explicitly requested dialect.
            pub fn to_string_as(&self, format: IdFormat) -> FormatResult<String> {
                self.0.render(format, $kind)
            }

            pub(crate) fn party(&self) -> &PartyId {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.0.render(self.0.format(), $kind) {
                    Ok(text) => f.write_str(&text),
                    Err(_) => f.write_str(&self.0.canonical()),
                }
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
                value.to_string()
            }
        }
    };
}

party_id!(
    /// Charge point operator identifier (`DE*GEF`).
    OperatorId,
    "operator id"
);

party_id!(
    /// E-mobility provider identifier (`DE*ICE`).
    ProviderId,
    "provider id"
);

party_id!(
    /// Operator id of a hub that publishes on behalf of other operators.
    HubOperatorId,
    "hub operator id"
);

party_id!(
    /// Provider id of a hub that authorizes on behalf of other providers.
    HubProviderId,
    "hub provider id"
);
