//! EVSE identifier
//!
//! `DE*GEF*E123456789*1` (ISO with separators), `DEGEFE1234` (ISO without),
//! `+49*822*4201*1` (DIN). The operator part decodes to an [`OperatorId`],
//! so the same EVSE spelled in two dialects compares equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::country::Country;
use super::{cmp_canonical, IdFormat, OperatorId};
use crate::domain::error::{FormatError, FormatResult};

const KIND: &str = "EVSE id";
const MAX_SUFFIX: usize = 31;

static ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{2})(\*?)([A-Za-z0-9]{3})(\*?)[Ee]([A-Za-z0-9][A-Za-z0-9*]{0,30})$")
        .expect("static regex")
});

static DIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?([0-9]{1,3})\*([0-9]{3,6})\*([0-9][0-9*]{0,31})$").expect("static regex")
});

/// Textual dialect of an [`EvseId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvseIdFormat {
    /// `DEGEFE1234`
    Iso,
    /// `DE*GEF*E1234`
    IsoStar,
    /// `+49*822*1234`
    Din,
}

/// Identifier of a single charge point / connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvseId {
    operator: OperatorId,
    suffix: String,
    format: EvseIdFormat,
}

impl EvseId {
    pub fn parse(text: &str) -> FormatResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FormatError::Empty { kind: KIND });
        }

        if let Some(caps) = ISO_PATTERN.captures(trimmed) {
            if caps[2] != caps[4] {
                return Err(FormatError::Inconsistent {
                    kind: KIND,
                    text: trimmed.to_string(),
                    reason: "mixed separators",
                });
            }
            let country = Country::from_alpha2(&caps[1])?;
            let format = if caps[2].is_empty() {
                EvseIdFormat::Iso
            } else {
                EvseIdFormat::IsoStar
            };
            return Ok(Self {
                operator: OperatorId::new(country, &caps[3], IdFormat::IsoStar)?,
                suffix: caps[5].to_ascii_uppercase(),
                format,
            });
        }

        if let Some(caps) = DIN_PATTERN.captures(trimmed) {
            let country = Country::from_calling_code(&caps[1])?;
            return Ok(Self {
                operator: OperatorId::new(country, &caps[2], IdFormat::Din)?,
                suffix: caps[3].to_string(),
                format: EvseIdFormat::Din,
            });
        }

        if trimmed.len() > MAX_SUFFIX + 8 {
            return Err(FormatError::TooLong {
                kind: KIND,
                text: trimmed.to_string(),
                max: MAX_SUFFIX + 8,
            });
        }
        Err(FormatError::grammar(KIND, trimmed))
    }

    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    pub fn operator_id(&self) -> &OperatorId {
        &self.operator
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn format(&self) -> EvseIdFormat {
        self.format
    }

    /// Render in an explicitly requested dialect.
    pub fn to_string_as(&self, format: EvseIdFormat) -> FormatResult<String> {
        match format {
            EvseIdFormat::Iso => Ok(format!(
                "{}E{}",
                self.operator.to_string_as(IdFormat::Iso)?,
                self.suffix
            )),
            EvseIdFormat::IsoStar => Ok(format!(
                "{}*E{}",
                self.operator.to_string_as(IdFormat::IsoStar)?,
                self.suffix
            )),
            EvseIdFormat::Din => {
                if !self.suffix.bytes().all(|b| b.is_ascii_digit() || b == b'*') {
                    return Err(FormatError::Inconsistent {
                        kind: KIND,
                        text: self.canonical(),
                        reason: "DIN dialect requires a numeric suffix",
                    });
                }
                Ok(format!(
                    "{}*{}",
                    self.operator.to_string_as(IdFormat::Din)?,
                    self.suffix
                ))
            }
        }
    }

    fn canonical(&self) -> String {
        format!(
            "{}{}E{}",
            self.operator.country().alpha2(),
            self.operator.suffix(),
            self.suffix
        )
    }
}

impl PartialEq for EvseId {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.suffix == other.suffix
    }
}

impl Eq for EvseId {}

impl Hash for EvseId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operator.hash(state);
        self.suffix.hash(state);
    }
}

impl PartialOrd for EvseId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EvseId {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_canonical(&self.canonical(), &other.canonical())
    }
}

impl fmt::Display for EvseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_string_as(self.format) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(&self.canonical()),
        }
    }
}

impl FromStr for EvseId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EvseId {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvseId> for String {
    fn from(value: EvseId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_with_and_without_separators() {
        let star = EvseId::parse("DE*GEF*E123456789*1").unwrap();
        let plain = EvseId::parse("DEGEFE123456789*1").unwrap();

        assert_eq!(star.format(), EvseIdFormat::IsoStar);
        assert_eq!(plain.format(), EvseIdFormat::Iso);
        assert_eq!(star, plain);
        assert_eq!(star.operator_id().to_string(), "DE*GEF");
        assert_eq!(star.to_string(), "DE*GEF*E123456789*1");
        assert_eq!(plain.to_string(), "DEGEFE123456789*1");
    }

    #[test]
    fn parses_din() {
        let din = EvseId::parse("+49*822*4201*1").unwrap();
        assert_eq!(din.format(), EvseIdFormat::Din);
        assert_eq!(din.operator_id().country().alpha2(), "DE");
        assert_eq!(din.to_string(), "+49*822*4201*1");
        assert_eq!(din.to_string_as(EvseIdFormat::IsoStar).unwrap(), "DE*822*E4201*1");
    }

    #[test]
    fn same_evse_in_two_dialects_is_equal() {
        let din = EvseId::parse("+49*822*4201").unwrap();
        let iso = EvseId::parse("DE*822*E4201").unwrap();
        assert_eq!(din, iso);
        assert_eq!(din.cmp(&iso), Ordering::Equal);
    }

    #[test]
    fn rejects_malformed() {
        assert!(EvseId::parse("DE*GEF*123").is_err());
        assert!(EvseId::parse("DE*GEFE123").is_err());
        assert!(EvseId::try_parse("").is_none());
        assert!(matches!(
            EvseId::parse("XX*GEF*E1"),
            Err(FormatError::UnknownCountry(_))
        ));
    }

    #[test]
    fn serde_round_trip_keeps_dialect() {
        let id = EvseId::parse("DE*GEF*E1*2").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"DE*GEF*E1*2\"");
        let back: EvseId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.format(), EvseIdFormat::IsoStar);
    }
}
