//! E-mobility contract identifier (EVCO id / eMAID)
//!
//! An EVCO id is a provider (country + three characters), a contract
//! instance suffix and an optional check digit. ISO ids carry a nine
//! character suffix, DIN ids a six character one.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::country::Country;
use super::{cmp_canonical, IdFormat, ProviderId};
use crate::domain::error::{FormatError, FormatResult};

const KIND: &str = "EVCO id";

static ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{2})(-?)([A-Za-z0-9]{3})(-?)([A-Za-z0-9]{9})(?:(-?)([A-Za-z0-9]))?$")
        .expect("static regex")
});

static DIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{2})([*\-]?)([A-Za-z0-9]{3})([*\-]?)([A-Za-z0-9]{6})(?:([*\-]?)([0-9Xx]))?$")
        .expect("static regex")
});

/// Textual dialect of an [`EvcoId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvcoIdFormat {
    /// `DE8EOCAQET5GSST`
    Iso,
    /// `DE-8EO-CAQET5GSS-T`
    IsoHyphen,
    /// `DE8AA123456X`
    Din,
    /// `DE*8AA*123456*X`
    DinStar,
    /// `DE-8AA-123456-X`
    DinHyphen,
}

impl EvcoIdFormat {
    fn separator(&self) -> &'static str {
        match self {
            Self::Iso | Self::Din => "",
            Self::IsoHyphen | Self::DinHyphen => "-",
            Self::DinStar => "*",
        }
    }

    fn suffix_len(&self) -> usize {
        match self {
            Self::Iso | Self::IsoHyphen => 9,
            Self::Din | Self::DinStar | Self::DinHyphen => 6,
        }
    }
}

/// Contract identifier of an electric vehicle driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvcoId {
    provider: ProviderId,
    suffix: String,
    check_digit: Option<char>,
    format: EvcoIdFormat,
}

impl EvcoId {
    pub fn parse(text: &str) -> FormatResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FormatError::Empty { kind: KIND });
        }

        if let Some(caps) = ISO_PATTERN.captures(trimmed) {
            let format = if caps[2].is_empty() {
                EvcoIdFormat::Iso
            } else {
                EvcoIdFormat::IsoHyphen
            };
            return Self::from_captures(trimmed, &caps, format);
        }

        if let Some(caps) = DIN_PATTERN.captures(trimmed) {
            let format = match &caps[2] {
                "*" => EvcoIdFormat::DinStar,
                "-" => EvcoIdFormat::DinHyphen,
                _ => EvcoIdFormat::Din,
            };
            return Self::from_captures(trimmed, &caps, format);
        }

        Err(FormatError::grammar(KIND, trimmed))
    }

    fn from_captures(
        text: &str,
        caps: &regex::Captures<'_>,
        format: EvcoIdFormat,
    ) -> FormatResult<Self> {
        let separator = &caps[2];
        if &caps[4] != separator {
            return Err(FormatError::Inconsistent {
                kind: KIND,
                text: text.to_string(),
                reason: "mixed separators",
            });
        }
        if let Some(check_sep) = caps.get(6) {
            if !check_sep.as_str().is_empty() && check_sep.as_str() != separator {
                return Err(FormatError::Inconsistent {
                    kind: KIND,
                    text: text.to_string(),
                    reason: "mixed separators",
                });
            }
        }

        let country = Country::from_alpha2(&caps[1])?;
        let provider = ProviderId::new(country, &caps[3], IdFormat::IsoStar)?;

        Ok(Self {
            provider,
            suffix: caps[5].to_ascii_uppercase(),
            check_digit: caps
                .get(7)
                .and_then(|m| m.as_str().chars().next())
                .map(|c| c.to_ascii_uppercase()),
            format,
        })
    }

    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    /// Build from a provider, instance suffix and optional check digit.
    pub fn new(
        provider: &ProviderId,
        suffix: &str,
        check_digit: Option<char>,
        format: EvcoIdFormat,
    ) -> FormatResult<Self> {
        let sep = format.separator();
        let mut text = format!(
            "{}{}{}{}{}",
            provider.country().alpha2(),
            sep,
            provider.suffix(),
            sep,
            suffix
        );
        if let Some(digit) = check_digit {
            text.push_str(sep);
            text.push(digit);
        }
        let parsed = Self::parse(&text)?;
        if parsed.format != format {
            return Err(FormatError::Inconsistent {
                kind: KIND,
                text,
                reason: "suffix length does not match the requested dialect",
            });
        }
        Ok(parsed)
    }

    pub fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn check_digit(&self) -> Option<char> {
        self.check_digit
    }

    pub fn format(&self) -> EvcoIdFormat {
        self.format
    }

    /// Render in an explicitly requested dialect.
    ///
    /// ISO and DIN dialects differ in suffix length, so only the separator
    /// style can change without changing the identifier.
    pub fn to_string_as(&self, format: EvcoIdFormat) -> FormatResult<String> {
        if format.suffix_len() != self.suffix.len() {
            return Err(FormatError::Inconsistent {
                kind: KIND,
                text: self.canonical(),
                reason: "suffix length does not match the requested dialect",
            });
        }
        Ok(self.render(format))
    }

    fn render(&self, format: EvcoIdFormat) -> String {
        let sep = format.separator();
        let mut text = format!(
            "{}{}{}{}{}",
            self.provider.country().alpha2(),
            sep,
            self.provider.suffix(),
            sep,
            self.suffix
        );
        if let Some(digit) = self.check_digit {
            text.push_str(sep);
            text.push(digit);
        }
        text
    }

    fn canonical(&self) -> String {
        self.render(EvcoIdFormat::Iso)
    }
}

impl PartialEq for EvcoId {
    fn eq(&self, other: &Self) -> bool {
        // Presence mismatch of the check digit compares unequal.
        self.provider == other.provider
            && self.suffix == other.suffix
            && self.check_digit == other.check_digit
    }
}

impl Eq for EvcoId {}

impl Hash for EvcoId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.suffix.hash(state);
        self.check_digit.hash(state);
    }
}

impl PartialOrd for EvcoId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EvcoId {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_canonical(&self.canonical(), &other.canonical())
    }
}

impl fmt::Display for EvcoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.format))
    }
}

impl FromStr for EvcoId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EvcoId {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvcoId> for String {
    fn from(value: EvcoId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dialects() {
        let plain = EvcoId::parse("DE8EOCAQET5GSST").unwrap();
        let hyphen = EvcoId::parse("DE-8EO-CAQET5GSS-T").unwrap();

        assert_eq!(plain.format(), EvcoIdFormat::Iso);
        assert_eq!(hyphen.format(), EvcoIdFormat::IsoHyphen);
        assert_eq!(plain, hyphen);
        assert_eq!(plain.check_digit(), Some('T'));
        assert_eq!(plain.provider_id().to_string(), "DE*8EO");
        assert_eq!(hyphen.to_string(), "DE-8EO-CAQET5GSS-T");
    }

    #[test]
    fn parses_din_dialects() {
        let star = EvcoId::parse("DE*BMW*ETU6T5*X").unwrap();
        let plain = EvcoId::parse("DEBMWETU6T5X").unwrap();
        let hyphen = EvcoId::parse("de-bmw-etu6t5-x").unwrap();

        assert_eq!(star.format(), EvcoIdFormat::DinStar);
        assert_eq!(plain.format(), EvcoIdFormat::Din);
        assert_eq!(hyphen.format(), EvcoIdFormat::DinHyphen);
        assert_eq!(star, plain);
        assert_eq!(plain, hyphen);
        assert_eq!(star.to_string(), "DE*BMW*ETU6T5*X");
    }

    #[test]
    fn check_digit_presence_mismatch_is_unequal() {
        let with = EvcoId::parse("DE*BMW*ETU6T5*X").unwrap();
        let without = EvcoId::parse("DE*BMW*ETU6T5").unwrap();
        assert_ne!(with, without);
        assert_ne!(with.cmp(&without), Ordering::Equal);

        let a = EvcoId::parse("DE*BMW*ETU6T5").unwrap();
        let b = EvcoId::parse("DEBMWETU6T5").unwrap();
        assert_eq!(a, without);
        assert_eq!(a, b);
    }

    #[test]
    fn differing_check_digits_are_unequal() {
        let x = EvcoId::parse("DE*BMW*ETU6T5*X").unwrap();
        let one = EvcoId::parse("DE*BMW*ETU6T5*1").unwrap();
        assert_ne!(x, one);
    }

    #[test]
    fn mixed_separators_are_rejected() {
        assert!(matches!(
            EvcoId::parse("DE*BMW-ETU6T5"),
            Err(FormatError::Inconsistent { .. })
        ));
        assert!(EvcoId::try_parse("DE*BMW*ETU6T5-X").is_none());
    }

    #[test]
    fn malformed_ids_fail() {
        assert!(EvcoId::parse("").is_err());
        assert!(EvcoId::parse("DE*BMW*ETU6").is_err());
        assert!(matches!(
            EvcoId::parse("XX*BMW*ETU6T5"),
            Err(FormatError::UnknownCountry(_))
        ));
    }

    #[test]
    fn renders_other_separator_styles() {
        let id = EvcoId::parse("DE*BMW*ETU6T5*X").unwrap();
        assert_eq!(id.to_string_as(EvcoIdFormat::Din).unwrap(), "DEBMWETU6T5X");
        assert_eq!(
            id.to_string_as(EvcoIdFormat::DinHyphen).unwrap(),
            "DE-BMW-ETU6T5-X"
        );
        assert!(id.to_string_as(EvcoIdFormat::Iso).is_err());
    }

    #[test]
    fn builds_from_parts() {
        let provider = ProviderId::parse("DE-8EO").unwrap();
        let id = EvcoId::new(&provider, "CAQET5GSS", Some('T'), EvcoIdFormat::IsoHyphen).unwrap();
        assert_eq!(id.to_string(), "DE-8EO-CAQET5GSS-T");
        assert!(EvcoId::new(&provider, "CAQET5GSS", None, EvcoIdFormat::DinStar).is_err());
    }
}
