//! Country codes used inside roaming identifiers
//!
//! ISO-style identifiers start with the ISO 3166 alpha-2 code (`DE*GEF`),
//! the legacy DIN dialect starts with the E.164 calling code (`+49*822`).
//! Both resolve to the same [`Country`].

use std::fmt;

use super::super::error::{FormatError, FormatResult};

/// A country known to the roaming network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Country {
    alpha2: &'static str,
    calling_code: u16,
    name: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country::new("AD", 376, "Andorra"),
    Country::new("AT", 43, "Austria"),
    Country::new("BA", 387, "Bosnia and Herzegovina"),
    Country::new("BE", 32, "Belgium"),
    Country::new("BG", 359, "Bulgaria"),
    Country::new("CH", 41, "Switzerland"),
    Country::new("CY", 357, "Cyprus"),
    Country::new("CZ", 420, "Czech Republic"),
    Country::new("DE", 49, "Germany"),
    Country::new("DK", 45, "Denmark"),
    Country::new("EE", 372, "Estonia"),
    Country::new("ES", 34, "Spain"),
    Country::new("FI", 358, "Finland"),
    Country::new("FR", 33, "France"),
    Country::new("GB", 44, "United Kingdom"),
    Country::new("GR", 30, "Greece"),
    Country::new("HR", 385, "Croatia"),
    Country::new("HU", 36, "Hungary"),
    Country::new("IE", 353, "Ireland"),
    Country::new("IS", 354, "Iceland"),
    Country::new("IT", 39, "Italy"),
    Country::new("LI", 423, "Liechtenstein"),
    Country::new("LT", 370, "Lithuania"),
    Country::new("LU", 352, "Luxembourg"),
    Country::new("LV", 371, "Latvia"),
    Country::new("MC", 377, "Monaco"),
    Country::new("ME", 382, "Montenegro"),
    Country::new("MK", 389, "North Macedonia"),
    Country::new("MT", 356, "Malta"),
    Country::new("NL", 31, "Netherlands"),
    Country::new("NO", 47, "Norway"),
    Country::new("PL", 48, "Poland"),
    Country::new("PT", 351, "Portugal"),
    Country::new("RO", 40, "Romania"),
    Country::new("RS", 381, "Serbia"),
    Country::new("SE", 46, "Sweden"),
    Country::new("SI", 386, "Slovenia"),
    Country::new("SK", 421, "Slovakia"),
    Country::new("SM", 378, "San Marino"),
    Country::new("TR", 90, "Turkey"),
    Country::new("UA", 380, "Ukraine"),
    Country::new("US", 1, "United States"),
    Country::new("CA", 1, "Canada"),
    Country::new("AU", 61, "Australia"),
    Country::new("JP", 81, "Japan"),
    Country::new("CN", 86, "China"),
    Country::new("UZ", 998, "Uzbekistan"),
];

impl Country {
    const fn new(alpha2: &'static str, calling_code: u16, name: &'static str) -> Self {
        Self {
            alpha2,
            calling_code,
            name,
        }
    }

    /// Look up a country by its ISO 3166 alpha-2 code (case-insensitive).
    pub fn from_alpha2(code: &str) -> FormatResult<Self> {
        COUNTRIES
            .iter()
            .find(|c| c.alpha2.eq_ignore_ascii_case(code))
            .copied()
            .ok_or_else(|| FormatError::UnknownCountry(code.to_string()))
    }

    /// Look up a country by its telephone calling code.
    ///
    /// Calling code 1 is shared; the first table entry (US) wins.
    pub fn from_calling_code(code: &str) -> FormatResult<Self> {
        let numeric: u16 = code
            .trim_start_matches('+')
            .parse()
            .map_err(|_| FormatError::UnknownCountry(code.to_string()))?;
        COUNTRIES
            .iter()
            .find(|c| c.calling_code == numeric)
            .copied()
            .ok_or_else(|| FormatError::UnknownCountry(code.to_string()))
    }

    pub fn alpha2(&self) -> &'static str {
        self.alpha2
    }

    pub fn calling_code(&self) -> u16 {
        self.calling_code
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alpha2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_alpha2_is_case_insensitive() {
        let de = Country::from_alpha2("de").unwrap();
        assert_eq!(de.alpha2(), "DE");
        assert_eq!(de.calling_code(), 49);
    }

    #[test]
    fn lookup_by_calling_code_accepts_plus_prefix() {
        assert_eq!(Country::from_calling_code("+49").unwrap().alpha2(), "DE");
        assert_eq!(Country::from_calling_code("43").unwrap().alpha2(), "AT");
    }

    #[test]
    fn unknown_codes_are_format_errors() {
        assert_eq!(
            Country::from_alpha2("XX"),
            Err(FormatError::UnknownCountry("XX".into()))
        );
        assert!(matches!(
            Country::from_calling_code("999"),
            Err(FormatError::UnknownCountry(_))
        ));
        assert!(Country::from_calling_code("abc").is_err());
    }
}
