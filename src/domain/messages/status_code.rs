//! Wire status code block

use serde::{Deserialize, Serialize};

/// `<StatusCode>` block carried by every hub result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    pub code: u16,
    pub description: Option<String>,
    pub additional_info: Option<String>,
}

impl StatusCode {
    pub const SUCCESS: u16 = 0;
    pub const UNAUTHORIZED_ACCESS: u16 = 17;
    pub const SYSTEM_ERROR: u16 = 21;
    pub const DATA_ERROR: u16 = 22;
    pub const SERVICE_NOT_AVAILABLE: u16 = 320;
    pub const SESSION_IS_INVALID: u16 = 400;

    pub fn new(code: u16, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
            additional_info: None,
        }
    }

    pub fn success() -> Self {
        Self {
            code: Self::SUCCESS,
            description: None,
            additional_info: None,
        }
    }

    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    /// Three-digit wire form, e.g. `017`.
    pub fn wire_code(&self) -> String {
        format!("{:03}", self.code)
    }

    /// Parse the three-digit wire form; leading zeros are optional.
    pub fn parse_code(text: &str) -> Option<u16> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.len() > 3 || !trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        trimmed.parse().ok()
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    /// Hubs answer stop requests for unknown or expired sessions with
    /// either of these codes.
    pub fn is_session_failure(&self) -> bool {
        matches!(self.code, Self::SERVICE_NOT_AVAILABLE | Self::SESSION_IS_INVALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_code_is_zero_padded() {
        assert_eq!(StatusCode::new(17, "x").wire_code(), "017");
        assert_eq!(StatusCode::success().wire_code(), "000");
        assert_eq!(StatusCode::new(320, "x").wire_code(), "320");
    }

    #[test]
    fn parse_code_accepts_padded_and_plain() {
        assert_eq!(StatusCode::parse_code("017"), Some(17));
        assert_eq!(StatusCode::parse_code("17"), Some(17));
        assert_eq!(StatusCode::parse_code(" 000 "), Some(0));
        assert_eq!(StatusCode::parse_code("1000"), None);
        assert_eq!(StatusCode::parse_code("-1"), None);
        assert_eq!(StatusCode::parse_code(""), None);
    }

    #[test]
    fn session_failures() {
        assert!(StatusCode::new(320, "").is_session_failure());
        assert!(StatusCode::new(400, "").is_session_failure());
        assert!(!StatusCode::new(102, "").is_session_failure());
    }
}
