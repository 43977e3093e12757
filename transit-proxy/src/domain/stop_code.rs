//! Bus stop code type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid stop code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop code: {reason}")]
pub struct InvalidStopCode {
    reason: &'static str,
}

/// A bus stop code, as used by the upstream API.
///
/// Stop codes are opaque, case-sensitive identifiers. The only thing we
/// enforce is that they are not empty (or only whitespace), so that a blank
/// query parameter never reaches the upstream.
///
/// # Examples
///
/// ```
/// use transit_proxy::domain::StopCode;
///
/// let code = StopCode::parse("83139").unwrap();
/// assert_eq!(code.as_str(), "83139");
///
/// assert!(StopCode::parse("").is_err());
/// assert!(StopCode::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(String);

impl StopCode {
    /// Parse a stop code from a string.
    ///
    /// The value is kept verbatim: no trimming and no case folding.
    pub fn parse(s: &str) -> Result<Self, InvalidStopCode> {
        if s.is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be empty",
            });
        }

        if s.trim().is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be blank",
            });
        }

        Ok(StopCode(s.to_string()))
    }

    /// Returns the stop code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopCode {
    type Error = InvalidStopCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StopCode::parse(&value)
    }
}

impl From<StopCode> for String {
    fn from(code: StopCode) -> Self {
        code.0
    }
}

impl fmt::Debug for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCode({})", self.0)
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Roundtrip: parse then as_str returns the original, untouched
        #[test]
        fn roundtrip(s in "[A-Za-z0-9]{1,12}") {
            let code = StopCode::parse(&s).unwrap();
            prop_assert_eq!(code.as_str(), s.as_str());
        }

        /// Whitespace-only strings are always rejected
        #[test]
        fn blank_rejected(s in "[ \t\r\n]{0,8}") {
            prop_assert!(StopCode::parse(&s).is_err());
        }
    }
}
