//! Profile identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProfileId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileIdError {
    /// The input string is empty.
    #[error("profile id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("profile id must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input has leading or trailing whitespace.
    #[error("profile id cannot have surrounding whitespace")]
    Whitespace,
}

/// Identifier of a user's profile record.
///
/// The value is issued by the authentication provider and is opaque to
/// Vitrine. The profile row keyed by this identifier is provisioned
/// asynchronously after sign-up, so holding a `ProfileId` does not imply the
/// row exists yet.
///
/// ## Constraints
///
/// - Length: 1-255 bytes
/// - No leading or trailing whitespace
///
/// ## Examples
///
/// ```
/// use vitrine_core::ProfileId;
///
/// assert!(ProfileId::parse("9b2f6c1e-4d7a-4f3e-9a51-0c2d8e7b6a14").is_ok());
///
/// assert!(ProfileId::parse("").is_err());
/// assert!(ProfileId::parse(" padded ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

impl ProfileId {
    /// Maximum length of a profile identifier in bytes.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `ProfileId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 255 bytes, or has
    /// surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, ProfileIdError> {
        if s.is_empty() {
            return Err(ProfileIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ProfileIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.trim() != s {
            return Err(ProfileIdError::Whitespace);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ProfileId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProfileId {
    type Err = ProfileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProfileId {
    type Error = ProfileIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_uuid() {
        let id = ProfileId::parse("9b2f6c1e-4d7a-4f3e-9a51-0c2d8e7b6a14").unwrap();
        assert_eq!(id.as_str(), "9b2f6c1e-4d7a-4f3e-9a51-0c2d8e7b6a14");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ProfileId::parse(""), Err(ProfileIdError::Empty));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = "a".repeat(ProfileId::MAX_LENGTH + 1);
        assert_eq!(
            ProfileId::parse(&long),
            Err(ProfileIdError::TooLong {
                max: ProfileId::MAX_LENGTH
            })
        );
        assert!(ProfileId::parse(&"a".repeat(ProfileId::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_parse_rejects_surrounding_whitespace() {
        assert_eq!(ProfileId::parse(" abc"), Err(ProfileIdError::Whitespace));
        assert_eq!(ProfileId::parse("abc\n"), Err(ProfileIdError::Whitespace));
        assert!(ProfileId::parse("a b").is_ok());
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let id: ProfileId = serde_json::from_str("\"user-1\"").unwrap();
        assert_eq!(id.as_str(), "user-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");

        assert!(serde_json::from_str::<ProfileId>("\"\"").is_err());
    }

    #[test]
    fn test_display_and_from_str() {
        let id: ProfileId = "user-2".parse().unwrap();
        assert_eq!(id.to_string(), "user-2");
        assert_eq!(String::from(id), "user-2");
    }
}
