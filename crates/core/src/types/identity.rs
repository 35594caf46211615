//! Verified caller identity.
//!
//! An [`Identity`] only exists after the identity provider has accepted a
//! bearer token. It carries the provider's subject (the user's UID) and
//! nothing else, and it lives for exactly one request.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Uid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UidError {
    /// The input string is empty.
    #[error("uid cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("uid must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or control characters.
    #[error("uid must not contain whitespace or control characters")]
    InvalidCharacter,
}

/// A user identifier issued by the identity provider.
///
/// ## Constraints
///
/// - Length: 1-128 characters (the provider's own limit for subjects)
/// - No whitespace or control characters
///
/// ## Examples
///
/// ```
/// use fresh_cart_core::Uid;
///
/// assert!(Uid::parse("abc").is_ok());
/// assert!(Uid::parse("").is_err());
/// assert!(Uid::parse("has space").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Maximum length of a subject identifier.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `Uid` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 128 characters,
    /// or contains whitespace/control characters.
    pub fn parse(s: &str) -> Result<Self, UidError> {
        if s.is_empty() {
            return Err(UidError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UidError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(UidError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the uid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Uid` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Uid {
    type Err = UidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Uid {
    type Error = UidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The verified subject of a single request.
///
/// There is deliberately no way to build one from client input other than
/// going through a token verifier, and no multi-subject or delegated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    uid: Uid,
}

impl Identity {
    /// Wrap a verified subject.
    #[must_use]
    pub const fn new(uid: Uid) -> Self {
        Self { uid }
    }

    /// The user identifier this request runs as.
    #[must_use]
    pub const fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Consumes the identity and returns the uid.
    #[must_use]
    pub fn into_uid(self) -> Uid {
        self.uid
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uid)
    }
}
