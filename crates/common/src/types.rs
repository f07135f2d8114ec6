//! Shared identifier types
//!
//! Local records use integer surrogate ids; the identifiers handed out by
//! the payment provider are opaque strings and stay untyped.

use serde::{Deserialize, Serialize};

/// Unique identifier for users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Get the underlying integer
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for linked exchange accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Get the underlying integer
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

/// Chat/channel identifier used as a notification target
///
/// Kept as a plain alias: it is only ever threaded through to the engine.
pub type ChatId = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display_and_parse() {
        let id = AccountId(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<AccountId>().unwrap(), id);
        assert!("abc".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_user_id_from_i64() {
        assert_eq!(UserId::from(7).as_i64(), 7);
    }
}
