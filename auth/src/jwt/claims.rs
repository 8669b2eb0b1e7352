use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Purpose of a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session token payload.
///
/// Wire shape: `{ "userId": .., "type": "access"|"refresh", "iat": .., "exp": .. }`.
/// Expiry is absolute (Unix seconds), never relative to the verifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account identifier)
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims issued at `issued_at` that expire `ttl` later.
    ///
    /// Issuance is truncated to whole seconds, so `exp - iat` is exactly the
    /// number of whole seconds in `ttl`.
    pub fn new(
        user_id: impl ToString,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();

        Self {
            user_id: user_id.to_string(),
            kind,
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// Check if token is expired at `current_timestamp`.
    ///
    /// A token is valid strictly before `exp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }

    /// Absolute expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_claims() {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let claims = Claims::new("user123", TokenKind::Access, issued_at, Duration::minutes(15));

        assert_eq!(claims.user_id, "user123");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.iat, issued_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.expires_at(), Some(issued_at + Duration::minutes(15)));
    }

    #[test]
    fn test_issued_at_is_truncated_to_seconds() {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
            + Duration::milliseconds(750);
        let claims = Claims::new("user123", TokenKind::Refresh, issued_at, Duration::days(7));

        assert_eq!(claims.iat, issued_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims {
            user_id: "user123".to_string(),
            kind: TokenKind::Access,
            iat: 900,
            exp: 1000,
        };

        assert!(!claims.is_expired(999));
        assert!(claims.is_expired(1000));
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_wire_field_names() {
        let claims = Claims {
            user_id: "user123".to_string(),
            kind: TokenKind::Refresh,
            iat: 1,
            exp: 2,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "user123");
        assert_eq!(json["type"], "refresh");
        assert_eq!(json["iat"], 1);
        assert_eq!(json["exp"], 2);
    }
}
