use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

use crate::clock::Clock;

/// Bytes of entropy in a reset secret.
pub const RESET_SECRET_BYTES: usize = 32;

/// Minutes a reset secret stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// A freshly issued reset secret.
///
/// `secret` goes to the account holder out of band; only `digest` and
/// `expires_at` are persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetTicket {
    pub secret: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for ResetTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetTicket")
            .field("secret", &"<redacted>")
            .field("digest", &self.digest)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The persisted half of a reset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReset {
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&ResetTicket> for PendingReset {
    fn from(ticket: &ResetTicket) -> Self {
        Self {
            digest: ticket.digest.clone(),
            expires_at: ticket.expires_at,
        }
    }
}

/// Generate an opaque random secret (hex encoded).
pub fn create_reset_secret() -> String {
    let mut bytes = [0u8; RESET_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One-way deterministic digest of a reset secret (SHA-256, hex encoded).
pub fn digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Single-use, short-lived password reset secrets.
///
/// Unlike passwords, reset secrets carry full entropy, so a fast deterministic
/// digest is enough and allows lookup by digest.
pub struct PasswordResetService {
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PasswordResetService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        }
    }

    /// Create a new secret expiring one window from now.
    pub fn request(&self) -> ResetTicket {
        let secret = create_reset_secret();
        let digest = digest(&secret);

        ResetTicket {
            secret,
            digest,
            expires_at: self.clock.now() + self.ttl,
        }
    }

    /// Consume `pending` if `presented` matches and has not expired.
    ///
    /// On success the pending reset is cleared, so the same secret can never be
    /// used twice. On failure nothing changes, and the caller cannot tell a wrong
    /// secret from an expired one.
    pub fn consume(&self, presented: &str, pending: &mut Option<PendingReset>) -> bool {
        let matches = match pending {
            Some(reset) => {
                reset.digest == digest(presented) && self.clock.now() < reset.expires_at
            }
            None => false,
        };

        if matches {
            *pending = None;
        }

        matches
    }
}
