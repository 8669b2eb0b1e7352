use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::Claims;
use super::claims::TokenKind;
use super::errors::JwtError;
use super::handler::JwtHandler;
use crate::clock::Clock;
use crate::settings::AuthSettings;

/// Access + refresh token pair issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues and verifies signed, time-bounded session tokens.
///
/// Stateless: nothing is stored and nothing is revoked. Issuance and expiry
/// checks read the same [`Clock`].
pub struct TokenService {
    handler: JwtHandler,
    clock: Arc<dyn Clock>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(settings: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            handler: JwtHandler::new(settings.jwt_secret()),
            clock,
            access_ttl: settings.access_token_ttl(),
            refresh_ttl: settings.refresh_token_ttl(),
        }
    }

    /// Issue a token of `kind` for `subject` valid for `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, JwtError> {
        self.issue_claims(subject, kind, ttl)
            .map(|(token, _)| token)
    }

    fn issue_claims(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, Claims), JwtError> {
        let claims = Claims::new(subject, kind, self.clock.now(), ttl);
        let token = self.handler.encode(&claims)?;
        Ok((token, claims))
    }

    /// Issue an access token and a refresh token with the configured lifetimes.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, JwtError> {
        let (access_token, access) =
            self.issue_claims(subject, TokenKind::Access, self.access_ttl)?;
        let (refresh_token, refresh) =
            self.issue_claims(subject, TokenKind::Refresh, self.refresh_ttl)?;

        let expiry = |claims: &Claims| {
            claims
                .expires_at()
                .ok_or_else(|| JwtError::EncodingFailed("expiry out of range".to_string()))
        };

        Ok(TokenPair {
            access_expires_at: expiry(&access)?,
            refresh_expires_at: expiry(&refresh)?,
            access_token,
            refresh_token,
        })
    }

    /// Verify signature, structure and expiry.
    ///
    /// # Errors
    /// * `TokenInvalid` - Signature or structure is wrong
    /// * `TokenExpired` - The clock has reached the token's expiry
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = self.handler.decode(token)?;

        if claims.is_expired(self.clock.now().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    /// Verify a token and require a specific kind.
    ///
    /// # Errors
    /// * `TokenInvalid` / `TokenExpired` - See [`TokenService::verify`]
    /// * `WrongKind` - Token verified but is of the other kind
    pub fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.verify(token)?;

        if claims.kind != expected {
            return Err(JwtError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }
}
