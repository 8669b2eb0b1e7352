use std::sync::Arc;

use crate::clock::Clock;
use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenKind;
use crate::jwt::TokenPair;
use crate::jwt::TokenService;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::settings::AuthSettings;
use crate::settings::AuthSettingsError;

/// Authentication coordinator combining password verification and token issuance.
///
/// Owns the [`PasswordHasher`] and the [`TokenService`], both built from the same
/// [`AuthSettings`].
pub struct Authenticator {
    password_hasher: PasswordHasher,
    tokens: TokenService,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Errors
    /// * `InvalidHashingParams` - The configured work factor is rejected
    pub fn new(settings: &AuthSettings, clock: Arc<dyn Clock>) -> Result<Self, AuthSettingsError> {
        let password_hasher = PasswordHasher::new(settings.hashing())
            .map_err(|e| AuthSettingsError::InvalidHashingParams(e.to_string()))?;

        Ok(Self {
            password_hasher,
            tokens: TokenService::new(settings, clock),
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// # Errors
    /// * `PasswordError` - Stored hash is unreadable
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue a token pair for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Password verification failed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<TokenPair, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.tokens.issue_pair(subject)?)
    }

    /// Issue a token pair without password verification.
    ///
    /// Used after registration and on refresh, where identity was established
    /// by other means.
    pub fn issue_tokens(&self, subject: &str) -> Result<TokenPair, JwtError> {
        self.tokens.issue_pair(subject)
    }

    /// Verify any session token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.tokens.verify(token)
    }

    /// Verify a session token of a specific kind.
    pub fn validate_token_of_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        self.tokens.verify_kind(token, kind)
    }
}
