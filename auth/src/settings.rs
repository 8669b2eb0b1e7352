use std::fmt;

use chrono::Duration;
use thiserror::Error;

use crate::password::HashingParams;

/// Minimum signing secret length for HS256.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for invalid authentication settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthSettingsError {
    #[error("Signing secret too short: minimum {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("Token lifetime must be positive: {0}")]
    NonPositiveTtl(&'static str),

    #[error("Access token lifetime must be shorter than refresh token lifetime")]
    AccessOutlivesRefresh,

    #[error("Invalid password hashing parameters: {0}")]
    InvalidHashingParams(String),
}

/// Explicit authentication configuration.
///
/// Built once at startup and handed to [`crate::TokenService`] and
/// [`crate::PasswordHasher`]; nothing in this crate reads ambient state.
#[derive(Clone)]
pub struct AuthSettings {
    jwt_secret: Vec<u8>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    hashing: HashingParams,
}

impl AuthSettings {
    /// Access tokens live for minutes.
    pub fn default_access_token_ttl() -> Duration {
        Duration::minutes(15)
    }

    /// Refresh tokens live for days.
    pub fn default_refresh_token_ttl() -> Duration {
        Duration::days(7)
    }

    /// Validate and build settings.
    ///
    /// # Errors
    /// * `SecretTooShort` - Secret shorter than [`MIN_SECRET_LENGTH`]
    /// * `NonPositiveTtl` - A token lifetime is zero or negative
    /// * `AccessOutlivesRefresh` - Access lifetime is not shorter than refresh lifetime
    /// * `InvalidHashingParams` - Argon2 rejects the work factor
    pub fn new(
        jwt_secret: impl Into<Vec<u8>>,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
        hashing: HashingParams,
    ) -> Result<Self, AuthSettingsError> {
        let jwt_secret = jwt_secret.into();

        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthSettingsError::SecretTooShort {
                min: MIN_SECRET_LENGTH,
                actual: jwt_secret.len(),
            });
        }
        if access_token_ttl <= Duration::zero() {
            return Err(AuthSettingsError::NonPositiveTtl("access"));
        }
        if refresh_token_ttl <= Duration::zero() {
            return Err(AuthSettingsError::NonPositiveTtl("refresh"));
        }
        if access_token_ttl >= refresh_token_ttl {
            return Err(AuthSettingsError::AccessOutlivesRefresh);
        }
        hashing
            .to_argon2()
            .map_err(|e| AuthSettingsError::InvalidHashingParams(e.to_string()))?;

        Ok(Self {
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            hashing,
        })
    }

    pub fn jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    pub fn hashing(&self) -> HashingParams {
        self.hashing
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("hashing", &self.hashing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_valid_settings() {
        let settings = AuthSettings::new(
            SECRET,
            AuthSettings::default_access_token_ttl(),
            AuthSettings::default_refresh_token_ttl(),
            HashingParams::default(),
        )
        .expect("Settings should be valid");

        assert_eq!(settings.jwt_secret(), SECRET);
        assert_eq!(settings.access_token_ttl(), Duration::minutes(15));
        assert_eq!(settings.refresh_token_ttl(), Duration::days(7));
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = AuthSettings::new(
            "short",
            Duration::minutes(15),
            Duration::days(7),
            HashingParams::default(),
        );

        assert_eq!(
            result.unwrap_err(),
            AuthSettingsError::SecretTooShort { min: 32, actual: 5 }
        );
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let result = AuthSettings::new(
            SECRET,
            Duration::zero(),
            Duration::days(7),
            HashingParams::default(),
        );
        assert_eq!(result.unwrap_err(), AuthSettingsError::NonPositiveTtl("access"));
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let result = AuthSettings::new(
            SECRET,
            Duration::days(8),
            Duration::days(7),
            HashingParams::default(),
        );
        assert_eq!(result.unwrap_err(), AuthSettingsError::AccessOutlivesRefresh);
    }

    #[test]
    fn test_invalid_hashing_params_rejected() {
        let hashing = HashingParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        let result = AuthSettings::new(SECRET, Duration::minutes(15), Duration::days(7), hashing);
        assert!(matches!(
            result.unwrap_err(),
            AuthSettingsError::InvalidHashingParams(_)
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = AuthSettings::new(
            SECRET,
            Duration::minutes(15),
            Duration::days(7),
            HashingParams::default(),
        )
        .unwrap();

        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("test_secret_key"));
    }
}
