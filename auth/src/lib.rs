//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for the identity service:
//! - Password hashing (Argon2id)
//! - Signed access/refresh session tokens with clock-driven expiry
//! - Single-use password reset secrets (stored as SHA-256 digests)
//! - Explicit, validated configuration
//!
//! Nothing here touches storage. The service owns persistence and adapts these
//! primitives behind its own ports.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::{AuthSettings, HashingParams, SystemClock, TokenKind, TokenService};
//!
//! let settings = AuthSettings::new(
//!     b"secret_key_at_least_32_bytes_long!".to_vec(),
//!     AuthSettings::default_access_token_ttl(),
//!     AuthSettings::default_refresh_token_ttl(),
//!     HashingParams::default(),
//! )
//! .unwrap();
//!
//! let tokens = TokenService::new(&settings, Arc::new(SystemClock));
//! let pair = tokens.issue_pair("user123").unwrap();
//! let claims = tokens.verify_kind(&pair.access_token, TokenKind::Access).unwrap();
//! assert_eq!(claims.user_id, "user123");
//! ```
//!
//! ## Password Reset
//! ```
//! use std::sync::Arc;
//!
//! use auth::{PasswordResetService, PendingReset, SystemClock};
//!
//! let resets = PasswordResetService::new(Arc::new(SystemClock));
//! let ticket = resets.request();
//! let mut pending = Some(PendingReset::from(&ticket));
//!
//! assert!(resets.consume(&ticket.secret, &mut pending));
//! assert!(!resets.consume(&ticket.secret, &mut pending));
//! ```

pub mod authenticator;
pub mod clock;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod settings;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenKind;
pub use jwt::TokenPair;
pub use jwt::TokenService;
pub use password::HashingParams;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use reset::PasswordResetService;
pub use reset::PendingReset;
pub use reset::ResetTicket;
pub use settings::AuthSettings;
pub use settings::AuthSettingsError;
