use thiserror::Error;

/// Failures while hashing or checking passwords.
///
/// A wrong password is not an error; verification reports it as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// The stored value is not a PHC-format Argon2 hash
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),
}
