use thiserror::Error;

/// Error for RegistrationCodeId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationCodeIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for CodeValue validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodeValueError {
    #[error("Registration code is required")]
    Empty,

    #[error("Registration code too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for CodeType parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodeTypeError {
    #[error("Unknown registration code type: {0}")]
    Unknown(String),
}

/// Top-level error for all registration code operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationCodeError {
    #[error("Invalid registration code ID: {0}")]
    InvalidId(#[from] RegistrationCodeIdError),

    #[error("Invalid registration code: {0}")]
    InvalidCode(#[from] CodeValueError),

    #[error("Invalid registration code type: {0}")]
    InvalidType(#[from] CodeTypeError),

    #[error("Invalid registration code name: {0}")]
    InvalidName(String),

    #[error("Maximum uses must be positive, got {0}")]
    InvalidMaxUses(i32),

    // Redemption rejections, checked in this order
    #[error("Registration code is invalid")]
    NotFound,

    #[error("Registration code is disabled")]
    Inactive,

    #[error("Registration code has expired")]
    Expired,

    #[error("Registration code has reached its usage limit")]
    LimitReached,

    // Administration
    #[error("Registration code not found: {0}")]
    NotFoundById(String),

    #[error("Registration code already exists: {0}")]
    AlreadyExists(String),

    #[error("Cannot delete registration code that has been used")]
    AlreadyUsed,

    #[error("Maximum uses ({max_uses}) cannot be lower than current usage ({used_count})")]
    MaxUsesBelowUsage { max_uses: i32, used_count: i32 },

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for RegistrationCodeError {
    fn from(err: anyhow::Error) -> Self {
        RegistrationCodeError::Unknown(err.to_string())
    }
}
