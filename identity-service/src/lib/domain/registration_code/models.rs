use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::models::AccountId;
use crate::registration_code::errors::CodeTypeError;
use crate::registration_code::errors::CodeValueError;
use crate::registration_code::errors::RegistrationCodeError;
use crate::registration_code::errors::RegistrationCodeIdError;

/// Operator-issued gate value required to self-register.
///
/// `used_count` only ever grows, and never exceeds `max_uses` when a limit is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationCode {
    pub id: RegistrationCodeId,
    pub code: CodeValue,
    pub name: String,
    pub description: Option<String>,
    pub code_type: CodeType,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationCode {
    /// Check that the code may be redeemed at `now`.
    ///
    /// Checks run in a fixed order and the first failure wins: inactive,
    /// expired, then usage limit.
    ///
    /// # Errors
    /// * `Inactive` - Code has been disabled
    /// * `Expired` - Expiry is set and has passed
    /// * `LimitReached` - Every allowed use has been recorded
    pub fn ensure_redeemable(&self, now: DateTime<Utc>) -> Result<(), RegistrationCodeError> {
        if !self.is_active {
            return Err(RegistrationCodeError::Inactive);
        }

        if self.is_expired(now) {
            return Err(RegistrationCodeError::Expired);
        }

        if !self.has_capacity() {
            return Err(RegistrationCodeError::LimitReached);
        }

        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Whether another use can be recorded without passing `max_uses`.
    pub fn has_capacity(&self) -> bool {
        self.max_uses
            .map_or(true, |max_uses| self.used_count < max_uses)
    }

    /// Record one use in memory, refusing to pass the limit.
    ///
    /// Storage adapters must perform the same conditional increment atomically.
    pub fn record_use(&mut self, now: DateTime<Utc>) -> Result<(), RegistrationCodeError> {
        if !self.has_capacity() {
            return Err(RegistrationCodeError::LimitReached);
        }

        self.used_count += 1;
        self.updated_at = now;
        Ok(())
    }

    /// Apply an administrative edit.
    ///
    /// # Errors
    /// * `MaxUsesBelowUsage` - New limit is lower than the recorded usage
    pub fn apply(
        &mut self,
        command: UpdateRegistrationCodeCommand,
        now: DateTime<Utc>,
    ) -> Result<(), RegistrationCodeError> {
        if let Some(Some(max_uses)) = command.max_uses {
            if max_uses < self.used_count {
                return Err(RegistrationCodeError::MaxUsesBelowUsage {
                    max_uses,
                    used_count: self.used_count,
                });
            }
        }

        if let Some(name) = command.name {
            self.name = name;
        }
        if let Some(description) = command.description {
            self.description = description;
        }
        if let Some(code_type) = command.code_type {
            self.code_type = code_type;
        }
        if let Some(max_uses) = command.max_uses {
            self.max_uses = max_uses;
        }
        if let Some(is_active) = command.is_active {
            self.is_active = is_active;
        }
        if let Some(expires_at) = command.expires_at {
            self.expires_at = expires_at;
        }

        self.updated_at = now;
        Ok(())
    }
}

/// Registration code unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationCodeId(pub Uuid);

impl RegistrationCodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a registration code ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, RegistrationCodeIdError> {
        Uuid::parse_str(s)
            .map(RegistrationCodeId)
            .map_err(|e| RegistrationCodeIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for RegistrationCodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationCodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Registration code value type
///
/// Surrounding whitespace is trimmed; the rest must be 1-50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeValue(String);

impl CodeValue {
    const MAX_LENGTH: usize = 50;

    pub fn new(code: String) -> Result<Self, CodeValueError> {
        let code = code.trim();
        let length = code.chars().count();

        if length == 0 {
            Err(CodeValueError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(CodeValueError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Audience a registration code was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeType {
    Organization,
    Department,
    #[default]
    General,
}

impl CodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeType::Organization => "organization",
            CodeType::Department => "department",
            CodeType::General => "general",
        }
    }
}

impl FromStr for CodeType {
    type Err = CodeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(CodeType::Organization),
            "department" => Ok(CodeType::Department),
            "general" => Ok(CodeType::General),
            other => Err(CodeTypeError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MAX_NAME_LENGTH: usize = 100;

fn validate_name(name: String) -> Result<String, RegistrationCodeError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();

    if length == 0 || length > MAX_NAME_LENGTH {
        return Err(RegistrationCodeError::InvalidName(format!(
            "must be 1-{} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(trimmed.to_string())
}

fn validate_max_uses(max_uses: Option<i32>) -> Result<Option<i32>, RegistrationCodeError> {
    match max_uses {
        Some(value) if value < 1 => Err(RegistrationCodeError::InvalidMaxUses(value)),
        other => Ok(other),
    }
}

/// Command to create a new registration code with domain types
#[derive(Debug, Clone)]
pub struct CreateRegistrationCodeCommand {
    pub code: CodeValue,
    pub name: String,
    pub description: Option<String>,
    pub code_type: CodeType,
    pub max_uses: Option<i32>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateRegistrationCodeCommand {
    /// # Errors
    /// * `InvalidName` - Name is blank or too long
    /// * `InvalidMaxUses` - Limit is set but not positive
    pub fn new(
        code: CodeValue,
        name: String,
        description: Option<String>,
        code_type: CodeType,
        max_uses: Option<i32>,
        is_active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, RegistrationCodeError> {
        Ok(Self {
            code,
            name: validate_name(name)?,
            description,
            code_type,
            max_uses: validate_max_uses(max_uses)?,
            is_active,
            expires_at,
        })
    }
}

/// Command to edit a registration code.
///
/// Outer `None` leaves a field unchanged; `Some(None)` clears a nullable field.
/// The usage counter is not editable.
#[derive(Debug, Clone, Default)]
pub struct UpdateRegistrationCodeCommand {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub code_type: Option<CodeType>,
    pub max_uses: Option<Option<i32>>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateRegistrationCodeCommand {
    /// # Errors
    /// * `InvalidName` - Name is blank or too long
    /// * `InvalidMaxUses` - Limit is set but not positive
    pub fn new(
        name: Option<String>,
        description: Option<Option<String>>,
        code_type: Option<CodeType>,
        max_uses: Option<Option<i32>>,
        is_active: Option<bool>,
        expires_at: Option<Option<DateTime<Utc>>>,
    ) -> Result<Self, RegistrationCodeError> {
        Ok(Self {
            name: name.map(validate_name).transpose()?,
            description,
            code_type,
            max_uses: max_uses.map(validate_max_uses).transpose()?,
            is_active,
            expires_at,
        })
    }
}
