use std::fmt;
use std::str::FromStr;

use auth::PendingReset;
use auth::TokenPair;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AccountIdError;
use crate::account::errors::EmailError;
use crate::account::errors::PasswordPolicyError;
use crate::account::errors::PersonNameError;
use crate::account::errors::RoleError;
use crate::account::errors::UsernameError;
use crate::registration_code::models::CodeValue;
use crate::registration_code::models::RegistrationCodeId;

/// Account aggregate entity.
///
/// `password_hash` and the pending reset digest never leave the service: no
/// outbound representation carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub pending_reset: Option<PendingReset>,
    /// Set once at registration, never reassigned.
    pub registration_code_id: Option<RegistrationCodeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Minimal identity attached to authenticated requests.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Apply a self-service profile edit. Absent fields keep their value.
    pub fn apply_profile(&mut self, profile: UpdateProfileCommand, now: DateTime<Utc>) {
        if let Some(username) = profile.username {
            self.username = username;
        }
        if let Some(email) = profile.email {
            self.email = email;
        }
        if let Some(first_name) = profile.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = profile.last_name {
            self.last_name = Some(last_name);
        }
        self.updated_at = now;
    }

    /// Apply an administrative edit.
    pub fn apply(&mut self, command: UpdateAccountCommand, now: DateTime<Utc>) {
        self.apply_profile(command.profile, now);
        if let Some(role) = command.role {
            self.role = role;
        }
        if let Some(is_active) = command.is_active {
            self.is_active = is_active;
        }
    }
}

/// Resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: AccountId,
    pub username: Username,
    pub email: EmailAddress,
    pub role: Role,
}

impl Identity {
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Generate a new random account ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, AccountIdError> {
        Uuid::parse_str(s)
            .map(AccountId)
            .map_err(|e| AccountIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-30 characters and contains only ASCII letters and digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 30;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 30 characters
    /// * `InvalidCharacters` - Contains anything other than letters and digits
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// First or last name, 2-50 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    const MIN_LENGTH: usize = 2;
    const MAX_LENGTH: usize = 50;

    pub fn new(name: String) -> Result<Self, PersonNameError> {
        let name = name.trim();
        let length = name.chars().count();

        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(PersonNameError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password that satisfies the password policy.
///
/// Only constructed for passwords being set (registration, reset, change). Login
/// and current-password checks take the raw string.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const SPECIAL_CHARACTERS: &'static str = "@$!%*?&";

    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    /// * `MissingUppercase` / `MissingLowercase` / `MissingDigit` / `MissingSpecial` -
    ///   A required character class is absent
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PasswordPolicyError::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PasswordPolicyError::MissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingDigit);
        }
        if !password.chars().any(|c| Self::SPECIAL_CHARACTERS.contains(c)) {
            return Err(PasswordPolicyError::MissingSpecial);
        }

        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Authorization tier for coarse-grained route gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "viewer" => Ok(Role::Viewer),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command to self-register with a registration code
#[derive(Debug)]
pub struct RegisterAccountCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub registration_code: CodeValue,
}

/// Command to log in with a username or an email address
pub struct LoginCommand {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Command to change the caller's own password
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: Password,
}

impl fmt::Debug for ChangePasswordCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordCommand")
            .field("current_password", &"<redacted>")
            .field("new_password", &self.new_password)
            .finish()
    }
}

/// Command to complete a password reset
pub struct ResetPasswordCommand {
    pub token: String,
    pub password: Password,
}

impl fmt::Debug for ResetPasswordCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordCommand")
            .field("token", &"<redacted>")
            .field("password", &self.password)
            .finish()
    }
}

/// Command to create an account directly, bypassing registration codes.
#[derive(Debug)]
pub struct CreateAccountCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub role: Role,
}

/// Profile fields an account holder may change on their own account.
///
/// All fields are optional to support partial updates.
#[derive(Debug, Default)]
pub struct UpdateProfileCommand {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
}

impl UpdateProfileCommand {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

/// Administrative edit of an account: any profile field plus role and active flag.
#[derive(Debug, Default)]
pub struct UpdateAccountCommand {
    pub profile: UpdateProfileCommand,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateAccountCommand {
    pub fn is_empty(&self) -> bool {
        self.profile.is_empty() && self.role.is_none() && self.is_active.is_none()
    }
}

/// An authenticated account together with its freshly issued tokens.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: Account,
    pub tokens: TokenPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(Username::new("alice01".to_string()).is_ok());
        assert_eq!(
            Username::new("al".to_string()),
            Err(UsernameError::TooShort { min: 3, actual: 2 })
        );
        assert_eq!(
            Username::new("a".repeat(31)),
            Err(UsernameError::TooLong {
                max: 30,
                actual: 31
            })
        );
        assert_eq!(
            Username::new("alice_01".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
    }

    #[test]
    fn test_email_validation() {
        assert!(EmailAddress::new("alice@example.com".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_person_name_rules() {
        assert_eq!(PersonName::new(" Ada ".to_string()).unwrap().as_str(), "Ada");
        assert!(PersonName::new("A".to_string()).is_err());
        assert!(PersonName::new("A".repeat(51)).is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(Password::new("Str0ng!pass".to_string()).is_ok());

        let cases = [
            ("S0!a", PasswordPolicyError::TooShort { min: 8, actual: 4 }),
            ("str0ng!pass", PasswordPolicyError::MissingUppercase),
            ("STR0NG!PASS", PasswordPolicyError::MissingLowercase),
            ("Strong!pass", PasswordPolicyError::MissingDigit),
            ("Str0ngpass", PasswordPolicyError::MissingSpecial),
        ];

        for (candidate, expected) in cases {
            assert_eq!(Password::new(candidate.to_string()), Err(expected));
        }
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("Str0ng!pass".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("Str0ng"));
    }

    #[test]
    fn test_command_debug_hides_secrets() {
        let login = LoginCommand {
            login: "alice01".to_string(),
            password: "hunter2-plain".to_string(),
        };
        let change = ChangePasswordCommand {
            current_password: "hunter2-plain".to_string(),
            new_password: Password::new("Str0ng!pass".to_string()).unwrap(),
        };
        let reset = ResetPasswordCommand {
            token: "3f9a0c1d2e".to_string(),
            password: Password::new("Str0ng!pass".to_string()).unwrap(),
        };

        let login = format!("{:?}", login);
        assert!(login.contains("alice01"));
        assert!(!login.contains("hunter2"));

        let change = format!("{:?}", change);
        assert!(!change.contains("hunter2"));
        assert!(!change.contains("Str0ng"));

        let reset = format!("{:?}", reset);
        assert!(!reset.contains("3f9a0c1d2e"));
        assert!(!reset.contains("Str0ng"));
    }

    #[test]
    fn test_admin_edit_applies_profile_and_role() {
        let created = Utc::now();
        let mut account = Account {
            id: AccountId::new(),
            username: Username::new("alice01".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: None,
            last_name: Some(PersonName::new("Liddell".to_string()).unwrap()),
            role: Role::User,
            is_active: true,
            last_login: None,
            pending_reset: None,
            registration_code_id: None,
            created_at: created,
            updated_at: created,
        };
        let later = created + chrono::Duration::minutes(5);

        account.apply(
            UpdateAccountCommand {
                profile: UpdateProfileCommand {
                    email: Some(EmailAddress::new("alice@corp.example".to_string()).unwrap()),
                    first_name: Some(PersonName::new("Alice".to_string()).unwrap()),
                    ..Default::default()
                },
                role: Some(Role::Viewer),
                is_active: None,
            },
            later,
        );

        assert_eq!(account.username.as_str(), "alice01");
        assert_eq!(account.email.as_str(), "alice@corp.example");
        assert_eq!(account.first_name.as_ref().map(PersonName::as_str), Some("Alice"));
        assert_eq!(account.last_name.as_ref().map(PersonName::as_str), Some("Liddell"));
        assert_eq!(account.role, Role::Viewer);
        assert!(account.is_active);
        assert_eq!(account.updated_at, later);
        assert!(UpdateAccountCommand::default().is_empty());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("viewer".parse::<Role>(), Ok(Role::Viewer));
        assert_eq!(
            "root".parse::<Role>(),
            Err(RoleError::Unknown("root".to_string()))
        );
    }

    #[test]
    fn test_identity_role_check() {
        let identity = Identity {
            id: AccountId::new(),
            username: Username::new("viewer1".to_string()).unwrap(),
            email: EmailAddress::new("viewer1@example.com".to_string()).unwrap(),
            role: Role::Viewer,
        };

        assert!(!identity.has_any_role(&[Role::Admin]));
        assert!(identity.has_any_role(&[Role::Admin, Role::Viewer]));
    }
}
