use async_trait::async_trait;
use auth::PendingReset;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::errors::EventPublisherError;
use crate::account::events::AccountRegisteredEvent;
use crate::account::events::AccountUpdatedEvent;
use crate::account::events::PasswordResetRequestedEvent;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthSession;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::CreateAccountCommand;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterAccountCommand;
use crate::account::models::ResetPasswordCommand;
use crate::account::models::UpdateAccountCommand;
use crate::account::models::UpdateProfileCommand;
use crate::registration_code::models::CodeValue;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Self-register with a registration code and receive an initial token pair.
    ///
    /// The code use and the account insert commit together or not at all.
    ///
    /// # Errors
    /// * `RegistrationCode(NotFound | Inactive | Expired | LimitReached)` - Code rejected
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Identity taken
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterAccountCommand) -> Result<AuthSession, AccountError>;

    /// Verify a username-or-email and password, then issue a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown login or wrong password
    /// * `AccountInactive` - Account is deactivated
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AccountError>;

    /// Exchange a refresh token for a new token pair.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Token fails verification or is not a refresh token
    /// * `RefreshSubjectUnavailable` - Subject account is missing or inactive
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AccountError>;

    /// Resolve the account behind an access token.
    ///
    /// # Errors
    /// * `Unauthenticated` - Token fails verification or is not an access token
    /// * `AccountNoLongerExists` - Subject account was removed
    /// * `AccountInactive` - Subject account is deactivated
    async fn authenticate(&self, access_token: &str) -> Result<Account, AccountError>;

    /// Start a password reset for the active account owning `email`, if any.
    ///
    /// Succeeds identically whether or not such an account exists.
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AccountError>;

    /// Complete a password reset with the secret from the reset request.
    ///
    /// # Errors
    /// * `ResetTokenInvalidOrExpired` - Secret unknown, already used or expired
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AccountError>;

    /// # Errors
    /// * `IncorrectCurrentPassword` - Current password does not match
    /// * `NotFound` - Account does not exist
    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError>;

    /// Create an account without a registration code (operator bootstrap).
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Identity taken
    async fn create_account(&self, command: CreateAccountCommand) -> Result<Account, AccountError>;

    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;

    /// Change the caller's own username, email or names.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Identity taken by another account
    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError>;

    /// Change any profile field of an account, its role or its active flag.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Identity taken by another account
    async fn update_account(
        &self,
        id: &AccountId,
        command: UpdateAccountCommand,
    ) -> Result<Account, AccountError>;
}

/// Persistence operations for account aggregate.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account while redeeming `code`, atomically.
    ///
    /// Locks the code, re-checks redeemability at `now`, inserts the account with
    /// its `registration_code_id` set, and increments the code's usage only if the
    /// limit allows. Any failure leaves both untouched.
    ///
    /// # Errors
    /// * `RegistrationCode(..)` - Code missing or not redeemable at commit time
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Identity taken
    /// * `DatabaseError` - Database operation failed
    async fn create_with_registration_code(
        &self,
        account: Account,
        code: &CodeValue,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountError>;

    /// Persist a new account with no registration code.
    async fn create(&self, account: Account) -> Result<Account, AccountError>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Find an account whose username or email equals `login`.
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, AccountError>;

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError>;

    /// Find the account holding a pending reset with this digest.
    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Account>, AccountError>;

    async fn list_all(&self) -> Result<Vec<Account>, AccountError>;

    /// Persist role and active flag.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn update(&self, account: Account) -> Result<Account, AccountError>;

    async fn record_login(&self, id: &AccountId, at: DateTime<Utc>) -> Result<(), AccountError>;

    /// Replace any pending reset on the account.
    async fn store_pending_reset(
        &self,
        id: &AccountId,
        reset: &PendingReset,
        at: DateTime<Utc>,
    ) -> Result<(), AccountError>;

    /// Set the new password and clear the pending reset, only if the pending
    /// digest still equals `digest`.
    ///
    /// # Returns
    /// Whether the reset was consumed by this call
    async fn complete_reset(
        &self,
        id: &AccountId,
        digest: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AccountError>;

    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn update_password(
        &self,
        id: &AccountId,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AccountError>;
}

/// Event publishing for domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish_account_registered(
        &self,
        event: &AccountRegisteredEvent,
    ) -> Result<(), EventPublisherError>;

    async fn publish_account_updated(
        &self,
        event: &AccountUpdatedEvent,
    ) -> Result<(), EventPublisherError>;

    /// Hand a reset secret to the out-of-band notifier.
    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError>;
}
