use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Clock;
use auth::PasswordResetService;
use auth::PendingReset;
use auth::TokenKind;
use auth::TokenPair;

use crate::account::errors::AccountError;
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
use crate::account::models::Password;
use crate::account::models::RegisterAccountCommand;
use crate::account::models::ResetPasswordCommand;
use crate::account::models::Role;
use crate::account::models::UpdateAccountCommand;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::EventPublisher;
use crate::registration_code::ports::RegistrationCodeServicePort;

/// Domain service implementation for account operations.
///
/// Password hashing and verification run on the blocking pool; nothing here
/// holds a lock across them.
pub struct AccountService<AR, RG, EP>
where
    AR: AccountRepository,
    RG: RegistrationCodeServicePort,
    EP: EventPublisher,
{
    repository: Arc<AR>,
    registration_codes: Arc<RG>,
    event_publisher: Arc<EP>,
    authenticator: Arc<Authenticator>,
    resets: PasswordResetService,
    clock: Arc<dyn Clock>,
}

impl<AR, RG, EP> AccountService<AR, RG, EP>
where
    AR: AccountRepository,
    RG: RegistrationCodeServicePort,
    EP: EventPublisher,
{
    /// Create a new account service with injected dependencies.
    ///
    /// `clock` must be the clock the authenticator's token service reads.
    pub fn new(
        repository: Arc<AR>,
        registration_codes: Arc<RG>,
        event_publisher: Arc<EP>,
        authenticator: Arc<Authenticator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registration_codes,
            event_publisher,
            authenticator,
            resets: PasswordResetService::new(Arc::clone(&clock)),
            clock,
        }
    }

    async fn hash_password(&self, password: Password) -> Result<String, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(password.expose()))
            .await
            .map_err(|e| AccountError::PasswordHashing(e.to_string()))?
            .map_err(|e| AccountError::PasswordHashing(e.to_string()))
    }

    async fn verify_password(
        &self,
        password: String,
        password_hash: String,
    ) -> Result<bool, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &password_hash))
            .await
            .map_err(|e| AccountError::PasswordHashing(e.to_string()))?
            .map_err(|e| AccountError::PasswordHashing(e.to_string()))
    }

    fn issue_tokens(&self, account: &Account) -> Result<TokenPair, AccountError> {
        self.authenticator
            .issue_tokens(&account.id.to_string())
            .map_err(|e| AccountError::TokenIssuance(e.to_string()))
    }

    async fn find_existing(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn announce_update(&self, account: &Account) {
        let event = AccountUpdatedEvent::new(account);
        if let Err(e) = self.event_publisher.publish_account_updated(&event).await {
            tracing::error!(
                "Failed to publish AccountUpdated event for account {}: {}",
                account.id,
                e
            );
        }
    }

    async fn announce_registration(&self, account: &Account) {
        let event = AccountRegisteredEvent::new(account);
        if let Err(e) = self.event_publisher.publish_account_registered(&event).await {
            tracing::error!(
                "Failed to publish AccountRegistered event for account {}: {}",
                account.id,
                e
            );
        }
    }
}

#[async_trait]
impl<AR, RG, EP> AccountServicePort for AccountService<AR, RG, EP>
where
    AR: AccountRepository,
    RG: RegistrationCodeServicePort,
    EP: EventPublisher,
{
    async fn register(&self, command: RegisterAccountCommand) -> Result<AuthSession, AccountError> {
        // Cheap rejection before paying for the hash; the repository re-checks under lock
        self.registration_codes
            .validate(&command.registration_code)
            .await?;

        let password_hash = self.hash_password(command.password).await?;
        let now = self.clock.now();

        let account = Account {
            id: AccountId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            first_name: command.first_name,
            last_name: command.last_name,
            role: Role::User,
            is_active: true,
            last_login: None,
            pending_reset: None,
            registration_code_id: None,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repository
            .create_with_registration_code(account, &command.registration_code, now)
            .await?;

        let tokens = self.issue_tokens(&created)?;

        tracing::info!(
            account_id = %created.id,
            username = %created.username,
            registration_code = %command.registration_code,
            "Account registered"
        );

        self.announce_registration(&created).await;

        Ok(AuthSession {
            account: created,
            tokens,
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AccountError> {
        let account = self
            .repository
            .find_by_login(&command.login)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AccountError::AccountInactive);
        }

        let authenticator = Arc::clone(&self.authenticator);
        let password_hash = account.password_hash.clone();
        let subject = account.id.to_string();
        let tokens = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&command.password, &password_hash, &subject)
        })
        .await
        .map_err(|e| AccountError::PasswordHashing(e.to_string()))?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                tracing::info!(account_id = %account.id, "Login rejected: wrong password");
                AccountError::InvalidCredentials
            }
            AuthenticationError::PasswordError(e) => AccountError::PasswordHashing(e.to_string()),
            AuthenticationError::JwtError(e) => AccountError::TokenIssuance(e.to_string()),
        })?;

        let now = self.clock.now();
        self.repository.record_login(&account.id, now).await?;

        tracing::info!(account_id = %account.id, username = %account.username, "Account logged in");

        Ok(AuthSession {
            account: Account {
                last_login: Some(now),
                ..account
            },
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AccountError> {
        let claims = self
            .authenticator
            .validate_token_of_kind(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh token rejected");
                AccountError::InvalidRefreshToken
            })?;

        let id = AccountId::from_string(&claims.user_id)
            .map_err(|_| AccountError::InvalidRefreshToken)?;

        let account = self
            .repository
            .find_by_id(&id)
            .await?
            .filter(|account| account.is_active)
            .ok_or(AccountError::RefreshSubjectUnavailable)?;

        let tokens = self.issue_tokens(&account)?;

        tracing::info!(account_id = %account.id, "Token pair refreshed");

        Ok(AuthSession { account, tokens })
    }

    async fn authenticate(&self, access_token: &str) -> Result<Account, AccountError> {
        let claims = self
            .authenticator
            .validate_token_of_kind(access_token, TokenKind::Access)
            .map_err(|e| {
                tracing::warn!(error = %e, "Access token rejected");
                AccountError::Unauthenticated
            })?;

        let id =
            AccountId::from_string(&claims.user_id).map_err(|_| AccountError::Unauthenticated)?;

        let account = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(AccountError::AccountNoLongerExists)?;

        if !account.is_active {
            return Err(AccountError::AccountInactive);
        }

        Ok(account)
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AccountError> {
        let account = match self.repository.find_by_email(email).await? {
            Some(account) if account.is_active => account,
            _ => {
                tracing::info!("Password reset requested for unknown or inactive email");
                return Ok(());
            }
        };

        let ticket = self.resets.request();
        self.repository
            .store_pending_reset(&account.id, &PendingReset::from(&ticket), self.clock.now())
            .await?;

        tracing::info!(
            account_id = %account.id,
            expires_at = %ticket.expires_at,
            "Password reset requested"
        );

        // Response time must not depend on whether the email exists
        let event = PasswordResetRequestedEvent::new(&account, &ticket);
        let event_publisher = Arc::clone(&self.event_publisher);
        tokio::spawn(async move {
            if let Err(e) = event_publisher.publish_password_reset_requested(&event).await {
                tracing::error!(
                    "Failed to publish PasswordResetRequested event for account {}: {}",
                    event.account_id,
                    e
                );
            }
        });

        Ok(())
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AccountError> {
        let digest = auth::reset::digest(&command.token);

        let account = self
            .repository
            .find_by_reset_digest(&digest)
            .await?
            .ok_or(AccountError::ResetTokenInvalidOrExpired)?;

        let mut pending = account.pending_reset.clone();
        if !self.resets.consume(&command.token, &mut pending) {
            return Err(AccountError::ResetTokenInvalidOrExpired);
        }

        let password_hash = self.hash_password(command.password).await?;

        // Another request may have consumed the same secret meanwhile
        let consumed = self
            .repository
            .complete_reset(&account.id, &digest, &password_hash, self.clock.now())
            .await?;
        if !consumed {
            return Err(AccountError::ResetTokenInvalidOrExpired);
        }

        tracing::info!(account_id = %account.id, "Password reset completed");

        Ok(())
    }

    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError> {
        let account = self.find_existing(id).await?;

        let is_valid = self
            .verify_password(command.current_password, account.password_hash)
            .await?;
        if !is_valid {
            return Err(AccountError::IncorrectCurrentPassword);
        }

        let password_hash = self.hash_password(command.new_password).await?;
        self.repository
            .update_password(id, &password_hash, self.clock.now())
            .await?;

        tracing::info!(account_id = %id, "Password changed");

        Ok(())
    }

    async fn create_account(&self, command: CreateAccountCommand) -> Result<Account, AccountError> {
        let password_hash = self.hash_password(command.password).await?;
        let now = self.clock.now();

        let account = Account {
            id: AccountId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            first_name: command.first_name,
            last_name: command.last_name,
            role: command.role,
            is_active: true,
            last_login: None,
            pending_reset: None,
            registration_code_id: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(account).await?;

        tracing::info!(
            account_id = %created.id,
            username = %created.username,
            role = %created.role,
            "Account created"
        );

        self.announce_registration(&created).await;

        Ok(created)
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.find_existing(id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        self.repository.list_all().await
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError> {
        let mut account = self.find_existing(id).await?;

        account.apply_profile(command, self.clock.now());

        let updated = self.repository.update(account).await?;

        tracing::info!(account_id = %updated.id, "Profile updated");

        self.announce_update(&updated).await;

        Ok(updated)
    }

    async fn update_account(
        &self,
        id: &AccountId,
        command: UpdateAccountCommand,
    ) -> Result<Account, AccountError> {
        let mut account = self.find_existing(id).await?;

        account.apply(command, self.clock.now());

        let updated = self.repository.update(account).await?;

        self.announce_update(&updated).await;

        Ok(updated)
    }
}
