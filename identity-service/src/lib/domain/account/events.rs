use auth::ResetTicket;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::models::Account;

/// Envelope for all account-related domain events.
#[derive(Debug, Clone)]
pub enum AccountEvent {
    AccountRegistered(AccountRegisteredEvent),
    AccountUpdated(AccountUpdatedEvent),
    PasswordResetRequested(PasswordResetRequestedEvent),
}

impl AccountEvent {
    pub fn event_id(&self) -> &str {
        match self {
            AccountEvent::AccountRegistered(e) => &e.event_id,
            AccountEvent::AccountUpdated(e) => &e.event_id,
            AccountEvent::PasswordResetRequested(e) => &e.event_id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            AccountEvent::AccountRegistered(_) => "account_registered",
            AccountEvent::AccountUpdated(_) => "account_updated",
            AccountEvent::PasswordResetRequested(_) => "password_reset_requested",
        }
    }

    /// Account the event relates to; used as the partition key.
    pub fn account_id(&self) -> &str {
        match self {
            AccountEvent::AccountRegistered(e) => &e.account_id,
            AccountEvent::AccountUpdated(e) => &e.account_id,
            AccountEvent::PasswordResetRequested(e) => &e.account_id,
        }
    }
}

/// Domain event published when an account is created.
#[derive(Debug, Clone)]
pub struct AccountRegisteredEvent {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub registration_code_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccountRegisteredEvent {
    pub fn new(account: &Account) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.as_str().to_string(),
            registration_code_id: account.registration_code_id.map(|id| id.to_string()),
            created_at: account.created_at,
        }
    }
}

/// Domain event published when an account's profile, role or active flag changes.
#[derive(Debug, Clone)]
pub struct AccountUpdatedEvent {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl AccountUpdatedEvent {
    pub fn new(account: &Account) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.as_str().to_string(),
            is_active: account.is_active,
            updated_at: account.updated_at,
        }
    }
}

/// Domain event handed to the notifier so it can deliver the reset secret.
///
/// This is the only place the plaintext secret leaves the service.
#[derive(Clone)]
pub struct PasswordResetRequestedEvent {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub reset_token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetRequestedEvent {
    pub fn new(account: &Account, ticket: &ResetTicket) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            reset_token: ticket.secret.clone(),
            expires_at: ticket.expires_at,
        }
    }
}

impl std::fmt::Debug for PasswordResetRequestedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetRequestedEvent")
            .field("event_id", &self.event_id)
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("reset_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
