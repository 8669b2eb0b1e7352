use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::account::events::AccountEvent;
use crate::account::events::AccountRegisteredEvent;
use crate::account::events::AccountUpdatedEvent;
use crate::account::events::PasswordResetRequestedEvent;

/// Serializable envelope for all account-related events.
///
/// Infrastructure representation for event publishing (Kafka, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AccountEventMessage {
    AccountRegistered(AccountRegisteredMessage),
    AccountUpdated(AccountUpdatedMessage),
    PasswordResetRequested(PasswordResetRequestedMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRegisteredMessage {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_code_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&AccountRegisteredEvent> for AccountRegisteredMessage {
    fn from(event: &AccountRegisteredEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            account_id: event.account_id.clone(),
            username: event.username.clone(),
            email: event.email.clone(),
            role: event.role.clone(),
            registration_code_id: event.registration_code_id.clone(),
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpdatedMessage {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&AccountUpdatedEvent> for AccountUpdatedMessage {
    fn from(event: &AccountUpdatedEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            account_id: event.account_id.clone(),
            username: event.username.clone(),
            email: event.email.clone(),
            role: event.role.clone(),
            is_active: event.is_active,
            updated_at: event.updated_at,
        }
    }
}

/// Carries the plaintext reset secret to the notifier that emails it.
#[derive(Clone, Serialize, Deserialize)]
pub struct PasswordResetRequestedMessage {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub reset_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for PasswordResetRequestedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetRequestedMessage")
            .field("event_id", &self.event_id)
            .field("account_id", &self.account_id)
            .field("reset_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl From<&PasswordResetRequestedEvent> for PasswordResetRequestedMessage {
    fn from(event: &PasswordResetRequestedEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            account_id: event.account_id.clone(),
            username: event.username.clone(),
            email: event.email.clone(),
            reset_token: event.reset_token.clone(),
            expires_at: event.expires_at,
        }
    }
}

impl From<&AccountEvent> for AccountEventMessage {
    fn from(event: &AccountEvent) -> Self {
        match event {
            AccountEvent::AccountRegistered(e) => AccountEventMessage::AccountRegistered(e.into()),
            AccountEvent::AccountUpdated(e) => AccountEventMessage::AccountUpdated(e.into()),
            AccountEvent::PasswordResetRequested(e) => {
                AccountEventMessage::PasswordResetRequested(e.into())
            }
        }
    }
}
