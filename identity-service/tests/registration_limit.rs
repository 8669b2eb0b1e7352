//! Concurrent registrations against a capped registration code.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::AuthSettings;
use auth::Authenticator;
use auth::Clock;
use auth::HashingParams;
use auth::PendingReset;
use auth::SystemClock;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use futures::future::join_all;
use identity_service::account::errors::AccountError;
use identity_service::account::errors::EventPublisherError;
use identity_service::account::events::AccountRegisteredEvent;
use identity_service::account::events::AccountUpdatedEvent;
use identity_service::account::events::PasswordResetRequestedEvent;
use identity_service::account::models::Account;
use identity_service::account::models::AccountId;
use identity_service::account::models::EmailAddress;
use identity_service::account::models::Password;
use identity_service::account::models::RegisterAccountCommand;
use identity_service::account::models::Username;
use identity_service::account::ports::AccountRepository;
use identity_service::account::ports::AccountServicePort;
use identity_service::account::ports::EventPublisher;
use identity_service::account::service::AccountService;
use identity_service::registration_code::errors::RegistrationCodeError;
use identity_service::registration_code::models::CodeType;
use identity_service::registration_code::models::CodeValue;
use identity_service::registration_code::models::RegistrationCode;
use identity_service::registration_code::models::RegistrationCodeId;
use identity_service::registration_code::ports::RegistrationCodeRepository;
use identity_service::registration_code::service::RegistrationCodeService;

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    codes: Vec<RegistrationCode>,
}

/// Both repositories over one lock, so a redemption is a single critical section.
#[derive(Default)]
struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    fn with_code(code: RegistrationCode) -> Self {
        let store = Self::default();
        store.tables.lock().unwrap().codes.push(code);
        store
    }

    fn code(&self, id: &RegistrationCodeId) -> RegistrationCode {
        self.tables
            .lock()
            .unwrap()
            .codes
            .iter()
            .find(|code| code.id == *id)
            .cloned()
            .expect("code should exist")
    }

    fn account_count(&self) -> usize {
        self.tables.lock().unwrap().accounts.len()
    }
}

fn insert_account(tables: &mut Tables, account: Account) -> Result<Account, AccountError> {
    if tables.accounts.iter().any(|a| a.username == account.username) {
        return Err(AccountError::UsernameAlreadyExists(
            account.username.as_str().to_string(),
        ));
    }
    if tables.accounts.iter().any(|a| a.email == account.email) {
        return Err(AccountError::EmailAlreadyExists(
            account.email.as_str().to_string(),
        ));
    }

    tables.accounts.push(account.clone());
    Ok(account)
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create_with_registration_code(
        &self,
        mut account: Account,
        code: &CodeValue,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountError> {
        let mut tables = self.tables.lock().unwrap();

        let index = tables
            .codes
            .iter()
            .position(|c| c.code == *code)
            .ok_or(RegistrationCodeError::NotFound)?;

        let mut redeemed = tables.codes[index].clone();
        redeemed.ensure_redeemable(now)?;
        redeemed.record_use(now)?;

        account.registration_code_id = Some(redeemed.id);
        let created = insert_account(&mut tables, account)?;
        tables.codes[index] = redeemed;

        Ok(created)
    }

    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        insert_account(&mut self.tables.lock().unwrap(), account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter().find(|a| a.id == *id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.username.as_str() == login || a.email.as_str() == login)
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter().find(|a| a.email == *email).cloned())
    }

    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.pending_reset.as_ref().is_some_and(|r| r.digest == digest))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.tables.lock().unwrap().accounts.clone())
    }

    async fn update(&self, account: Account) -> Result<Account, AccountError> {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| AccountError::NotFound(account.id.to_string()))?;
        *stored = account.clone();
        Ok(account)
    }

    async fn record_login(&self, id: &AccountId, at: DateTime<Utc>) -> Result<(), AccountError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(account) = tables.accounts.iter_mut().find(|a| a.id == *id) {
            account.last_login = Some(at);
        }
        Ok(())
    }

    async fn store_pending_reset(
        &self,
        id: &AccountId,
        reset: &PendingReset,
        at: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(account) = tables.accounts.iter_mut().find(|a| a.id == *id) {
            account.pending_reset = Some(reset.clone());
            account.updated_at = at;
        }
        Ok(())
    }

    async fn complete_reset(
        &self,
        id: &AccountId,
        digest: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AccountError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(account) = tables.accounts.iter_mut().find(|a| {
            a.id == *id
                && a.pending_reset
                    .as_ref()
                    .is_some_and(|r| r.digest == digest && r.expires_at > at)
        }) else {
            return Ok(false);
        };

        account.password_hash = password_hash.to_string();
        account.pending_reset = None;
        account.updated_at = at;
        Ok(true)
    }

    async fn update_password(
        &self,
        id: &AccountId,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let mut tables = self.tables.lock().unwrap();
        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        account.password_hash = password_hash.to_string();
        account.updated_at = at;
        Ok(())
    }
}

#[async_trait]
impl RegistrationCodeRepository for InMemoryStore {
    async fn create(
        &self,
        code: RegistrationCode,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        self.tables.lock().unwrap().codes.push(code.clone());
        Ok(code)
    }

    async fn find_by_id(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<Option<RegistrationCode>, RegistrationCodeError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.codes.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_by_code(
        &self,
        code: &CodeValue,
    ) -> Result<Option<RegistrationCode>, RegistrationCodeError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.codes.iter().find(|c| c.code == *code).cloned())
    }

    async fn list_all(&self) -> Result<Vec<RegistrationCode>, RegistrationCodeError> {
        Ok(self.tables.lock().unwrap().codes.clone())
    }

    async fn update(
        &self,
        code: RegistrationCode,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .codes
            .iter_mut()
            .find(|c| c.id == code.id)
            .ok_or_else(|| RegistrationCodeError::NotFoundById(code.id.to_string()))?;
        *stored = code.clone();
        Ok(code)
    }

    async fn increment_usage(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .codes
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| RegistrationCodeError::NotFoundById(id.to_string()))?;
        stored.record_use(Utc::now())?;
        Ok(stored.clone())
    }

    async fn delete_unused(&self, id: &RegistrationCodeId) -> Result<bool, RegistrationCodeError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.codes.len();
        tables.codes.retain(|c| c.id != *id || c.used_count > 0);
        Ok(tables.codes.len() < before)
    }
}

struct DiscardingPublisher;

#[async_trait]
impl EventPublisher for DiscardingPublisher {
    async fn publish_account_registered(
        &self,
        _event: &AccountRegisteredEvent,
    ) -> Result<(), EventPublisherError> {
        Ok(())
    }

    async fn publish_account_updated(
        &self,
        _event: &AccountUpdatedEvent,
    ) -> Result<(), EventPublisherError> {
        Ok(())
    }

    async fn publish_password_reset_requested(
        &self,
        _event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        Ok(())
    }
}

fn capped_code(max_uses: i32) -> RegistrationCode {
    let now = Utc::now();
    RegistrationCode {
        id: RegistrationCodeId::new(),
        code: CodeValue::new("PROMO".to_string()).unwrap(),
        name: "Promotion".to_string(),
        description: None,
        code_type: CodeType::General,
        max_uses: Some(max_uses),
        used_count: 0,
        is_active: true,
        expires_at: Some(now + Duration::days(1)),
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn account_service(
    store: &Arc<InMemoryStore>,
) -> AccountService<InMemoryStore, RegistrationCodeService<InMemoryStore>, DiscardingPublisher> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let settings = AuthSettings::new(
        b"test-secret-key-for-jwt-signing-at-least-32-bytes".to_vec(),
        Duration::minutes(15),
        Duration::days(7),
        HashingParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
    )
    .unwrap();
    let authenticator = Arc::new(Authenticator::new(&settings, Arc::clone(&clock)).unwrap());

    AccountService::new(
        Arc::clone(store),
        Arc::new(RegistrationCodeService::new(
            Arc::clone(store),
            Arc::clone(&clock),
        )),
        Arc::new(DiscardingPublisher),
        authenticator,
        clock,
    )
}

fn command(index: usize) -> RegisterAccountCommand {
    RegisterAccountCommand {
        username: Username::new(format!("member{index}")).unwrap(),
        email: EmailAddress::new(format!("member{index}@example.com")).unwrap(),
        password: Password::new("Str0ng!pass".to_string()).unwrap(),
        first_name: None,
        last_name: None,
        registration_code: CodeValue::new("PROMO".to_string()).unwrap(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_never_exceed_max_uses() {
    const MAX_USES: usize = 3;
    const OVERFLOW: usize = 5;

    let code = capped_code(MAX_USES as i32);
    let code_id = code.id;
    let store = Arc::new(InMemoryStore::with_code(code));
    let service = Arc::new(account_service(&store));

    let attempts = (0..MAX_USES + OVERFLOW).map(|index| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.register(command(index)).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("registration task panicked"))
        .collect();

    let successes = results.iter().filter(|result| result.is_ok()).count();
    let limit_reached = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(AccountError::RegistrationCode(
                    RegistrationCodeError::LimitReached
                ))
            )
        })
        .count();

    assert_eq!(successes, MAX_USES);
    assert_eq!(limit_reached, OVERFLOW);
    assert_eq!(store.code(&code_id).used_count, MAX_USES as i32);
    assert_eq!(store.account_count(), MAX_USES);
}

#[tokio::test]
async fn test_failed_insert_does_not_consume_a_use() {
    let code = capped_code(2);
    let code_id = code.id;
    let store = Arc::new(InMemoryStore::with_code(code));
    let service = account_service(&store);

    service.register(command(1)).await.unwrap();

    let duplicate = service.register(command(1)).await;
    assert!(matches!(
        duplicate,
        Err(AccountError::UsernameAlreadyExists(_))
    ));
    assert_eq!(store.code(&code_id).used_count, 1);

    service.register(command(2)).await.unwrap();
    assert_eq!(store.code(&code_id).used_count, 2);
}
