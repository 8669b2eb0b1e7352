use async_trait::async_trait;
use auth::PendingReset;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgExecutor;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::PersonName;
use crate::account::models::Role;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;
use crate::outbound::repositories::registration_code::RegistrationCodeRow;
use crate::outbound::repositories::registration_code::REGISTRATION_CODE_COLUMNS;
use crate::registration_code::errors::RegistrationCodeError;
use crate::registration_code::models::CodeValue;
use crate::registration_code::models::RegistrationCode;
use crate::registration_code::models::RegistrationCodeId;

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     role, is_active, last_login, reset_token_digest, reset_token_expires_at, \
     registration_code_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    reset_token_digest: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    registration_code_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        let pending_reset = match (r.reset_token_digest, r.reset_token_expires_at) {
            (Some(digest), Some(expires_at)) => Some(PendingReset { digest, expires_at }),
            _ => None,
        };

        Ok(Account {
            id: AccountId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            first_name: r.first_name.map(PersonName::new).transpose()?,
            last_name: r.last_name.map(PersonName::new).transpose()?,
            role: r.role.parse::<Role>()?,
            is_active: r.is_active,
            last_login: r.last_login,
            pending_reset,
            registration_code_id: r.registration_code_id.map(RegistrationCodeId),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> AccountError {
    AccountError::DatabaseError(e.to_string())
}

async fn insert_account<'e, E>(executor: E, account: &Account) -> Result<(), AccountError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO accounts
            (id, username, email, password_hash, first_name, last_name, role, is_active,
             registration_code_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(account.id.0)
    .bind(account.username.as_str())
    .bind(account.email.as_str())
    .bind(&account.password_hash)
    .bind(account.first_name.as_ref().map(|name| name.as_str()))
    .bind(account.last_name.as_ref().map(|name| name.as_str()))
    .bind(account.role.as_str())
    .bind(account.is_active)
    .bind(account.registration_code_id.map(|id| id.0))
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(executor)
    .await
    .map_err(|e| identity_conflict(e, account))?;

    Ok(())
}

/// Map a unique violation on username or email to its domain error.
fn identity_conflict(e: sqlx::Error, account: &Account) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("accounts_username_key") {
                return AccountError::UsernameAlreadyExists(account.username.as_str().to_string());
            }
            if db_err.constraint() == Some("accounts_email_key") {
                return AccountError::EmailAlreadyExists(account.email.as_str().to_string());
            }
        }
    }
    database_error(e)
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, predicate: &str, value: &str) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE {}",
            ACCOUNT_COLUMNS, predicate
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Account::try_from).transpose()
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_with_registration_code(
        &self,
        account: Account,
        code: &CodeValue,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        // Concurrent registrations on the same code serialize on this row lock
        let row = sqlx::query_as::<_, RegistrationCodeRow>(&format!(
            "SELECT {} FROM registration_codes WHERE code = $1 FOR UPDATE",
            REGISTRATION_CODE_COLUMNS
        ))
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(database_error)?;

        let registration_code = match row {
            Some(row) => RegistrationCode::try_from(row)?,
            None => return Err(RegistrationCodeError::NotFound.into()),
        };
        registration_code.ensure_redeemable(now)?;

        let account = Account {
            registration_code_id: Some(registration_code.id),
            ..account
        };
        insert_account(&mut *tx, &account).await?;

        let incremented = sqlx::query(
            r#"
            UPDATE registration_codes
            SET used_count = used_count + 1, updated_at = $2
            WHERE id = $1 AND (max_uses IS NULL OR used_count < max_uses)
            "#,
        )
        .bind(registration_code.id.0)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        if incremented.rows_affected() == 0 {
            // Dropping the transaction rolls back the insert
            return Err(RegistrationCodeError::LimitReached.into());
        }

        tx.commit().await.map_err(database_error)?;

        Ok(account)
    }

    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        insert_account(&self.pool, &account).await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, AccountError> {
        self.find_one("username = $1 OR email = $1", login).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError> {
        self.find_one("email = $1", email.as_str()).await
    }

    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Account>, AccountError> {
        self.find_one("reset_token_digest = $1", digest).await
    }

    async fn list_all(&self) -> Result<Vec<Account>, AccountError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn update(&self, account: Account) -> Result<Account, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET username = $2, email = $3, first_name = $4, last_name = $5,
                role = $6, is_active = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(account.first_name.as_ref().map(|name| name.as_str()))
        .bind(account.last_name.as_ref().map(|name| name.as_str()))
        .bind(account.role.as_str())
        .bind(account.is_active)
        .bind(account.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| identity_conflict(e, &account))?;

        match row {
            Some(row) => Account::try_from(row),
            None => Err(AccountError::NotFound(account.id.to_string())),
        }
    }

    async fn record_login(&self, id: &AccountId, at: DateTime<Utc>) -> Result<(), AccountError> {
        sqlx::query("UPDATE accounts SET last_login = $2 WHERE id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(())
    }

    async fn store_pending_reset(
        &self,
        id: &AccountId,
        reset: &PendingReset,
        at: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET reset_token_digest = $2, reset_token_expires_at = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&reset.digest)
        .bind(reset.expires_at)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
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
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $3,
                reset_token_digest = NULL,
                reset_token_expires_at = NULL,
                updated_at = $4
            WHERE id = $1 AND reset_token_digest = $2 AND reset_token_expires_at > $4
            "#,
        )
        .bind(id.0)
        .bind(digest)
        .bind(password_hash)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(
        &self,
        id: &AccountId,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
