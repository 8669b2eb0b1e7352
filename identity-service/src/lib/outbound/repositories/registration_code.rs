use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::models::AccountId;
use crate::registration_code::errors::RegistrationCodeError;
use crate::registration_code::models::CodeType;
use crate::registration_code::models::CodeValue;
use crate::registration_code::models::RegistrationCode;
use crate::registration_code::models::RegistrationCodeId;
use crate::registration_code::ports::RegistrationCodeRepository;

pub(crate) const REGISTRATION_CODE_COLUMNS: &str = "id, code, name, description, code_type, \
     max_uses, used_count, is_active, expires_at, created_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RegistrationCodeRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    code_type: String,
    max_uses: Option<i32>,
    used_count: i32,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationCodeRow> for RegistrationCode {
    type Error = RegistrationCodeError;

    fn try_from(r: RegistrationCodeRow) -> Result<Self, Self::Error> {
        Ok(RegistrationCode {
            id: RegistrationCodeId(r.id),
            code: CodeValue::new(r.code)?,
            name: r.name,
            description: r.description,
            code_type: r.code_type.parse::<CodeType>()?,
            max_uses: r.max_uses,
            used_count: r.used_count,
            is_active: r.is_active,
            expires_at: r.expires_at,
            created_by: r.created_by.map(AccountId),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

pub struct PostgresRegistrationCodeRepository {
    pool: PgPool,
}

impl PostgresRegistrationCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationCodeRepository for PostgresRegistrationCodeRepository {
    async fn create(
        &self,
        code: RegistrationCode,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        sqlx::query(
            r#"
            INSERT INTO registration_codes
                (id, code, name, description, code_type, max_uses, used_count,
                 is_active, expires_at, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(code.id.0)
        .bind(code.code.as_str())
        .bind(&code.name)
        .bind(&code.description)
        .bind(code.code_type.as_str())
        .bind(code.max_uses)
        .bind(code.used_count)
        .bind(code.is_active)
        .bind(code.expires_at)
        .bind(code.created_by.map(|id| id.0))
        .bind(code.created_at)
        .bind(code.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("registration_codes_code_key")
                {
                    return RegistrationCodeError::AlreadyExists(code.code.as_str().to_string());
                }
            }
            RegistrationCodeError::DatabaseError(e.to_string())
        })?;

        Ok(code)
    }

    async fn find_by_id(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<Option<RegistrationCode>, RegistrationCodeError> {
        let row = sqlx::query_as::<_, RegistrationCodeRow>(&format!(
            "SELECT {} FROM registration_codes WHERE id = $1",
            REGISTRATION_CODE_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RegistrationCodeError::DatabaseError(e.to_string()))?;

        row.map(RegistrationCode::try_from).transpose()
    }

    async fn find_by_code(
        &self,
        code: &CodeValue,
    ) -> Result<Option<RegistrationCode>, RegistrationCodeError> {
        let row = sqlx::query_as::<_, RegistrationCodeRow>(&format!(
            "SELECT {} FROM registration_codes WHERE code = $1",
            REGISTRATION_CODE_COLUMNS
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RegistrationCodeError::DatabaseError(e.to_string()))?;

        row.map(RegistrationCode::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<RegistrationCode>, RegistrationCodeError> {
        let rows = sqlx::query_as::<_, RegistrationCodeRow>(&format!(
            "SELECT {} FROM registration_codes ORDER BY created_at DESC",
            REGISTRATION_CODE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RegistrationCodeError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(RegistrationCode::try_from).collect()
    }

    async fn update(
        &self,
        code: RegistrationCode,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let row = sqlx::query_as::<_, RegistrationCodeRow>(&format!(
            r#"
            UPDATE registration_codes
            SET name = $2, description = $3, code_type = $4, max_uses = $5,
                is_active = $6, expires_at = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            REGISTRATION_CODE_COLUMNS
        ))
        .bind(code.id.0)
        .bind(&code.name)
        .bind(&code.description)
        .bind(code.code_type.as_str())
        .bind(code.max_uses)
        .bind(code.is_active)
        .bind(code.expires_at)
        .bind(code.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            // A registration committed between our read and this write
            if let Some(db_err) = e.as_database_error() {
                if db_err.constraint() == Some("registration_codes_usage_check") {
                    return RegistrationCodeError::MaxUsesBelowUsage {
                        max_uses: code.max_uses.unwrap_or_default(),
                        used_count: code.used_count,
                    };
                }
            }
            RegistrationCodeError::DatabaseError(e.to_string())
        })?;

        match row {
            Some(row) => RegistrationCode::try_from(row),
            None => Err(RegistrationCodeError::NotFoundById(code.id.to_string())),
        }
    }

    async fn increment_usage(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let row = sqlx::query_as::<_, RegistrationCodeRow>(&format!(
            r#"
            UPDATE registration_codes
            SET used_count = used_count + 1, updated_at = NOW()
            WHERE id = $1 AND (max_uses IS NULL OR used_count < max_uses)
            RETURNING {}
            "#,
            REGISTRATION_CODE_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RegistrationCodeError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => RegistrationCode::try_from(row),
            None => match self.find_by_id(id).await? {
                Some(_) => Err(RegistrationCodeError::LimitReached),
                None => Err(RegistrationCodeError::NotFoundById(id.to_string())),
            },
        }
    }

    async fn delete_unused(&self, id: &RegistrationCodeId) -> Result<bool, RegistrationCodeError> {
        let result = sqlx::query(
            r#"
            DELETE FROM registration_codes
            WHERE id = $1 AND used_count = 0
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Accounts still reference the code
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return RegistrationCodeError::AlreadyUsed;
                }
            }
            RegistrationCodeError::DatabaseError(e.to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }
}
