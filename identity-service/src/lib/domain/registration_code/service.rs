use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;

use crate::account::models::AccountId;
use crate::registration_code::errors::RegistrationCodeError;
use crate::registration_code::models::CodeValue;
use crate::registration_code::models::CreateRegistrationCodeCommand;
use crate::registration_code::models::RegistrationCode;
use crate::registration_code::models::RegistrationCodeId;
use crate::registration_code::models::UpdateRegistrationCodeCommand;
use crate::registration_code::ports::RegistrationCodeRepository;
use crate::registration_code::ports::RegistrationCodeServicePort;

/// Domain service for the registration code gate and its administration.
pub struct RegistrationCodeService<CR>
where
    CR: RegistrationCodeRepository,
{
    repository: Arc<CR>,
    clock: Arc<dyn Clock>,
}

impl<CR> RegistrationCodeService<CR>
where
    CR: RegistrationCodeRepository,
{
    pub fn new(repository: Arc<CR>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    async fn find_existing(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(RegistrationCodeError::NotFoundById(id.to_string()))
    }
}

#[async_trait]
impl<CR> RegistrationCodeServicePort for RegistrationCodeService<CR>
where
    CR: RegistrationCodeRepository,
{
    async fn validate(&self, code: &CodeValue) -> Result<RegistrationCode, RegistrationCodeError> {
        let registration_code = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or(RegistrationCodeError::NotFound)?;

        registration_code.ensure_redeemable(self.clock.now())?;

        Ok(registration_code)
    }

    async fn record_use(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let registration_code = self.repository.increment_usage(id).await?;

        tracing::info!(
            registration_code_id = %registration_code.id,
            used_count = registration_code.used_count,
            max_uses = ?registration_code.max_uses,
            "Registration code use recorded"
        );

        Ok(registration_code)
    }

    async fn create_code(
        &self,
        command: CreateRegistrationCodeCommand,
        created_by: AccountId,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let now = self.clock.now();

        let registration_code = RegistrationCode {
            id: RegistrationCodeId::new(),
            code: command.code,
            name: command.name,
            description: command.description,
            code_type: command.code_type,
            max_uses: command.max_uses,
            used_count: 0,
            is_active: command.is_active,
            expires_at: command.expires_at,
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(registration_code).await?;

        tracing::info!(
            registration_code_id = %created.id,
            code_type = %created.code_type,
            created_by = %created_by,
            "Registration code created"
        );

        Ok(created)
    }

    async fn list_codes(&self) -> Result<Vec<RegistrationCode>, RegistrationCodeError> {
        self.repository.list_all().await
    }

    async fn get_code(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        self.find_existing(id).await
    }

    async fn update_code(
        &self,
        id: &RegistrationCodeId,
        command: UpdateRegistrationCodeCommand,
    ) -> Result<RegistrationCode, RegistrationCodeError> {
        let mut registration_code = self.find_existing(id).await?;

        registration_code.apply(command, self.clock.now())?;

        self.repository.update(registration_code).await
    }

    async fn delete_code(&self, id: &RegistrationCodeId) -> Result<(), RegistrationCodeError> {
        let registration_code = self.find_existing(id).await?;

        if registration_code.used_count > 0 {
            return Err(RegistrationCodeError::AlreadyUsed);
        }

        // A registration may have committed since the read above
        if !self.repository.delete_unused(id).await? {
            return Err(RegistrationCodeError::AlreadyUsed);
        }

        tracing::info!(registration_code_id = %id, "Registration code deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::ManualClock;
    use chrono::DateTime;
    use chrono::Duration;
    use chrono::TimeZone;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::registration_code::models::CodeType;

    mock! {
        pub TestRegistrationCodeRepository {}

        #[async_trait]
        impl RegistrationCodeRepository for TestRegistrationCodeRepository {
            async fn create(&self, code: RegistrationCode) -> Result<RegistrationCode, RegistrationCodeError>;
            async fn find_by_id(&self, id: &RegistrationCodeId) -> Result<Option<RegistrationCode>, RegistrationCodeError>;
            async fn find_by_code(&self, code: &CodeValue) -> Result<Option<RegistrationCode>, RegistrationCodeError>;
            async fn list_all(&self) -> Result<Vec<RegistrationCode>, RegistrationCodeError>;
            async fn update(&self, code: RegistrationCode) -> Result<RegistrationCode, RegistrationCodeError>;
            async fn increment_usage(&self, id: &RegistrationCodeId) -> Result<RegistrationCode, RegistrationCodeError>;
            async fn delete_unused(&self, id: &RegistrationCodeId) -> Result<bool, RegistrationCodeError>;
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn service(
        repository: MockTestRegistrationCodeRepository,
    ) -> RegistrationCodeService<MockTestRegistrationCodeRepository> {
        RegistrationCodeService::new(Arc::new(repository), Arc::new(ManualClock::new(now())))
    }

    fn promo(max_uses: Option<i32>, used_count: i32) -> RegistrationCode {
        RegistrationCode {
            id: RegistrationCodeId::new(),
            code: CodeValue::new("PROMO".to_string()).unwrap(),
            name: "Promotion".to_string(),
            description: None,
            code_type: CodeType::General,
            max_uses,
            used_count,
            is_active: true,
            expires_at: None,
            created_by: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn test_validate_success() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let code = promo(Some(1), 0);
        let returned = code.clone();

        repository
            .expect_find_by_code()
            .withf(|value| value.as_str() == "PROMO")
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let result = service(repository)
            .validate(&CodeValue::new("PROMO".to_string()).unwrap())
            .await;

        assert_eq!(result, Ok(code));
    }

    #[tokio::test]
    async fn test_validate_unknown_code() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        repository
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));

        let result = service(repository)
            .validate(&CodeValue::new("NOPE".to_string()).unwrap())
            .await;

        assert_eq!(result, Err(RegistrationCodeError::NotFound));
    }

    #[tokio::test]
    async fn test_validate_expired_code() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let mut code = promo(None, 0);
        code.expires_at = Some(now() - Duration::minutes(1));

        repository
            .expect_find_by_code()
            .times(1)
            .returning(move |_| Ok(Some(code.clone())));

        let result = service(repository)
            .validate(&CodeValue::new("PROMO".to_string()).unwrap())
            .await;

        assert_eq!(result, Err(RegistrationCodeError::Expired));
    }

    #[tokio::test]
    async fn test_validate_exhausted_code() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        repository
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(Some(promo(Some(1), 1))));

        let result = service(repository)
            .validate(&CodeValue::new("PROMO".to_string()).unwrap())
            .await;

        assert_eq!(result, Err(RegistrationCodeError::LimitReached));
    }

    #[tokio::test]
    async fn test_record_use_delegates_to_atomic_increment() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let code = promo(Some(1), 0);
        let id = code.id;

        repository.expect_find_by_id().times(0);
        repository
            .expect_increment_usage()
            .withf(move |candidate| *candidate == id)
            .times(1)
            .returning(move |_| {
                let mut used = code.clone();
                used.used_count += 1;
                Ok(used)
            });

        let result = service(repository).record_use(&id).await.unwrap();
        assert_eq!(result.used_count, 1);
    }

    #[tokio::test]
    async fn test_create_code_starts_unused() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let admin = AccountId::new();

        repository
            .expect_create()
            .withf(move |code| {
                code.used_count == 0
                    && code.created_by == Some(admin)
                    && code.created_at == now()
                    && code.code.as_str() == "TEAM-A"
            })
            .times(1)
            .returning(Ok);

        let command = CreateRegistrationCodeCommand::new(
            CodeValue::new("TEAM-A".to_string()).unwrap(),
            "Team A".to_string(),
            None,
            CodeType::Department,
            Some(10),
            true,
            None,
        )
        .unwrap();

        let created = service(repository).create_code(command, admin).await.unwrap();
        assert_eq!(created.max_uses, Some(10));
    }

    #[tokio::test]
    async fn test_update_code_below_usage_is_rejected() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let code = promo(Some(10), 4);
        let id = code.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(code.clone())));
        repository.expect_update().times(0);

        let command = UpdateRegistrationCodeCommand {
            max_uses: Some(Some(3)),
            ..Default::default()
        };

        let result = service(repository).update_code(&id, command).await;
        assert_eq!(
            result,
            Err(RegistrationCodeError::MaxUsesBelowUsage {
                max_uses: 3,
                used_count: 4
            })
        );
    }

    #[tokio::test]
    async fn test_delete_used_code_is_rejected() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let code = promo(None, 1);
        let id = code.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(code.clone())));
        repository.expect_delete_unused().times(0);

        let result = service(repository).delete_code(&id).await;
        assert_eq!(result, Err(RegistrationCodeError::AlreadyUsed));
    }

    #[tokio::test]
    async fn test_delete_loses_race_with_registration() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        let code = promo(None, 0);
        let id = code.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(code.clone())));
        repository
            .expect_delete_unused()
            .times(1)
            .returning(|_| Ok(false));

        let result = service(repository).delete_code(&id).await;
        assert_eq!(result, Err(RegistrationCodeError::AlreadyUsed));
    }

    #[tokio::test]
    async fn test_get_missing_code() {
        let mut repository = MockTestRegistrationCodeRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let id = RegistrationCodeId::new();
        let result = service(repository).get_code(&id).await;

        assert_eq!(result, Err(RegistrationCodeError::NotFoundById(id.to_string())));
    }
}
