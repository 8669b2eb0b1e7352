use async_trait::async_trait;

use crate::account::models::AccountId;
use crate::registration_code::errors::RegistrationCodeError;
use crate::registration_code::models::CodeValue;
use crate::registration_code::models::CreateRegistrationCodeCommand;
use crate::registration_code::models::RegistrationCode;
use crate::registration_code::models::RegistrationCodeId;
use crate::registration_code::models::UpdateRegistrationCodeCommand;

/// Port for registration code operations: the redemption gate plus administration.
#[async_trait]
pub trait RegistrationCodeServicePort: Send + Sync + 'static {
    /// Look up a code and check that it can be redeemed now.
    ///
    /// This is a read-only pre-check. It does not reserve a use, so a code that
    /// passes here can still be exhausted by the time registration commits.
    ///
    /// # Errors
    /// * `NotFound` - No such code
    /// * `Inactive` - Code is disabled
    /// * `Expired` - Code expiry has passed
    /// * `LimitReached` - Code has no uses left
    /// * `DatabaseError` - Database operation failed
    async fn validate(&self, code: &CodeValue) -> Result<RegistrationCode, RegistrationCodeError>;

    /// Atomically record one use of a code.
    ///
    /// # Errors
    /// * `NotFoundById` - No code with this ID
    /// * `LimitReached` - Code has no uses left
    /// * `DatabaseError` - Database operation failed
    async fn record_use(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError>;

    /// Create a new registration code.
    ///
    /// # Errors
    /// * `AlreadyExists` - Code value is taken
    /// * `DatabaseError` - Database operation failed
    async fn create_code(
        &self,
        command: CreateRegistrationCodeCommand,
        created_by: AccountId,
    ) -> Result<RegistrationCode, RegistrationCodeError>;

    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_codes(&self) -> Result<Vec<RegistrationCode>, RegistrationCodeError>;

    /// # Errors
    /// * `NotFoundById` - No code with this ID
    /// * `DatabaseError` - Database operation failed
    async fn get_code(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError>;

    /// Edit a registration code.
    ///
    /// # Errors
    /// * `NotFoundById` - No code with this ID
    /// * `MaxUsesBelowUsage` - New limit is lower than recorded usage
    /// * `DatabaseError` - Database operation failed
    async fn update_code(
        &self,
        id: &RegistrationCodeId,
        command: UpdateRegistrationCodeCommand,
    ) -> Result<RegistrationCode, RegistrationCodeError>;

    /// Delete a registration code that has never been used.
    ///
    /// # Errors
    /// * `NotFoundById` - No code with this ID
    /// * `AlreadyUsed` - Code has recorded at least one use
    /// * `DatabaseError` - Database operation failed
    async fn delete_code(&self, id: &RegistrationCodeId) -> Result<(), RegistrationCodeError>;
}

/// Persistence operations for registration codes.
#[async_trait]
pub trait RegistrationCodeRepository: Send + Sync + 'static {
    /// # Errors
    /// * `AlreadyExists` - Code value is taken
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, code: RegistrationCode)
        -> Result<RegistrationCode, RegistrationCodeError>;

    async fn find_by_id(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<Option<RegistrationCode>, RegistrationCodeError>;

    async fn find_by_code(
        &self,
        code: &CodeValue,
    ) -> Result<Option<RegistrationCode>, RegistrationCodeError>;

    async fn list_all(&self) -> Result<Vec<RegistrationCode>, RegistrationCodeError>;

    /// Persist administrative edits. The usage counter is never written here.
    ///
    /// # Errors
    /// * `NotFoundById` - No code with this ID
    /// * `MaxUsesBelowUsage` - Storage rejected a limit below current usage
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, code: RegistrationCode)
        -> Result<RegistrationCode, RegistrationCodeError>;

    /// Increment `used_count` by one only if the limit allows it, in a single
    /// atomic step.
    ///
    /// # Errors
    /// * `NotFoundById` - No code with this ID
    /// * `LimitReached` - The increment would pass `max_uses`
    /// * `DatabaseError` - Database operation failed
    async fn increment_usage(
        &self,
        id: &RegistrationCodeId,
    ) -> Result<RegistrationCode, RegistrationCodeError>;

    /// Delete a code only while it has no recorded uses.
    ///
    /// # Returns
    /// Whether a row was deleted
    async fn delete_unused(&self, id: &RegistrationCodeId) -> Result<bool, RegistrationCodeError>;
}
