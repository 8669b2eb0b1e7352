use tonic::Status;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::Identity;
use crate::registration_code::errors::RegistrationCodeError;

pub mod get_account;
pub mod verify_token;

impl From<Identity> for crate::proto::Identity {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username.as_str().to_string(),
            email: identity.email.as_str().to_string(),
            role: identity.role.as_str().to_string(),
        }
    }
}

impl From<Account> for crate::proto::Account {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            first_name: account
                .first_name
                .map(|name| name.as_str().to_string())
                .unwrap_or_default(),
            last_name: account
                .last_name
                .map(|name| name.as_str().to_string())
                .unwrap_or_default(),
            role: account.role.as_str().to_string(),
            is_active: account.is_active,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Map account errors onto gRPC status codes. Backend detail is logged, not returned.
pub(crate) fn status_from(err: AccountError) -> Status {
    match err {
        AccountError::Unauthenticated
        | AccountError::AccountNoLongerExists
        | AccountError::AccountInactive
        | AccountError::InvalidCredentials
        | AccountError::InvalidRefreshToken
        | AccountError::RefreshSubjectUnavailable => Status::unauthenticated(err.to_string()),
        AccountError::Forbidden { .. } => Status::permission_denied(err.to_string()),
        AccountError::NotFound(_) => Status::not_found(err.to_string()),
        AccountError::UsernameAlreadyExists(_) | AccountError::EmailAlreadyExists(_) => {
            Status::already_exists(err.to_string())
        }
        AccountError::InvalidAccountId(_)
        | AccountError::InvalidUsername(_)
        | AccountError::InvalidEmail(_)
        | AccountError::InvalidName(_)
        | AccountError::InvalidPassword(_)
        | AccountError::InvalidRole(_)
        | AccountError::ResetTokenInvalidOrExpired
        | AccountError::IncorrectCurrentPassword => Status::invalid_argument(err.to_string()),
        AccountError::RegistrationCode(inner) => code_status_from(inner),
        AccountError::PasswordHashing(_)
        | AccountError::TokenIssuance(_)
        | AccountError::DatabaseError(_)
        | AccountError::Unknown(_) => {
            tracing::error!(error = %err, "Unhandled backend error");
            Status::internal("Internal server error")
        }
    }
}

fn code_status_from(err: RegistrationCodeError) -> Status {
    match err {
        RegistrationCodeError::InvalidId(_)
        | RegistrationCodeError::InvalidCode(_)
        | RegistrationCodeError::InvalidType(_)
        | RegistrationCodeError::InvalidName(_)
        | RegistrationCodeError::InvalidMaxUses(_) => Status::invalid_argument(err.to_string()),
        RegistrationCodeError::NotFound
        | RegistrationCodeError::Inactive
        | RegistrationCodeError::Expired
        | RegistrationCodeError::LimitReached
        | RegistrationCodeError::AlreadyUsed
        | RegistrationCodeError::MaxUsesBelowUsage { .. } => {
            Status::failed_precondition(err.to_string())
        }
        RegistrationCodeError::NotFoundById(_) => Status::not_found(err.to_string()),
        RegistrationCodeError::AlreadyExists(_) => Status::already_exists(err.to_string()),
        RegistrationCodeError::DatabaseError(_) | RegistrationCodeError::Unknown(_) => {
            tracing::error!(error = %err, "Unhandled backend error");
            Status::internal("Internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use tonic::Code;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_from(AccountError::AccountInactive).code(),
            Code::Unauthenticated
        );
        assert_eq!(
            status_from(AccountError::NotFound("missing".to_string())).code(),
            Code::NotFound
        );

        let internal = status_from(AccountError::DatabaseError("connection reset".to_string()));
        assert_eq!(internal.code(), Code::Internal);
        assert_eq!(internal.message(), "Internal server error");
    }

    #[test]
    fn test_registration_code_failures_keep_their_meaning() {
        let limit = status_from(AccountError::RegistrationCode(RegistrationCodeError::LimitReached));
        assert_eq!(limit.code(), Code::FailedPrecondition);
        assert_eq!(limit.message(), "Registration code has reached its usage limit");

        assert_eq!(
            status_from(AccountError::ResetTokenInvalidOrExpired).code(),
            Code::InvalidArgument
        );

        let backend = status_from(AccountError::RegistrationCode(
            RegistrationCodeError::DatabaseError("lock timeout".to_string()),
        ));
        assert_eq!(backend.code(), Code::Internal);
        assert_eq!(backend.message(), "Internal server error");
    }
}
