use tonic::Status;

use super::status_from;
use crate::account::ports::AccountServicePort;
use crate::proto::VerifyTokenRequest;
use crate::proto::VerifyTokenResponse;

/// Resolve an access token to the caller's identity, with the same checks as
/// the HTTP `protect` middleware.
pub async fn verify_token(
    service: &dyn AccountServicePort,
    request: VerifyTokenRequest,
) -> Result<VerifyTokenResponse, Status> {
    let account = service
        .authenticate(&request.token)
        .await
        .map_err(status_from)?;

    Ok(VerifyTokenResponse {
        identity: Some(account.identity().into()),
    })
}
