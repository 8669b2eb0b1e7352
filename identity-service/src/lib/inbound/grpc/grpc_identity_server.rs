use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;

use super::handlers::get_account;
use super::handlers::verify_token;
use crate::account::ports::AccountServicePort;
use crate::proto::identity_service_server::IdentityService as IdentityServiceProto;
use crate::proto::GetAccountRequest;
use crate::proto::GetAccountResponse;
use crate::proto::VerifyTokenRequest;
use crate::proto::VerifyTokenResponse;

pub struct IdentityGrpcService {
    service: Arc<dyn AccountServicePort>,
}

impl IdentityGrpcService {
    pub fn new(service: Arc<dyn AccountServicePort>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl IdentityServiceProto for IdentityGrpcService {
    async fn verify_token(
        &self,
        request: Request<VerifyTokenRequest>,
    ) -> Result<Response<VerifyTokenResponse>, Status> {
        let response =
            verify_token::verify_token(self.service.as_ref(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn get_account(
        &self,
        request: Request<GetAccountRequest>,
    ) -> Result<Response<GetAccountResponse>, Status> {
        let response =
            get_account::get_account(self.service.as_ref(), request.into_inner()).await?;
        Ok(Response::new(response))
    }
}
