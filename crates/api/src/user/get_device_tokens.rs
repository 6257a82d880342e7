use crate::error::CampusError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use campus_api_structs::get_device_tokens::*;
use campus_infra::CampusContext;

pub async fn get_device_tokens_controller(
    ctx: web::Data<CampusContext>,
) -> Result<HttpResponse, CampusError> {
    execute(GetDeviceTokensUseCase, &ctx)
        .await
        .map(|tokens| HttpResponse::Ok().json(APIResponse { tokens }))
        .map_err(CampusError::from)
}

#[derive(Debug)]
pub struct GetDeviceTokensUseCase;

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for CampusError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetDeviceTokensUseCase {
    type Response = Vec<String>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetDeviceTokens";

    async fn execute(&mut self, ctx: &CampusContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .users
            .find_device_tokens()
            .await
            .map_err(|_| UseCaseError::StorageError)
    }
}
