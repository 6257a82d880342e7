use crate::error::CampusError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use campus_api_structs::save_device_token::*;
use campus_domain::User;
use campus_infra::CampusContext;

pub async fn save_device_token_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CampusContext>,
) -> Result<HttpResponse, CampusError> {
    let body = body.0;
    let usecase = match (body.email, body.device_token) {
        (Some(email), Some(device_token)) if !device_token.trim().is_empty() => {
            SaveDeviceTokenUseCase {
                email,
                device_token,
            }
        }
        _ => return Err(CampusError::BadClientData("Missing required fields".into())),
    };

    execute(usecase, &ctx)
        .await
        .map(|_| {
            HttpResponse::Ok().json(APIResponse {
                message: "Device token saved".into(),
            })
        })
        .map_err(CampusError::from)
}

/// Registers the device that push notifications for a `User` go to
#[derive(Debug)]
pub struct SaveDeviceTokenUseCase {
    pub email: String,
    pub device_token: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    UserNotFound(String),
    StorageError,
}

impl From<UseCaseError> for CampusError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::UserNotFound(email) => {
                Self::NotFound(format!("The user with email: {}, was not found.", email))
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SaveDeviceTokenUseCase {
    type Response = User;

    type Error = UseCaseError;

    const NAME: &'static str = "SaveDeviceToken";

    async fn execute(&mut self, ctx: &CampusContext) -> Result<Self::Response, Self::Error> {
        let mut user = ctx
            .repos
            .users
            .find_by_email(&self.email)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or_else(|| UseCaseError::UserNotFound(self.email.clone()))?;

        user.device_token = Some(self.device_token.clone());
        ctx.repos
            .users
            .save(&user)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(user)
    }
}
