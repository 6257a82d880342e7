use crate::{APIResponse, BaseClient};
use campus_api_structs::{get_device_tokens, save_device_token};
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserClient {
    base: Arc<BaseClient>,
}

impl UserClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn save_device_token(
        &self,
        email: String,
        device_token: String,
    ) -> APIResponse<save_device_token::APIResponse> {
        let body = save_device_token::RequestBody {
            email: Some(email),
            device_token: Some(device_token),
        };

        self.base
            .post(body, "users/device-token".into(), StatusCode::OK)
            .await
    }

    pub async fn get_device_tokens(&self) -> APIResponse<get_device_tokens::APIResponse> {
        self.base
            .get("users/device-tokens".into(), StatusCode::OK)
            .await
    }
}
