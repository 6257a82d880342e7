use serde::{Deserialize, Serialize};

pub mod save_device_token {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub device_token: Option<String>,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub message: String,
    }
}

pub mod get_device_tokens {
    use super::*;

    /// Serialized as a plain JSON array of tokens
    #[derive(Debug, Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct APIResponse {
        pub tokens: Vec<String>,
    }
}
