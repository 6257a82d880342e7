use super::{INotificationSender, NotificationError};
use campus_domain::NotificationPayload;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

// https://firebase.google.com/docs/cloud-messaging/send-message#rest
// https://developers.google.com/identity/protocols/oauth2/service-account#httprest

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The subset of a Google service account key file that is needed to
/// authenticate against FCM
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccount {
    project_id: String,
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ServiceAccount {
    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    // Access token expires in specified in seconds
    expires_in: i64,
}

struct AccessToken {
    token: String,
    expires_ts: i64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: Message<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: &'a NotificationPayload,
}

/// Sends push notifications through the Firebase Cloud Messaging HTTP v1 API
pub struct FcmNotificationSender {
    account: ServiceAccount,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    timeout_millis: u64,
    access_token: Mutex<Option<AccessToken>>,
}

impl FcmNotificationSender {
    /// `service_account_json` is the content of the service account key file
    pub fn new(service_account_json: &str, timeout_millis: u64) -> anyhow::Result<Self> {
        let mut account: ServiceAccount = serde_json::from_str(service_account_json)?;
        // Keys passed through env variables usually have escaped newlines
        account.private_key = account.private_key.replace("\\n", "\n");
        let encoding_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_millis))
            .build()?;

        Ok(Self {
            account,
            encoding_key,
            client,
            timeout_millis,
            access_token: Mutex::new(None),
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> NotificationError {
        if e.is_timeout() {
            NotificationError::Timeout(self.timeout_millis)
        } else {
            NotificationError::Transport(e.to_string())
        }
    }

    async fn get_access_token(&self) -> Result<String, NotificationError> {
        let mut cached = self.access_token.lock().await;

        let now = Utc::now().timestamp_millis();
        let one_minute_in_millis = 1000 * 60;
        if let Some(token) = cached.as_ref() {
            if now + one_minute_in_millis <= token.expires_ts {
                // Current access token is still valid for at least one minute so return it
                return Ok(token.token.clone());
            }
        }

        let iat = now / 1000;
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: FCM_SCOPE,
            aud: self.account.token_uri(),
            iat,
            exp: iat + 60 * 60,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| NotificationError::Provider(format!("Unable to sign assertion: {}", e)))?;

        let params = [
            ("grant_type", JWT_BEARER_GRANT_TYPE),
            ("assertion", assertion.as_str()),
        ];
        let res = self
            .client
            .post(self.account.token_uri())
            .form(&params)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("Unable to get FCM access token. Status: {}, {}", status, body);
            return Err(NotificationError::Provider(format!(
                "Access token request failed with status {}",
                status
            )));
        }
        let tokens = res
            .json::<AccessTokenResponse>()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let access_token = tokens.access_token.clone();
        *cached = Some(AccessToken {
            token: tokens.access_token,
            expires_ts: Utc::now().timestamp_millis() + tokens.expires_in * 1000,
        });

        Ok(access_token)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

/// FCM answers with an `UNREGISTERED` error code for tokens of uninstalled
/// apps. A plain 404 can also mean a wrong project, which says nothing about
/// the token.
fn is_unregistered_token(body: &str) -> bool {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(res) => res
            .error
            .details
            .iter()
            .any(|detail| detail.error_code.as_deref() == Some("UNREGISTERED")),
        Err(_) => false,
    }
}

#[async_trait::async_trait]
impl INotificationSender for FcmNotificationSender {
    async fn send(
        &self,
        device_token: &str,
        payload: &NotificationPayload,
    ) -> Result<(), NotificationError> {
        let access_token = self.get_access_token().await?;
        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.account.project_id
        );
        let body = SendMessageRequest {
            message: Message {
                token: device_token,
                notification: payload,
            },
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        if is_unregistered_token(&body) {
            Err(NotificationError::InvalidToken)
        } else {
            Err(NotificationError::Provider(format!("{}: {}", status, body)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_unregistered_tokens() {
        assert!(is_unregistered_token(
            r#"{"error":{"code":404,"status":"NOT_FOUND","details":[{"@type":"type.googleapis.com/google.firebase.fcm.v1.FcmError","errorCode":"UNREGISTERED"}]}}"#
        ));
        assert!(!is_unregistered_token("oops"));
    }

    #[test]
    fn not_found_without_unregistered_code_keeps_token() {
        assert!(!is_unregistered_token(""));
        // Wrong project id
        assert!(!is_unregistered_token(
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#
        ));
        assert!(!is_unregistered_token(
            r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","details":[{"errorCode":"INVALID_ARGUMENT"}]}}"#
        ));
        // The code only counts inside the error details
        assert!(!is_unregistered_token(
            r#"{"error":{"code":404,"message":"UNREGISTERED project","status":"NOT_FOUND"}}"#
        ));
    }

    #[test]
    fn rejects_malformed_service_account() {
        assert!(FcmNotificationSender::new("{}", 1000).is_err());
        let no_key = r#"{"project_id":"p","client_email":"e","private_key":"nope"}"#;
        assert!(FcmNotificationSender::new(no_key, 1000).is_err());
    }
}
