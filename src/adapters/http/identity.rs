//! REST identity adapter. Email/password sign-in against the identity
//! provider, returning a uid and a bearer token for backend calls.
//!
//! The provider's own error message (e.g. "INVALID_PASSWORD") is surfaced
//! verbatim so the session gate can show it and stay on the form.

use crate::domain::{DomainError, Identity};
use crate::ports::AuthPort;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub struct RestIdentityAdapter {
    client: reqwest::Client,
    sign_in_url: String,
    api_key: String,
}

impl RestIdentityAdapter {
    /// # Arguments
    /// * `sign_in_url` - password sign-in endpoint of the identity provider
    /// * `api_key` - project API key appended as the `key` query parameter
    pub fn new(sign_in_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            sign_in_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

#[async_trait::async_trait]
impl AuthPort for RestIdentityAdapter {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        let response = self
            .client
            .post(&self.sign_in_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| DomainError::Auth(format!("sign-in request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("sign-in rejected ({status})"));
            warn!(status = %status, message = %message, "identity provider rejected sign-in");
            return Err(DomainError::Auth(message));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Auth(format!("malformed sign-in response: {e}")))?;

        info!(uid = %body.local_id, "identity verified");

        Ok(Identity {
            uid: body.local_id,
            email: if body.email.is_empty() {
                email.to_string()
            } else {
                body.email
            },
            token: body.id_token,
        })
    }
}
