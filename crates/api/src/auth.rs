//! Hosted auth-service (Clerk) development API
//!
//! Used by sign-up scenarios to obtain a dev-browser token and to create and
//! verify an email address without a real inbox. Only status codes and the
//! `token`/`id` response fields are relied on.

use reqwest::Client;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

use crate::client::RawResponse;
use crate::error::{ApiError, ApiResult};

pub const SECRET_KEY_ENV: &str = "CLERK_SECRET_KEY";
pub const PUBLISHABLE_KEY_ENV: &str = "CLERK_PUBLISHABLE_KEY";

const DEV_SESSION_PARAM: &str = "_clerk_dev_session";

/// `https://<segment>.clerk.accounts.dev`, where `<segment>` is the second
/// `_`-separated part of the publishable key
pub fn frontend_api_from_publishable_key(publishable_key: &str) -> ApiResult<String> {
    match publishable_key.split('_').nth(1) {
        Some(segment) if !segment.is_empty() => {
            Ok(format!("https://{}.clerk.accounts.dev", segment))
        }
        _ => Err(ApiError::AuthConfig(format!(
            "cannot derive frontend API from publishable key '{}'",
            publishable_key
        ))),
    }
}

#[derive(Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub publishable_key: String,
    pub frontend_api: String,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret_key", &"<redacted>")
            .field("publishable_key", &self.publishable_key)
            .field("frontend_api", &self.frontend_api)
            .finish()
    }
}

impl AuthSettings {
    pub fn new(secret_key: impl Into<String>, publishable_key: impl Into<String>) -> ApiResult<Self> {
        let secret_key = secret_key.into();
        let publishable_key = publishable_key.into();
        if secret_key.is_empty() || publishable_key.is_empty() {
            return Err(ApiError::AuthConfig(
                "auth service API keys are not set".to_string(),
            ));
        }
        let frontend_api = frontend_api_from_publishable_key(&publishable_key)?;
        Ok(Self { secret_key, publishable_key, frontend_api })
    }

    /// Read both keys from the environment
    pub fn from_env() -> ApiResult<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .map_err(|_| ApiError::AuthConfig(format!("{} is not set", name)))
        };
        Self::new(read(SECRET_KEY_ENV)?, read(PUBLISHABLE_KEY_ENV)?)
    }

    /// Point at a different frontend API (staging instance, test server)
    pub fn with_frontend_api(mut self, url: impl Into<String>) -> Self {
        self.frontend_api = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    frontend_api: String,
}

impl AuthClient {
    pub fn new(settings: &AuthSettings) -> ApiResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            frontend_api: settings.frontend_api.clone(),
        })
    }

    pub fn frontend_api(&self) -> &str {
        &self.frontend_api
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.frontend_api, path)
    }

    async fn json_body(response: reqwest::Response) -> ApiResult<Value> {
        let raw = RawResponse {
            status: response.status().as_u16(),
            body: response.text().await?,
        };
        debug!("auth service answered {}: {}", raw.status, raw.body);
        raw.ensure_success()?.json()
    }

    fn string_field(body: &Value, field: &str) -> ApiResult<String> {
        body.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::MissingField(field.to_string()))
    }

    /// `POST /v1/dev_browser`, returning the dev session token
    pub async fn dev_browser_token(&self) -> ApiResult<String> {
        let url = self.url("/v1/dev_browser");
        info!("Requesting dev session token from {}", url);
        let response = self.http.post(url).json(&json!({})).send().await?;
        let body = Self::json_body(response).await?;
        Self::string_field(&body, "token")
    }

    /// Start a sign-up for `email`, returning the created resource id
    pub async fn create_email_address(&self, email: &str, token: &str) -> ApiResult<String> {
        info!("Creating email address {}", email);
        let response = self
            .http
            .post(self.url("/v1/client/sign_ups"))
            .query(&[(DEV_SESSION_PARAM, token)])
            .json(&json!({ "email_address": email }))
            .send()
            .await?;
        let body = Self::json_body(response).await?;
        Self::string_field(&body, "id")
    }

    /// Submit the verification code for an email address
    pub async fn verify_email_address(&self, email_id: &str, code: &str, token: &str) -> ApiResult<()> {
        info!("Verifying email address {}", email_id);
        let response = self
            .http
            .post(self.url(&format!("/v1/me/email_addresses/{}/attempt_verification", email_id)))
            .query(&[(DEV_SESSION_PARAM, token)])
            .form(&[("code", code)])
            .send()
            .await?;
        RawResponse {
            status: response.status().as_u16(),
            body: response.text().await?,
        }
        .ensure_success()
        .map(|_| ())
    }

    /// Whether the signed-in user's public metadata marks onboarding done
    pub async fn onboarding_complete(&self, token: &str) -> ApiResult<bool> {
        let response = self
            .http
            .get(self.url("/v1/me"))
            .query(&[(DEV_SESSION_PARAM, token)])
            .send()
            .await?;
        let body = Self::json_body(response).await?;
        Ok(body
            .pointer("/publicMetadata/onboardingComplete")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }
}
