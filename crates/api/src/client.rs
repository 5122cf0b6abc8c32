//! Pet-store HTTP client
//!
//! Typed helpers turn non-2xx responses into [`ApiError::Status`]. The raw
//! helpers return whatever the server answered so negative cases can assert
//! on the status code.

use cedar_qa_common::{Configuration, Pet};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Status and body of a response, whatever the status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    async fn read(response: Response) -> ApiResult<Self> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(Self { status, body })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with `ApiError::Status` unless the status is 2xx
    pub fn ensure_success(self) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json(&self) -> ApiResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Debug, Clone)]
pub struct PetStoreClient {
    http: Client,
    base_url: String,
}

impl PetStoreClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("cedar-qa/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Reuse an existing connection pool
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Client for the configured `base_Url`
    pub fn from_configuration(config: &Configuration) -> ApiResult<Self> {
        Self::new(config.base_url()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /pet/{id}`
    pub async fn get_pet(&self, id: i64) -> ApiResult<Pet> {
        let response = self.get_raw(&format!("/pet/{}", id)).await?.ensure_success()?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// `POST /pet`
    pub async fn add_pet(&self, pet: &Pet) -> ApiResult<Pet> {
        let response = self.post_json_raw("/pet", pet).await?.ensure_success()?;
        Ok(serde_json::from_str(&response.body)?)
    }

    pub async fn get_raw(&self, path: &str) -> ApiResult<RawResponse> {
        let url = self.url(path);
        debug!("GET {}", url);
        RawResponse::read(self.http.get(url).send().await?).await
    }

    pub async fn post_json_raw<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ApiResult<RawResponse> {
        let url = self.url(path);
        debug!("POST {}", url);
        RawResponse::read(self.http.post(url).json(body).send().await?).await
    }

    pub async fn put_json_raw<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ApiResult<RawResponse> {
        let url = self.url(path);
        debug!("PUT {}", url);
        RawResponse::read(self.http.put(url).json(body).send().await?).await
    }
}
