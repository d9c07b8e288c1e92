//! # HTTP client for the documentation-generation backend
//!
//! [`HttpClient`] implements [`DocgenApi`] on top of `reqwest`. One client
//! holds one cookie store, so the session cookie returned by `login` is sent
//! with every later request made through the same instance.
//!
//! Auth and settings failures surface the server's `detail` text (see
//! [`extract_error_message`]); the task endpoints only report the HTTP status.
//! Nothing here retries or sets timeouts.

use async_trait::async_trait;
use docugen_core::contract::{
    extract_error_message, ApiKeyStatus, BackendProcessingResult, DocgenApi, LoginResponse,
    NewAccount, StartProcessingResponse, TaskStatusResponse,
};
use docugen_core::ApiError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8087";

pub struct HttpClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(network)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, "Initialised backend HTTP client");
        Ok(Self {
            http,
            base_url,
            api_key: None,
        })
    }

    /// Send `key` as `X-API-Key` with every processing request.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn network(e: reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

/// Turn a non-2xx response into [`ApiError::Request`] carrying the server's
/// detail message, or `fallback` when the body has none.
async fn check(resp: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body, fallback);
    tracing::warn!(status = status.as_u16(), message = %message, "Backend rejected request");
    Err(ApiError::Request {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    resp.json::<T>().await.map_err(network)
}

#[async_trait]
impl DocgenApi for HttpClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        tracing::info!(username, "Logging in");
        let resp = self
            .http
            .post(self.url("/auth/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(network)?;
        let login: LoginResponse = decode(check(resp, "Login failed").await?).await?;
        tracing::info!(user_name = %login.user_name, "Logged in");
        Ok(login)
    }

    async fn register(&self, account: &NewAccount) -> Result<(), ApiError> {
        tracing::info!(username = %account.username, "Registering account");
        let resp = self
            .http
            .post(self.url("/auth/register"))
            .json(account)
            .send()
            .await
            .map_err(network)?;
        check(resp, "Registration failed").await?;
        self.login(&account.username, &account.password).await?;
        Ok(())
    }

    async fn save_api_key(&self, api_key: &str) -> Result<(), ApiError> {
        tracing::info!("Saving model API key");
        let resp = self
            .http
            .post(self.url("/api/v1/settings/gemini-api-key"))
            .json(&json!({ "api_key": api_key }))
            .send()
            .await
            .map_err(network)?;
        check(resp, "Failed to save API key").await?;
        Ok(())
    }

    async fn get_api_key_status(&self) -> Result<ApiKeyStatus, ApiError> {
        let resp = self
            .http
            .get(self.url("/api/v1/settings/gemini-api-key-status"))
            .send()
            .await
            .map_err(network)?;
        let status: ApiKeyStatus =
            decode(check(resp, "Failed to fetch API key status").await?).await?;
        tracing::info!(configured = status.configured, "Fetched API key status");
        Ok(status)
    }

    async fn start_processing(&self, repo_url: &str) -> Result<String, ApiError> {
        tracing::info!(url = repo_url, api_key_set = self.api_key.is_some(), "Starting processing");
        let mut req = self
            .http
            .post(self.url("/process"))
            .json(&json!({ "url": repo_url }));
        if let Some(key) = &self.api_key {
            req = req.header("X-API-Key", key);
        }
        let resp = req.send().await.map_err(network)?;
        if !resp.status().is_success() {
            tracing::error!(status = resp.status().as_u16(), "Backend refused to start processing");
            return Err(ApiError::StartFailed {
                status: resp.status().as_u16(),
            });
        }
        let started: StartProcessingResponse = decode(resp).await?;
        Ok(started.task_id)
    }

    async fn get_status(&self, task_id: &str) -> Result<TaskStatusResponse, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/status/{task_id}")))
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(ApiError::StatusCheckFailed {
                status: resp.status().as_u16(),
            });
        }
        decode(resp).await
    }

    async fn get_result(&self, task_id: &str) -> Result<BackendProcessingResult, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/result/{task_id}")))
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(ApiError::ResultFetchFailed {
                status: resp.status().as_u16(),
            });
        }
        let result: BackendProcessingResult = decode(resp).await?;
        tracing::info!(
            task_id,
            sections = result.results.len(),
            "Fetched processing result"
        );
        Ok(result)
    }
}
