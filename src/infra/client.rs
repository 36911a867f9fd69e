use crate::domain::DatasetRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("login failed: {0}")]
    Authentication(String),

    #[error("fetch rejected: {0}")]
    Authorization(String),
}

/// Response envelope shared by every service endpoint. Any `code` other than
/// `"OK"` is an application-level failure regardless of HTTP status.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    fn failure_message(self) -> String {
        self.message.unwrap_or(self.code)
    }

    fn is_ok(&self) -> bool {
        self.code == "OK"
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetPageData {
    #[serde(default)]
    list: Vec<DatasetRecord>,
}

/// Blocking client for the dataset service. One attempt per call, no retry
/// and no caching; the event loop offers manual refresh instead.
pub struct SessionClient {
    agent: ureq::Agent,
    base_url: String,
}

impl SessionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.to_string(),
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/user/login", self.base_url);
        let mut response = self
            .agent
            .post(&url)
            .send_json(LoginRequest { username, password })
            .map_err(|error| match error {
                ureq::Error::StatusCode(code) => ApiError::Authentication(format!("HTTP {code}")),
                other => ApiError::Transport(other.to_string()),
            })?;

        let envelope = response
            .body_mut()
            .read_json::<ApiEnvelope<LoginData>>()
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        login_token(envelope)
    }

    pub fn fetch_datasets(
        &self,
        token: &str,
        page_no: u32,
        page_size: u32,
    ) -> Result<Vec<DatasetRecord>, ApiError> {
        let url = format!(
            "{}/api/dataset/findByPage?pageNo={page_no}&pageSize={page_size}",
            self.base_url
        );
        let mut response = self
            .agent
            .get(&url)
            .header("Authorization", &format!("Bearer {token}"))
            .call()
            .map_err(|error| match error {
                ureq::Error::StatusCode(code) if code == 401 || code == 403 => {
                    ApiError::Authorization(format!("HTTP {code}"))
                }
                other => ApiError::Transport(other.to_string()),
            })?;

        let envelope = response
            .body_mut()
            .read_json::<ApiEnvelope<DatasetPageData>>()
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        dataset_page(envelope)
    }
}

fn login_token(envelope: ApiEnvelope<LoginData>) -> Result<String, ApiError> {
    if !envelope.is_ok() {
        return Err(ApiError::Authentication(envelope.failure_message()));
    }
    match envelope.data {
        Some(data) => Ok(data.token),
        None => Err(ApiError::Transport(
            "login response missing token".to_string(),
        )),
    }
}

fn dataset_page(envelope: ApiEnvelope<DatasetPageData>) -> Result<Vec<DatasetRecord>, ApiError> {
    if !envelope.is_ok() {
        return Err(ApiError::Authorization(envelope.failure_message()));
    }
    Ok(envelope.data.map(|data| data.list).unwrap_or_default())
}
