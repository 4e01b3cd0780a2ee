//! reqwest implementation of the session endpoints

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use scribe_common::api::{
    self, CancelRequest, SessionStatusResponse, StartRequest, StartResponse, SubmitRequest,
};
use scribe_common::config::ClientConfig;
use std::time::Duration;

use super::{BackendError, SessionBackend};

const USER_AGENT: &str = concat!("scribe/", env!("CARGO_PKG_VERSION"));

/// HTTP client for `/session/*`
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::Parse(format!("invalid backend url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Parse(format!(
                "backend url {base_url} cannot be used as a base"
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        Self::new(&config.backend_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, path: &str, extra: Option<&str>) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BackendError::Parse("backend url cannot be a base".to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.trim_start_matches('/').split('/'));
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.endpoint(path, None)?;
        tracing::debug!(%url, "POST");
        self.http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

/// Turn a non-success response into `BackendError::Status`
async fn status_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Status { status, body }
}

#[async_trait]
impl SessionBackend for HttpBackend {
    async fn start(&self, request: &StartRequest) -> Result<StartResponse, BackendError> {
        let response = self.post_json(api::START_PATH, request).await?;
        let status = response.status();

        if status == StatusCode::CONFLICT || status == StatusCode::LOCKED {
            return Err(BackendError::Locked);
        }
        if !status.is_success() {
            return Err(status_error(response).await);
        }

        response
            .json::<StartResponse>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<(), BackendError> {
        let response = self.post_json(api::CANCEL_PATH, request).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<(), BackendError> {
        let response = self.post_json(api::SUBMIT_PATH, request).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn session_status(&self, unit_id: &str) -> Result<SessionStatusResponse, BackendError> {
        let url = self.endpoint(api::STATUS_PATH, Some(unit_id))?;
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .json::<SessionStatusResponse>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}
