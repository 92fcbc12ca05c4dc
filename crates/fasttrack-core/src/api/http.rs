//! HTTP client for the fast-log endpoints.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use url::Url;

use super::{FastLogApi, FastLogRecord, FastLogRequest};
use crate::error::ApiError;

const FAST_LOGS_PATH: &str = "logs/fasts";

/// Client for `/logs/fasts` on the coaching backend.
#[derive(Debug, Clone)]
pub struct HttpLogClient {
    base_url: Url,
    token: Option<String>,
    http_client: Client,
}

impl HttpLogClient {
    /// Create a client rooted at `base_url`.
    ///
    /// # Errors
    /// Returns `NotConfigured` for an empty URL and `InvalidUrl` if it does
    /// not parse.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            http_client: Client::new(),
        })
    }

    fn endpoint(&self, id: Option<i64>) -> Result<Url, ApiError> {
        let path = match id {
            Some(id) => format!("{FAST_LOGS_PATH}/{id}"),
            None => FAST_LOGS_PATH.to_string(),
        };
        Ok(self.base_url.join(&path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl FastLogApi for HttpLogClient {
    async fn create_fast_log(&self, request: &FastLogRequest) -> Result<FastLogRecord, ApiError> {
        let url = self.endpoint(None)?;
        tracing::debug!(%url, minutes = request.duration_minutes, "creating fast log");
        let response = self
            .authorize(self.http_client.post(url))
            .json(request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_fast_log(
        &self,
        id: i64,
        request: &FastLogRequest,
    ) -> Result<FastLogRecord, ApiError> {
        let url = self.endpoint(Some(id))?;
        tracing::debug!(%url, minutes = request.duration_minutes, "updating fast log");
        let response = self
            .authorize(self.http_client.put(url))
            .json(request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_fast_log(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(Some(id))?;
        tracing::debug!(%url, "deleting fast log");
        let response = self
            .authorize(self.http_client.delete(url))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
