//! HTTP client for the lineup endpoints
//!
//! One client per process, cheap to clone. The cookie store carries the
//! staff session implicitly; no explicit auth headers exist on these routes.

use async_trait::async_trait;
use lineup_core::{
    ApiResult, DomainError, GbsNumber, LineupRecord, LineupTransport, MemoId, MemoInput, RecordId,
    RetreatId,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use validator::Validate;

use crate::dto::{ApiErrorBody, MemoRequest, UpdateGbsNumberRequest};

/// Errors building the client itself
#[derive(Debug, thiserror::Error)]
pub enum HttpTransportError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// REST transport for the lineup backend
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport against a base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HttpTransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from loaded configuration
    pub fn from_config(config: &lineup_common::ServerConfig) -> Result<Self, HttpTransportError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map a response to its JSON body, translating error statuses
    async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| DomainError::RequestFailed(format!("invalid response body: {e}")));
        }

        // Non-2xx: the backend sends {message, code}
        let body = response.json::<ApiErrorBody>().await.ok();
        Err(Self::map_error(status, body))
    }

    fn map_error(status: StatusCode, body: Option<ApiErrorBody>) -> DomainError {
        let (message, code) = match body {
            Some(b) => (b.message, b.code.unwrap_or_default()),
            None => (status.to_string(), String::new()),
        };

        tracing::debug!(status = %status, code = %code, "Request rejected by server");
        DomainError::ServerRejected { message, code }
    }

    fn request_error(e: reqwest::Error) -> DomainError {
        DomainError::RequestFailed(e.to_string())
    }

    fn memo_request(input: MemoInput) -> ApiResult<MemoRequest> {
        let request = MemoRequest {
            memo: input.memo,
            color: input.color,
        };
        request.validate().map_err(|_| {
            if request.memo.is_empty() {
                DomainError::EmptyMemo
            } else {
                DomainError::MemoTooLong {
                    max: lineup_core::MEMO_MAX_LEN,
                }
            }
        })?;
        Ok(request)
    }
}

#[async_trait]
impl LineupTransport for HttpTransport {
    async fn fetch_roster(&self, retreat_id: RetreatId) -> ApiResult<Vec<LineupRecord>> {
        let url = self.url(&format!("/retreats/{retreat_id}/lineups"));
        tracing::trace!(%url, "Fetching roster");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn update_gbs_number(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        gbs_number: Option<GbsNumber>,
    ) -> ApiResult<LineupRecord> {
        let url = self.url(&format!("/retreats/{retreat_id}/lineups/gbs-number"));
        let body = UpdateGbsNumberRequest {
            record_id,
            gbs_number,
        };

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn create_memo(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        input: MemoInput,
    ) -> ApiResult<LineupRecord> {
        let url = self.url(&format!("/retreats/{retreat_id}/lineups/{record_id}/memo"));
        let body = Self::memo_request(input)?;

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn update_memo(
        &self,
        retreat_id: RetreatId,
        memo_id: MemoId,
        input: MemoInput,
    ) -> ApiResult<LineupRecord> {
        let url = self.url(&format!("/retreats/{retreat_id}/lineups/memo/{memo_id}"));
        let body = Self::memo_request(input)?;

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    async fn delete_memo(
        &self,
        retreat_id: RetreatId,
        memo_id: MemoId,
    ) -> ApiResult<LineupRecord> {
        let url = self.url(&format!("/retreats/{retreat_id}/lineups/memo/{memo_id}"));

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(Self::request_error)?;
        Self::read_json(response).await
    }

    fn describe(&self) -> &'static str {
        "http"
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}
