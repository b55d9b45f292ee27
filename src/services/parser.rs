//! Document parsing provider client and the submit/poll/result service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::ParserError;
use crate::models::{
    JobStatus, ParseRequest, ParseResponse, ParseResultResponse, ParseStatusResponse, ParsedPage,
    ParserConfig, STATUS_ERROR, UploadStatus,
};
use crate::utils::{RetryOutcome, RetryPolicy, with_retry};

/// Page payload as returned by the provider; only the text is kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderPage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResultResponse {
    #[serde(default)]
    pages: Vec<ProviderPage>,
}

/// An asynchronous document parsing service with job semantics.
#[async_trait]
pub trait ParsingProvider: Send + Sync {
    /// Fetch the raw bytes behind a (pre-signed) URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ParserError>;

    /// Submit a file for parsing, returning the provider job id.
    async fn upload(&self, file_name: &str, content: Vec<u8>) -> Result<String, ParserError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ParserError>;

    async fn job_result(&self, job_id: &str) -> Result<Vec<ProviderPage>, ParserError>;
}

/// Client for the LlamaParse REST API.
#[derive(Debug, Clone)]
pub struct LlamaParseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LlamaParseClient {
    pub fn new(config: &ParserConfig) -> Result<Self, ParserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParserError::InvalidResponse(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ParserError> {
        let response = self.client.get(url).bearer_auth(&self.api_key).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ParserError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ParserError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ParserError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ParsingProvider for LlamaParseClient {
    async fn download(&self, url: &str) -> Result<Vec<u8>, ParserError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ParserError::DownloadError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ParserError::DownloadStatus {
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ParserError::DownloadError(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, file_name: &str, content: Vec<u8>) -> Result<String, ParserError> {
        let url = format!("{}/api/parsing/upload", self.base_url);
        let form = Form::new().part("file", Part::bytes(content).file_name(file_name.to_string()));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = Self::decode(response).await?;
        Ok(upload.id)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ParserError> {
        let url = format!("{}/api/parsing/job/{}", self.base_url, job_id);
        self.get_json(&url).await
    }

    async fn job_result(&self, job_id: &str) -> Result<Vec<ProviderPage>, ParserError> {
        let url = format!("{}/api/v1/parsing/job/{}/result/json", self.base_url, job_id);
        let result: ResultResponse = self.get_json(&url).await?;
        Ok(result.pages)
    }
}

/// Renumber provider pages 1..N in the order received; provider page ids are ignored.
pub fn renumber_pages(pages: Vec<ProviderPage>) -> Vec<ParsedPage> {
    pages
        .into_iter()
        .enumerate()
        .map(|(idx, page)| ParsedPage {
            page_number: idx as u32 + 1,
            text: page.text.unwrap_or_default(),
        })
        .collect()
}

/// Submit, poll and fetch parse jobs against a provider.
#[derive(Clone)]
pub struct ParserService {
    provider: Arc<dyn ParsingProvider>,
    poll_policy: RetryPolicy,
}

impl ParserService {
    pub fn new(provider: Arc<dyn ParsingProvider>, poll_policy: RetryPolicy) -> Self {
        Self {
            provider,
            poll_policy,
        }
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self, ParserError> {
        let client = LlamaParseClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.poll_policy()))
    }

    /// Download the file and hand it to the provider. Failures are reported in the body.
    pub async fn submit(&self, request: &ParseRequest) -> ParseResponse {
        let result = async {
            let content = self.provider.download(&request.file_url).await?;
            tracing::debug!(file_id = %request.file_id, bytes = content.len(), "file downloaded");
            self.provider.upload(&request.file_name, content).await
        }
        .await;

        match result {
            Ok(job_id) => {
                tracing::info!(file_id = %request.file_id, %job_id, "upload successful");
                ParseResponse {
                    status: UploadStatus::Processing,
                    file_id: request.file_id.clone(),
                    job_id: Some(job_id),
                    error_message: None,
                }
            }
            Err(e) => {
                tracing::error!(file_id = %request.file_id, error = %e, "upload failed");
                ParseResponse {
                    status: UploadStatus::Error,
                    file_id: request.file_id.clone(),
                    job_id: None,
                    error_message: Some(e.to_string()),
                }
            }
        }
    }

    /// One status check; the provider status is passed through unchanged.
    pub async fn status(&self, job_id: &str) -> ParseStatusResponse {
        match self.provider.job_status(job_id).await {
            Ok(status) => status_response(job_id, status, 0),
            Err(e) => {
                tracing::error!(%job_id, error = %e, "status check failed");
                error_status(job_id, e.to_string(), 0)
            }
        }
    }

    /// Poll at a fixed interval while the job is pending, up to the configured
    /// number of retries. Dropping the returned future stops polling.
    pub async fn wait_for_completion(&self, job_id: &str) -> ParseStatusResponse {
        let outcome = with_retry(&self.poll_policy, "parse_status", || async move {
            let status = self.provider.job_status(job_id).await?;
            if status.is_pending() {
                return Err(ParserError::JobPending {
                    job_id: job_id.to_string(),
                    status: status.status,
                });
            }
            Ok(status)
        })
        .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                status_response(job_id, value, attempts - 1)
            }
            RetryOutcome::Failed {
                last_error: ParserError::JobPending { status, .. },
                attempts,
            } => ParseStatusResponse {
                status,
                job_id: job_id.to_string(),
                retry_count: attempts - 1,
                error_message: None,
            },
            RetryOutcome::Failed {
                last_error,
                attempts,
            } => error_status(job_id, last_error.to_string(), attempts - 1),
        }
    }

    /// Fetch parsed pages. Unlike submit/status, failures propagate to the caller.
    pub async fn result(&self, job_id: &str) -> Result<ParseResultResponse, ParserError> {
        let pages = renumber_pages(self.provider.job_result(job_id).await?);
        tracing::info!(%job_id, total_pages = pages.len(), "parse result fetched");

        Ok(ParseResultResponse {
            status: "SUCCESS".to_string(),
            job_id: job_id.to_string(),
            total_pages: pages.len(),
            pages,
        })
    }
}

fn status_response(job_id: &str, status: JobStatus, retry_count: u32) -> ParseStatusResponse {
    ParseStatusResponse {
        status: status.status,
        job_id: job_id.to_string(),
        retry_count,
        error_message: status.error,
    }
}

fn error_status(job_id: &str, message: String, retry_count: u32) -> ParseStatusResponse {
    ParseStatusResponse {
        status: STATUS_ERROR.to_string(),
        job_id: job_id.to_string(),
        retry_count,
        error_message: Some(message),
    }
}
