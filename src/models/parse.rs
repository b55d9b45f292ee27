//! Document parsing request and response models.

use serde::{Deserialize, Serialize};

/// Provider status of a job that has not finished yet.
pub const JOB_PENDING: &str = "PENDING";

/// Status reported when the service itself could not talk to the provider.
pub const STATUS_ERROR: &str = "ERROR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    pub file_id: String,
    /// Pre-signed download URL of the file.
    pub file_url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadStatus {
    Processing,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResponse {
    pub status: UploadStatus,
    pub file_id: String,
    pub job_id: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseStatusRequest {
    pub job_id: String,
    /// Poll in-process until the job leaves PENDING or the poll budget runs out.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseStatusResponse {
    /// Provider status string, passed through unchanged, or `ERROR`.
    pub status: String,
    pub job_id: String,
    /// Polls made after the first one.
    pub retry_count: u32,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResultRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPage {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResultResponse {
    pub status: String,
    pub job_id: String,
    pub pages: Vec<ParsedPage>,
    pub total_pages: usize,
}

/// Status of a parse job as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case(JOB_PENDING)
    }
}
