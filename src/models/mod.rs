mod config;
mod document;
mod embedding;
mod parse;
mod validation;

pub use config::{
    ALLOWED_FILE_TYPES, Config, DEFAULT_DOCUMENTS_TABLE, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_LLAMAPARSE_URL, DEFAULT_MATCH_FUNCTION, DEFAULT_YANDEX_EMBED_URL, EmbedderConfig,
    ParserConfig, ServerConfig, StorageConfig, StorageDriver, ValidationConfig,
};
pub use document::{
    BatchDocumentInsert, BatchInsertResponse, DeleteByFileRequest, DeleteResponse,
    DocumentInsert, InsertResponse, MAX_SEARCH_LIMIT, SearchRequest, SearchResult,
    StoreConnectionResponse,
};
pub use embedding::{
    BatchEmbedRequest, BatchEmbedResponse, BatchFailure, ConnectionTestResponse, EmbedRequest,
    EmbedResponse, MAX_BATCH_TEXTS, MAX_EMBED_TEXT_CHARS,
};
pub use parse::{
    JOB_PENDING, JobStatus, ParseRequest, ParseResponse, ParseResultRequest, ParseResultResponse,
    ParseStatusRequest, ParseStatusResponse, ParsedPage, STATUS_ERROR, UploadStatus,
};
pub use validation::{FileValidationRequest, FileValidationResponse, ValidationStatus};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
