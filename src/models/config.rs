use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::utils::RetryPolicy;

pub const DEFAULT_YANDEX_EMBED_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/textEmbedding";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-search-doc/latest";
pub const DEFAULT_LLAMAPARSE_URL: &str = "https://api.cloud.llamaindex.ai";
pub const DEFAULT_DOCUMENTS_TABLE: &str = "documents";
pub const DEFAULT_MATCH_FUNCTION: &str = "match_documents";

pub const ALLOWED_FILE_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.spreadsheet",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub embedder: EmbedderConfig,

    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rag-ingest").join("config.toml"))
    }

    /// Load defaults, then the TOML file (explicit path or the default location
    /// if it exists), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay environment variables. `lookup` abstracts the process environment for tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("RAG_INGEST_BIND") {
            self.server.bind = Some(v);
        }

        if let Some(v) = get("YANDEX_API_KEY") {
            self.embedder.api_key = Some(v);
        }
        if let Some(v) = get("YANDEX_FOLDER_ID") {
            self.embedder.folder_id = Some(v);
        }
        if let Some(v) = get("YANDEX_EMBED_URL") {
            self.embedder.url = v;
        }
        if let Some(v) = get("YANDEX_EMBED_MODEL") {
            self.embedder.model = v;
        }

        if let Some(v) = get("LLAMAPARSE_API_KEY") {
            self.parser.api_key = Some(v);
        }
        if let Some(v) = get("LLAMAPARSE_BASE_URL") {
            self.parser.base_url = v;
        }

        if let Some(v) = get("STORAGE_DRIVER") {
            self.storage.driver = v.parse().map_err(|message| ConfigError::InvalidEnv {
                key: "STORAGE_DRIVER".to_string(),
                message,
            })?;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.storage.url = Some(v);
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.storage.api_key = Some(v);
        }
        if let Some(v) = get("DATABASE_URL") {
            self.storage.database_url = Some(v);
        }

        Ok(())
    }

    pub fn require_embedder(&self) -> Result<(), ConfigError> {
        require(&self.embedder.api_key, "YANDEX_API_KEY")?;
        require(&self.embedder.folder_id, "YANDEX_FOLDER_ID")
    }

    pub fn require_parser(&self) -> Result<(), ConfigError> {
        require(&self.parser.api_key, "LLAMAPARSE_API_KEY")
    }

    pub fn require_storage(&self) -> Result<(), ConfigError> {
        match self.storage.driver {
            StorageDriver::Supabase => {
                require(&self.storage.url, "SUPABASE_URL")?;
                require(&self.storage.api_key, "SUPABASE_KEY")
            }
            StorageDriver::Postgres => require(&self.storage.database_url, "DATABASE_URL"),
        }
    }

    /// Copy of the configuration with credentials replaced, for display.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for secret in [
            &mut masked.embedder.api_key,
            &mut masked.parser.api_key,
            &mut masked.storage.api_key,
        ] {
            if secret.is_some() {
                *secret = Some("********".to_string());
            }
        }
        if let Some(url) = masked.storage.database_url.as_mut() {
            *url = mask_url_password(url);
        }
        masked
    }
}

fn require(value: &Option<String>, name: &str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::ValidationError(format!("{name} is not set"))),
    }
}

fn mask_url_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:********@{host}"),
        None => url.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Overrides the per-service default bind address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    #[serde(default = "default_bytes_per_page")]
    pub bytes_per_page: u64,
}

fn default_allowed_types() -> Vec<String> {
    ALLOWED_FILE_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_max_file_size_mb() -> u64 {
    50
}

fn default_bytes_per_page() -> u64 {
    50 * 1024
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_types: default_allowed_types(),
            max_file_size_mb: default_max_file_size_mb(),
            bytes_per_page: default_bytes_per_page(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default = "default_embed_url")]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_embed_url() -> String {
    DEFAULT_YANDEX_EMBED_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embed_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            url: default_embed_url(),
            api_key: None,
            folder_id: None,
            model: default_embedding_model(),
            timeout_secs: default_embed_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl EmbedderConfig {
    /// Model URI in the provider's `emb://<folder>/<model>` form.
    pub fn model_uri(&self) -> String {
        format!(
            "emb://{}/{}",
            self.folder_id.as_deref().unwrap_or_default(),
            self.model
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_parser_url")]
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_parser_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_parser_url() -> String {
    DEFAULT_LLAMAPARSE_URL.to_string()
}

fn default_parser_timeout() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_polls() -> u32 {
    20
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: default_parser_url(),
            api_key: None,
            timeout_secs: default_parser_timeout(),
            poll_interval_secs: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

impl ParserConfig {
    pub fn poll_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_polls, Duration::from_secs(self.poll_interval_secs))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    #[default]
    Supabase,
    Postgres,
}

impl std::str::FromStr for StorageDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(StorageDriver::Supabase),
            "postgres" | "postgresql" | "pgvector" => Ok(StorageDriver::Postgres),
            _ => Err(format!("unknown storage driver: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageDriver::Supabase => write!(f, "supabase"),
            StorageDriver::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StorageDriver,

    /// Supabase project URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Supabase service key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// PostgreSQL connection string for the `postgres` driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_match_function")]
    pub match_function: String,

    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
}

fn default_table() -> String {
    DEFAULT_DOCUMENTS_TABLE.to_string()
}

fn default_match_function() -> String {
    DEFAULT_MATCH_FUNCTION.to_string()
}

fn default_storage_timeout() -> u64 {
    30
}

fn default_pool_max() -> u32 {
    5
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            url: None,
            api_key: None,
            database_url: None,
            table: default_table(),
            match_function: default_match_function(),
            timeout_secs: default_storage_timeout(),
            pool_max: default_pool_max(),
        }
    }
}
