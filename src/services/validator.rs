//! File validation rules applied before a document enters the pipeline.

use crate::models::{FileValidationRequest, FileValidationResponse, ValidationConfig};

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Stateless rule set checking declared type and size of a file.
#[derive(Debug, Clone)]
pub struct FileValidator {
    allowed_types: Vec<String>,
    max_file_size_mb: u64,
    bytes_per_page: u64,
}

impl FileValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            allowed_types: config.allowed_types.clone(),
            max_file_size_mb: config.max_file_size_mb,
            bytes_per_page: config.bytes_per_page.max(1),
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MIB)
    }

    /// Rough page count: one page per `bytes_per_page`, at least one.
    pub fn estimate_pages(&self, size_bytes: u64) -> u64 {
        (size_bytes / self.bytes_per_page).max(1)
    }

    /// Validate `request`, stamping the response with `validated_at`.
    pub fn validate(
        &self,
        request: &FileValidationRequest,
        validated_at: String,
    ) -> FileValidationResponse {
        if !self.allowed_types.iter().any(|t| t == &request.file_type) {
            tracing::warn!(file_id = %request.file_id, file_type = %request.file_type, "unsupported file type");
            return FileValidationResponse::invalid(
                &request.file_id,
                format!("Unsupported file type: {}", request.file_type),
                validated_at,
            );
        }

        if request.file_size_bytes > self.max_size_bytes() {
            let size_mb = request.file_size_bytes as f64 / BYTES_PER_MIB as f64;
            tracing::warn!(file_id = %request.file_id, size_mb, "file too large");
            return FileValidationResponse::invalid(
                &request.file_id,
                format!(
                    "File too large: {:.2}MB (max: {}MB)",
                    size_mb, self.max_file_size_mb
                ),
                validated_at,
            );
        }

        let estimated_pages = self.estimate_pages(request.file_size_bytes);
        tracing::info!(file_id = %request.file_id, estimated_pages, "file validated");
        FileValidationResponse::valid(&request.file_id, estimated_pages, validated_at)
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationStatus;

    fn request(file_type: &str, size: u64) -> FileValidationRequest {
        FileValidationRequest {
            file_id: "file-1".to_string(),
            file_name: "report.pdf".to_string(),
            file_type: file_type.to_string(),
            file_size_bytes: size,
        }
    }

    fn now() -> String {
        "2024-01-01T00:00:00+00:00".to_string()
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let response = FileValidator::default().validate(&request("image/png", 1024), now());
        assert_eq!(response.status, ValidationStatus::Invalid);
        assert_eq!(
            response.error_message.as_deref(),
            Some("Unsupported file type: image/png")
        );
        assert!(response.estimated_pages.is_none());
    }

    #[test]
    fn test_rejects_oversized_file() {
        let response =
            FileValidator::default().validate(&request("application/pdf", 60 * 1024 * 1024), now());
        assert_eq!(response.status, ValidationStatus::Invalid);
        assert_eq!(
            response.error_message.as_deref(),
            Some("File too large: 60.00MB (max: 50MB)")
        );
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let validator = FileValidator::default();
        let response = validator.validate(&request("application/pdf", 50 * 1024 * 1024), now());
        assert_eq!(response.status, ValidationStatus::Valid);
        assert_eq!(response.estimated_pages, Some(1024));
    }

    #[test]
    fn test_estimates_pages() {
        let validator = FileValidator::default();
        let response = validator.validate(&request("application/pdf", 102_400), now());
        assert_eq!(response.status, ValidationStatus::Valid);
        assert_eq!(response.estimated_pages, Some(2));
        assert!(response.error_message.is_none());

        assert_eq!(validator.estimate_pages(0), 1);
        assert_eq!(validator.estimate_pages(51_199), 1);
        assert_eq!(validator.estimate_pages(153_600), 3);
    }

    #[test]
    fn test_type_checked_before_size() {
        let response =
            FileValidator::default().validate(&request("text/plain", 100 * 1024 * 1024), now());
        assert!(
            response
                .error_message
                .unwrap()
                .starts_with("Unsupported file type")
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let validator = FileValidator::default();
        let req = request(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            250_000,
        );
        let first = validator.validate(&req, now());
        let second = validator.validate(&req, "2024-01-02T00:00:00+00:00".to_string());
        assert_eq!(first.status, second.status);
        assert_eq!(first.estimated_pages, second.estimated_pages);
    }
}
