//! File validation request and response models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidationRequest {
    /// Upstream file identifier (e.g. a Google Drive file id).
    pub file_id: String,
    pub file_name: String,
    /// Declared MIME type.
    pub file_type: String,
    pub file_size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValidationResponse {
    pub status: ValidationStatus,
    pub file_id: String,
    pub estimated_pages: Option<u64>,
    pub error_message: Option<String>,
    pub validated_at: String,
}

impl FileValidationResponse {
    pub fn valid(file_id: impl Into<String>, estimated_pages: u64, validated_at: String) -> Self {
        Self {
            status: ValidationStatus::Valid,
            file_id: file_id.into(),
            estimated_pages: Some(estimated_pages),
            error_message: None,
            validated_at,
        }
    }

    pub fn invalid(
        file_id: impl Into<String>,
        message: impl Into<String>,
        validated_at: String,
    ) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            file_id: file_id.into(),
            estimated_pages: None,
            error_message: Some(message.into()),
            validated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_value(ValidationStatus::Invalid).unwrap();
        assert_eq!(json, "INVALID");
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let result: Result<FileValidationRequest, _> = serde_json::from_str(
            r#"{"file_id":"a","file_name":"a.pdf","file_type":"application/pdf","file_size_bytes":-1}"#,
        );
        assert!(result.is_err());
    }
}
