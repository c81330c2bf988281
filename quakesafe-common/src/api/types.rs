//! Shared API request/response types

use serde::{Deserialize, Serialize};

use crate::verdict::{CrackVerdict, StructuralVerdict};

// ========================================
// Chat
// ========================================

/// Body of `POST /send_message`
///
/// # Examples
///
/// ```
/// use quakesafe_common::api::types::ChatRequest;
///
/// let request: ChatRequest = serde_json::from_str(r#"{"message": "你好"}"#).unwrap();
/// assert_eq!(request.message, "你好");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response of `POST /send_message`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

// ========================================
// Submit
// ========================================

/// Response of `POST /submit`
///
/// `prediction` and `img_reply` are absent when the uploaded file type was
/// rejected; the structural `result` is still reported in that case.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitResponse {
    /// Structural verdict text
    pub result: String,
    /// Formatted structural confidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    /// Crack verdict message, or the rejection notice
    pub image_status: String,
    /// Language-model explanation of the crack verdict
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_reply: Option<String>,
}

/// `image_status` reported for a disallowed upload extension
pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";

impl SubmitResponse {
    /// Full response for an analysed image
    pub fn analysed(structural: &StructuralVerdict, crack: CrackVerdict, img_reply: String) -> Self {
        Self {
            result: structural.label().to_string(),
            prediction: Some(structural.confidence_text()),
            image_status: crack.message().to_string(),
            img_reply: Some(img_reply),
        }
    }

    /// Partial response when the upload's file type is not accepted
    pub fn file_type_rejected(structural: &StructuralVerdict) -> Self {
        Self {
            result: structural.label().to_string(),
            prediction: None,
            image_status: FILE_TYPE_NOT_ALLOWED.to_string(),
            img_reply: None,
        }
    }
}

// ========================================
// Error Response Types
// ========================================

/// Uniform JSON error envelope: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error code and human-readable message
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "BAD_REQUEST")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Create new error response
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// ========================================
// Tests
// ========================================
