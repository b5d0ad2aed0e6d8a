//! Request and response types for the `/generate` endpoint.

use serde::{Deserialize, Serialize};

/// Inpainting request sent by the editor.
///
/// `image` and `mask` are base64 strings, optionally wrapped in a data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub image: String,
    pub mask: String,
    pub prompt: String,
}

/// Successful generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    /// Result image as a `data:image/png;base64,...` URI.
    pub image: String,
}

impl GenerateResponse {
    pub fn success(image: String) -> Self {
        Self {
            status: "success".to_string(),
            image,
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_from_json() {
        let json = r#"{
            "image": "data:image/png;base64,AAAA",
            "mask": "AAAA",
            "prompt": "a red balloon"
        }"#;
        let req: GenerateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.image, "data:image/png;base64,AAAA");
        assert_eq!(req.mask, "AAAA");
        assert_eq!(req.prompt, "a red balloon");
    }

    #[test]
    fn test_generate_request_requires_prompt() {
        let json = r#"{"image": "AAAA", "mask": "AAAA"}"#;
        assert!(serde_json::from_str::<GenerateRequest>(json).is_err());
    }

    #[test]
    fn test_success_response_shape() {
        let resp = GenerateResponse::success("data:image/png;base64,AAAA".to_string());
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "success", "image": "data:image/png;base64,AAAA"})
        );
    }
}
