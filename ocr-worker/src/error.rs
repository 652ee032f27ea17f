use thiserror::Error;

use crate::protocol::Response;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("OCR engine not installed: {0}")]
    EngineNotInstalled(String),

    #[error("OCR initialization failed: {0}")]
    EngineInit(String),

    #[error("Invalid JSON request")]
    InvalidJson,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing image_path parameter")]
    MissingImagePath,

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("{0}")]
    Ocr(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn into_response(self) -> Response {
        Response::error(self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(WorkerError::InvalidJson.to_string(), "Invalid JSON request");
        assert_eq!(
            WorkerError::MissingImagePath.to_string(),
            "Missing image_path parameter"
        );
        assert_eq!(
            WorkerError::ImageNotFound("/tmp/x.png".into()).to_string(),
            "Image not found: /tmp/x.png"
        );
        assert_eq!(
            WorkerError::EngineInit("no model".into()).to_string(),
            "OCR initialization failed: no model"
        );
    }

    #[test]
    fn test_engine_error_passes_message_through() {
        let response = WorkerError::Ocr("Failed to read image".into()).into_response();
        assert_eq!(response, Response::error("Failed to read image"));
    }
}
