//! Error types for the editor core.

use thiserror::Error;

/// Failures surfaced to callers.
///
/// Playback transitions outside their precondition are no-ops, not errors.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EditorError {
    /// Keyframe index past the end of the store.
    #[error("keyframe index {index} out of range (len {len})")]
    KeyframeOutOfRange { index: usize, len: usize },

    /// Export requested on an empty store.
    #[error("no keyframes to export")]
    NothingToExport,

    /// Input was not valid JSON.
    #[error("document parse error: {0}")]
    DocumentParse(String),

    /// JSON matched a known shape but its contents are malformed.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// JSON did not match any supported document shape.
    #[error("unrecognized document format")]
    UnrecognizedDocument,

    /// Duration input rejected (non-positive, non-finite or unparsable).
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl EditorError {
    /// Whether the error came from reading an exchange document.
    #[inline]
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Self::DocumentParse(_) | Self::InvalidDocument(_) | Self::UnrecognizedDocument
        )
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::DocumentParse(err.to_string())
    }
}

/// Editor core result type
pub type Result<T> = core::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_map_to_document_parse() {
        let err: EditorError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, EditorError::DocumentParse(_)));
        assert!(err.is_document_error());
    }

    #[test]
    fn out_of_range_message_names_index() {
        let err = EditorError::KeyframeOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "keyframe index 4 out of range (len 2)");
        assert!(!err.is_document_error());
    }
}
