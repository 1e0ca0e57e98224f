//! Error types for the support widget

use thiserror::Error;

/// Result type alias for widget operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the support widget
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A single transport call was rejected
    #[error("transport {operation} failed: {message}")]
    Transport {
        /// Name of the rejected call (e.g. `send_message`)
        operation: &'static str,
        /// Reason reported by the transport
        message: String,
    },

    /// Attachment processing error
    #[error("attachment error: {0}")]
    Attachment(String),

    /// Voice/video calling error
    #[error("voice/video error: {0}")]
    VoiceVideo(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a transport call failure
    #[must_use]
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_names_operation() {
        let err = Error::transport("send_message", "network down");
        assert_eq!(err.to_string(), "transport send_message failed: network down");
    }

    #[test]
    fn script_errors_convert_with_question_mark() {
        fn parse(text: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(text)?)
        }
        assert!(matches!(parse("{ not json"), Err(Error::Serialization(_))));

        fn read(path: &std::path::Path) -> Result<String> {
            Ok(std::fs::read_to_string(path)?)
        }
        assert!(matches!(
            read(std::path::Path::new("/nonexistent/support-widget/script.json")),
            Err(Error::Io(_))
        ));
    }
}
