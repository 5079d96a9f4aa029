use std::fmt;

use reqwest::StatusCode;

/// Errors produced by the client layer.
#[derive(Debug)]
pub enum GenAiError {
    /// A configuration field failed validation; no state was mutated.
    Validation {
        field: &'static str,
        message: String,
    },
    /// The requested model is absent from the provider catalog.
    ModelNotFound { model: String },
    /// A fetched content type has no prompt representation.
    UnsupportedMedia { content_type: String, url: String },
    /// A prompt argument of unrecognized shape.
    InvalidArgument { kind: String },
    /// A send was attempted on a closed chat session.
    SessionClosed { session: usize },
    /// Image bytes could not be encoded for the wire.
    Decode { message: String },
    /// The HTTP request itself failed.
    Request { source: reqwest::Error },
    /// The provider answered with a non-success status.
    Api { status: StatusCode, body: String },
}

impl fmt::Display for GenAiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, message } => write!(f, "invalid {field}: {message}"),
            Self::ModelNotFound { model } => {
                write!(f, "model '{model}' not found in the provider catalog")
            }
            Self::UnsupportedMedia { content_type, url } => {
                write!(f, "unsupported media type '{content_type}' from {url}")
            }
            Self::InvalidArgument { kind } => {
                write!(f, "prompt argument of unsupported type: {kind}")
            }
            Self::SessionClosed { session } => write!(f, "chat session {session} is closed"),
            Self::Decode { message } => write!(f, "image encoding failed: {message}"),
            Self::Request { source } => write!(f, "request failed: {source}"),
            Self::Api { status, body } => write!(f, "Gemini API error {status}: {body}"),
        }
    }
}

impl std::error::Error for GenAiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request { source } => Some(source),
            _ => None,
        }
    }
}
