//! Error taxonomy for the assessment pipeline and its outward error shape

use serde::Serialize;
use thiserror::Error;

/// Main error type for five-s-audit
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("No images provided")]
    EmptyInput,

    #[error("Too many images: {count} provided, at most {max} allowed")]
    TooManyImages { count: usize, max: usize },

    #[error("Image {index} is not a valid base64 payload: {message}")]
    InvalidImage { index: usize, message: String },

    #[error("Inference capability unavailable: {message}")]
    CapabilityUnavailable { message: String },

    /// `status` is absent when the request never produced a response
    /// (connect failure, timeout). `body` is kept for logs only.
    #[error("{}", transport_message(.status, .message))]
    TransportFailure {
        status: Option<u16>,
        message: String,
        body: String,
    },

    #[error("Could not find a JSON object in the model response")]
    NoJsonFound,

    #[error("Could not parse JSON from the model response: {message}")]
    MalformedJson { message: String },

    #[error("Invalid assessment structure: {message}")]
    InvalidStructure { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Inference capability error: status {code}"),
        None => format!("Inference capability request failed: {message}"),
    }
}

/// Stable, copyable discriminant of [`AuditError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    TooManyImages,
    InvalidImage,
    CapabilityUnavailable,
    TransportFailure,
    NoJsonFound,
    MalformedJson,
    InvalidStructure,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::TooManyImages => "too_many_images",
            ErrorKind::InvalidImage => "invalid_image",
            ErrorKind::CapabilityUnavailable => "capability_unavailable",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::NoJsonFound => "no_json_found",
            ErrorKind::MalformedJson => "malformed_json",
            ErrorKind::InvalidStructure => "invalid_structure",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const CREDENTIAL_HINT: &str =
    "Check that ANTHROPIC_API_KEY is set in the environment or the .env file";

impl AuditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuditError::EmptyInput => ErrorKind::EmptyInput,
            AuditError::TooManyImages { .. } => ErrorKind::TooManyImages,
            AuditError::InvalidImage { .. } => ErrorKind::InvalidImage,
            AuditError::CapabilityUnavailable { .. } => ErrorKind::CapabilityUnavailable,
            AuditError::TransportFailure { .. } => ErrorKind::TransportFailure,
            AuditError::NoJsonFound => ErrorKind::NoJsonFound,
            AuditError::MalformedJson { .. } => ErrorKind::MalformedJson,
            AuditError::InvalidStructure { .. } => ErrorKind::InvalidStructure,
            AuditError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Actionable hint for the caller, only when the operator can fix the cause
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AuditError::CapabilityUnavailable { .. } => Some(CREDENTIAL_HINT),
            _ => None,
        }
    }

    /// HTTP status the transport layer reports for this failure
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::EmptyInput | ErrorKind::TooManyImages | ErrorKind::InvalidImage => 400,
            ErrorKind::CapabilityUnavailable => 503,
            ErrorKind::TransportFailure
            | ErrorKind::NoJsonFound
            | ErrorKind::MalformedJson
            | ErrorKind::InvalidStructure => 502,
            ErrorKind::Config => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            hint: self.hint().map(str::to_string),
        }
    }
}

/// Error response shape returned to callers: `{ "error": ..., "hint"?: ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            hint: None,
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::MalformedJson {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AuditError {
    fn from(err: reqwest::Error) -> Self {
        AuditError::TransportFailure {
            status: err.status().map(|s| s.as_u16()),
            message: if err.is_timeout() {
                "request timed out".to_string()
            } else {
                err.to_string()
            },
            body: String::new(),
        }
    }
}

impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        AuditError::Config {
            message: err.to_string(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AuditError>;
