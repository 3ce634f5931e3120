use esdsl::response::{ErrorCause, ErrorResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(
        "Elasticsearch error ({status}): {}: {}",
        .cause.error_type,
        .cause.reason.as_deref().unwrap_or("no reason given")
    )]
    Api { status: u16, cause: ErrorCause },

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid request: {0}")]
    Dsl(#[from] esdsl::DslError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Builds the error for a non-2xx response, parsing Elasticsearch error
    /// bodies when possible.
    pub fn from_response(status: u16, body: &str) -> Self {
        match ErrorResponse::parse(status, body) {
            Some(error) => ClientError::Api {
                status,
                cause: error.error,
            },
            None => ClientError::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    /// HTTP status for errors returned by Elasticsearch.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } | ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Http(e) if e.is_timeout() => "timeout",
            ClientError::Http(_) => "connection",
            ClientError::Api { .. } | ClientError::Status { .. } => "api",
            ClientError::Json(_) => "decode",
            _ => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
