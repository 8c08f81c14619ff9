//! AWS client error types

use reaper_core::ReaperError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by the Route 53 and EC2 clients
#[derive(Error, Debug)]
pub enum AwsError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {code}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to parse {service} response: {message}")]
    Parse {
        service: &'static str,
        message: String,
    },

    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    #[error("Missing credentials: {0}")]
    Credentials(String),

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

impl AwsError {
    pub(crate) fn parse(service: &'static str, err: impl std::fmt::Display) -> Self {
        AwsError::Parse {
            service,
            message: err.to_string(),
        }
    }

    /// Build an API error from a non-success response body.
    ///
    /// Understands the Route 53 `ErrorResponse` and `InvalidChangeBatch`
    /// shapes and the EC2 `Response/Errors` shape. Anything else keeps the
    /// raw body as the message.
    pub(crate) fn from_response(service: &'static str, status: u16, body: &str) -> Self {
        let (code, message) = match quick_xml::de::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope.code_and_message(),
            Err(_) => None,
        }
        .unwrap_or_else(|| ("Unknown".to_string(), body.trim().to_string()));

        AwsError::Api {
            service,
            status,
            code,
            message,
        }
    }
}

impl From<AwsError> for ReaperError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Credentials(msg) => ReaperError::Config(msg),
            AwsError::Endpoint(msg) => ReaperError::Config(msg),
            other => ReaperError::Api(other.to_string()),
        }
    }
}

// Root element names differ between services; quick-xml ignores them, so
// one envelope covers all three shapes.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "Error")]
    error: Option<ErrorDetail>,
    #[serde(rename = "Errors")]
    errors: Option<ErrorList>,
    #[serde(rename = "Messages")]
    messages: Option<MessageList>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorList {
    #[serde(rename = "Error", default)]
    error: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(rename = "Message", default)]
    message: Vec<String>,
}

impl ErrorEnvelope {
    fn code_and_message(self) -> Option<(String, String)> {
        let detail = self
            .error
            .or_else(|| self.errors.and_then(|list| list.error.into_iter().next()));

        if let Some(detail) = detail {
            return Some((
                detail.code.unwrap_or_else(|| "Unknown".to_string()),
                detail.message.unwrap_or_default(),
            ));
        }

        self.messages
            .filter(|list| !list.message.is_empty())
            .map(|list| ("InvalidChangeBatch".to_string(), list.message.join("; ")))
    }
}
