//! Reaper error types

use thiserror::Error;

/// Errors raised while reaping a DNS record
#[derive(Error, Debug)]
pub enum ReaperError {
    #[error("No hosted zone matches suffix: {0}")]
    ZoneNotFound(String),

    #[error("Hosted zone suffix {suffix} matches several zones: {zone_ids:?}")]
    AmbiguousZone {
        suffix: String,
        zone_ids: Vec<String>,
    },

    #[error("Delete rejected for {fqdn}: {reason}")]
    DeleteRejected { fqdn: String, reason: String },

    #[error("DNS Record \"{fqdn}\" still exists after delete ({value})")]
    VerificationFailed { fqdn: String, value: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReaperError {
    /// Process exit code for this failure.
    ///
    /// Verification failures and rejected deletes get their own codes so
    /// wrappers can tell them apart from transport or setup problems.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReaperError::VerificationFailed { .. } => 2,
            ReaperError::DeleteRejected { .. } => 3,
            _ => 1,
        }
    }
}
