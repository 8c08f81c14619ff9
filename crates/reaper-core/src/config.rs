//! Run configuration
//!
//! A single `ReaperConfig` is built by the binary and handed to the logger
//! and the orchestrator. Nothing in the library reads flags from globals.

use serde::{Deserialize, Serialize};

use crate::errors::ReaperError;

/// Hosted zone used when none is given on the command line
pub const DEFAULT_HOSTED_ZONE: &str = "internal.example.com";

/// TTL sent with the delete change. Route 53 rejects the change unless it
/// matches the live record.
pub const DEFAULT_RECORD_TTL: u32 = 300;

/// Console output switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Emit intermediate state lines
    pub verbose: bool,
    /// Dump every service response
    pub debug: bool,
    /// Colorize lines by severity keyword
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    /// DNS suffix of the hosted zone, e.g. `internal.example.com`
    pub hosted_zone: String,

    /// Skip zone resolution and use this hosted zone id
    pub zone_id: Option<String>,

    /// Run every check but never submit the delete
    pub dry_run: bool,

    pub record_ttl: u32,

    pub log: LogSettings,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            hosted_zone: DEFAULT_HOSTED_ZONE.to_string(),
            zone_id: None,
            dry_run: false,
            record_ttl: DEFAULT_RECORD_TTL,
            log: LogSettings::default(),
        }
    }
}

impl ReaperConfig {
    /// Normalize user input and reject values that cannot work.
    ///
    /// The hosted zone loses surrounding whitespace and any trailing dot,
    /// an empty zone id override is treated as absent.
    pub fn validated(mut self) -> Result<Self, ReaperError> {
        self.hosted_zone = self.hosted_zone.trim().trim_end_matches('.').to_string();
        if self.hosted_zone.is_empty() {
            return Err(ReaperError::Config(
                "hosted zone must not be empty".to_string(),
            ));
        }

        self.zone_id = self
            .zone_id
            .map(|id| id.trim().trim_start_matches("/hostedzone/").to_string())
            .filter(|id| !id.is_empty());

        if self.record_ttl == 0 {
            return Err(ReaperError::Config(
                "record TTL must be greater than zero".to_string(),
            ));
        }

        Ok(self)
    }
}
