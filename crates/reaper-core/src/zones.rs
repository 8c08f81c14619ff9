//! Hosted zone directory trait and record types
//!
//! These types describe what the reaper needs from a hosted-zone DNS
//! service. Provider crates map their wire formats onto them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ReaperError;

/// Path prefix the provider puts in front of hosted zone ids
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

/// DNS record types the reaper deals with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    Other(String),
}

impl RecordType {
    pub fn parse(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::AAAA,
            "CNAME" => RecordType::CNAME,
            other => RecordType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::AAAA => write!(f, "AAAA"),
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::Other(other) => write!(f, "{}", other),
        }
    }
}

/// A hosted zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Raw provider id, possibly carrying the `/hostedzone/` prefix
    pub id: String,

    /// Zone name in canonical form, e.g. `internal.example.com.`
    pub name: String,

    #[serde(default)]
    pub private_zone: bool,
}

impl HostedZone {
    /// Id without the `/hostedzone/` path prefix
    pub fn bare_id(&self) -> &str {
        self.id.trim_start_matches(HOSTED_ZONE_ID_PREFIX)
    }
}

/// A resource record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    pub name: String,
    pub record_type: RecordType,
    pub ttl: Option<u32>,

    /// Values of the set; empty for alias records
    #[serde(default)]
    pub values: Vec<String>,
}

impl RecordSet {
    /// Values joined for display, e.g. `10.0.0.5, 10.0.0.6`
    pub fn joined_values(&self) -> String {
        self.values.join(", ")
    }

    pub fn is_alias(&self) -> bool {
        self.values.is_empty()
    }
}

/// Positional query: records at or after `start_name`/`start_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSetQuery {
    pub start_name: String,
    pub start_type: RecordType,
    pub max_items: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    Create,
    Delete,
    Upsert,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "CREATE"),
            ChangeAction::Delete => write!(f, "DELETE"),
            ChangeAction::Upsert => write!(f, "UPSERT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    pub action: ChangeAction,
    pub record_set: RecordSet,
}

/// A batch of changes applied atomically by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub comment: Option<String>,
    pub changes: Vec<RecordChange>,
}

/// Provider acknowledgement of a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    pub id: String,
    /// `PENDING` until the change reaches every name server, then `INSYNC`
    pub status: String,
    pub submitted_at: Option<String>,
}

/// Read and write access to a hosted-zone DNS service
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    /// List every hosted zone visible to the caller
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ReaperError>;

    /// List record sets starting at the query position
    async fn list_record_sets(
        &self,
        zone_id: &str,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, ReaperError>;

    /// Submit a change batch. A rejected batch is an error.
    async fn change_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, ReaperError>;
}
