//! Compute inventory trait and the instance safety gate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ReaperError;

/// Tag key holding the instance host name
pub const NAME_TAG: &str = "Name";

/// Lifecycle state of a compute instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown(String),
}

impl InstanceState {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            other => InstanceState::Unknown(other.to_string()),
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, InstanceState::Terminated)
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceState::Pending => write!(f, "pending"),
            InstanceState::Running => write!(f, "running"),
            InstanceState::ShuttingDown => write!(f, "shutting-down"),
            InstanceState::Terminated => write!(f, "terminated"),
            InstanceState::Stopping => write!(f, "stopping"),
            InstanceState::Stopped => write!(f, "stopped"),
            InstanceState::Unknown(other) => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub state: InstanceState,
}

/// Read access to the compute instance inventory
#[async_trait]
pub trait InstanceInventory: Send + Sync {
    /// Every instance whose tag `key` equals `value`, in any state
    async fn find_instances_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<InstanceSummary>, ReaperError>;
}

/// Outcome of the safety gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// No live instance carries the name; the record may go
    Clear,
    /// A live instance still carries the name
    Blocked(InstanceSummary),
}

/// Decide whether the record may be touched.
///
/// Terminated instances never block. Any other state blocks, and the first
/// such instance is reported.
pub fn evaluate_gate(instances: &[InstanceSummary]) -> GateDecision {
    instances
        .iter()
        .find(|instance| !instance.state.is_terminated())
        .cloned()
        .map(GateDecision::Blocked)
        .unwrap_or(GateDecision::Clear)
}
