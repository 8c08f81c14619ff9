//! Record reaper orchestration
//!
//! One run walks a fixed sequence of phases:
//!
//! ```text
//! Start -> CheckingInstance -> Aborted
//!                           -> ResolvingZone -> LookingUpRecord -> NoOp
//!                                                               -> Deleting -> Verifying -> Success
//!                                                                                        -> Failure
//! ```
//!
//! Each phase depends on the result of the one before it, so nothing is
//! reordered or run in parallel.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::ReaperConfig;
use crate::errors::ReaperError;
use crate::instances::{evaluate_gate, GateDecision, InstanceInventory, InstanceState, NAME_TAG};
use crate::logger::ConsoleLogger;
use crate::records::{delete_address_record, lookup_address_record, resolve_zone_id};
use crate::target::TargetIdentity;
use crate::zones::{ChangeInfo, ZoneDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapPhase {
    Start,
    CheckingInstance,
    Aborted,
    ResolvingZone,
    LookingUpRecord,
    NoOp,
    Deleting,
    Verifying,
    Success,
    Failure,
}

impl std::fmt::Display for ReapPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReapPhase::Start => "start",
            ReapPhase::CheckingInstance => "checking-instance",
            ReapPhase::Aborted => "aborted",
            ReapPhase::ResolvingZone => "resolving-zone",
            ReapPhase::LookingUpRecord => "looking-up-record",
            ReapPhase::NoOp => "no-op",
            ReapPhase::Deleting => "deleting",
            ReapPhase::Verifying => "verifying",
            ReapPhase::Success => "success",
            ReapPhase::Failure => "failure",
        };
        write!(f, "{}", name)
    }
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReapOutcome {
    /// A live instance still carries the host name
    Aborted {
        instance_id: String,
        state: InstanceState,
    },
    /// Nothing to delete
    RecordAbsent { fqdn: String, zone_id: String },
    /// Dry run: the record would have been deleted
    DryRun {
        fqdn: String,
        zone_id: String,
        value: String,
    },
    /// Deleted and confirmed gone
    Deleted {
        fqdn: String,
        zone_id: String,
        value: String,
        change: ChangeInfo,
    },
}

impl ReapOutcome {
    pub fn final_phase(&self) -> ReapPhase {
        match self {
            ReapOutcome::Aborted { .. } => ReapPhase::Aborted,
            ReapOutcome::RecordAbsent { .. } | ReapOutcome::DryRun { .. } => ReapPhase::NoOp,
            ReapOutcome::Deleted { .. } => ReapPhase::Success,
        }
    }

    /// Every outcome is a clean exit; failures come back as errors instead
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Deletes one stale address record once its instance is gone
pub struct RecordReaper {
    directory: Arc<dyn ZoneDirectory>,
    inventory: Arc<dyn InstanceInventory>,
    config: ReaperConfig,
    logger: Arc<ConsoleLogger>,
}

impl RecordReaper {
    pub fn new(
        directory: Arc<dyn ZoneDirectory>,
        inventory: Arc<dyn InstanceInventory>,
        config: ReaperConfig,
        logger: Arc<ConsoleLogger>,
    ) -> Self {
        Self {
            directory,
            inventory,
            config,
            logger,
        }
    }

    pub fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Derive the target from `hostname` using the configured zone
    pub fn target_for(&self, hostname: &str) -> Result<TargetIdentity, ReaperError> {
        TargetIdentity::new(hostname, &self.config.hosted_zone)
    }

    pub async fn run(&self, target: &TargetIdentity) -> Result<ReapOutcome, ReaperError> {
        let logger = self.logger.as_ref();
        let directory = self.directory.as_ref();

        self.enter(ReapPhase::Start, target);
        logger.verbose(format!("hostedZoneDns = {}", target.zone_suffix()));
        logger.verbose(format!("shorthostname = {}", target.short_hostname()));
        logger.verbose(format!("fqdn = {}", target.fqdn()));

        self.enter(ReapPhase::CheckingInstance, target);
        logger.verbose(format!(
            "Retrieving data for ec2 instance {} = {}",
            NAME_TAG,
            target.short_hostname()
        ));
        let instances = self
            .inventory
            .find_instances_by_tag(NAME_TAG, target.short_hostname())
            .await?;
        logger.debug_dump("DescribeInstances", &instances);
        for instance in &instances {
            logger.verbose(format!("instanceId = {}", instance.instance_id));
            logger.verbose(format!("instanceState = {}", instance.state));
        }

        if let GateDecision::Blocked(instance) = evaluate_gate(&instances) {
            self.enter(ReapPhase::Aborted, target);
            logger.warn(format!(
                "Instance {} ({}) exists in state {}.  Aborting",
                target.short_hostname(),
                instance.instance_id,
                instance.state
            ));
            return Ok(ReapOutcome::Aborted {
                instance_id: instance.instance_id,
                state: instance.state,
            });
        }

        self.enter(ReapPhase::ResolvingZone, target);
        let zone_id = match &self.config.zone_id {
            Some(zone_id) => {
                logger.verbose(format!("Using hostedzoneId override {}", zone_id));
                zone_id.clone()
            }
            None => resolve_zone_id(directory, target.zone_suffix(), logger).await?,
        };
        logger.verbose(format!("hostedzoneId = {}", zone_id));

        self.enter(ReapPhase::LookingUpRecord, target);
        let record = lookup_address_record(directory, &zone_id, target.fqdn(), logger).await?;
        logger.verbose(format!(
            "ip = {}",
            record
                .as_ref()
                .map(|r| r.joined_values())
                .unwrap_or_else(|| "None".to_string())
        ));

        let Some(record) = record else {
            self.enter(ReapPhase::NoOp, target);
            logger.warn(format!(
                "DNS Record \"{}\" doesn't exist in ZoneId {}",
                target.fqdn(),
                zone_id
            ));
            return Ok(ReapOutcome::RecordAbsent {
                fqdn: target.fqdn().to_string(),
                zone_id,
            });
        };
        let value = record.joined_values();

        if self.config.dry_run {
            self.enter(ReapPhase::NoOp, target);
            logger.dry_run(format!(
                "Would delete DNS Record \"{}\" ({})",
                target.fqdn(),
                value
            ));
            return Ok(ReapOutcome::DryRun {
                fqdn: target.fqdn().to_string(),
                zone_id,
                value,
            });
        }

        self.enter(ReapPhase::Deleting, target);
        logger.info(format!("Deleting DNS Record \"{}\" ({})", target.fqdn(), value));
        let change = delete_address_record(
            directory,
            &zone_id,
            &record,
            self.config.record_ttl,
            logger,
        )
        .await?;

        // The change call can succeed before the record is really gone, so
        // read it back instead of trusting the response.
        self.enter(ReapPhase::Verifying, target);
        if lookup_address_record(directory, &zone_id, target.fqdn(), logger)
            .await?
            .is_some()
        {
            self.enter(ReapPhase::Failure, target);
            logger.error(format!("DNS Record \"{}\" still exists", target.fqdn()));
            return Err(ReaperError::VerificationFailed {
                fqdn: target.fqdn().to_string(),
                value,
            });
        }

        self.enter(ReapPhase::Success, target);
        logger.success(format!(
            "DNS Record \"{}\" has been deleted",
            target.fqdn()
        ));
        Ok(ReapOutcome::Deleted {
            fqdn: target.fqdn().to_string(),
            zone_id,
            value,
            change,
        })
    }

    fn enter(&self, phase: ReapPhase, target: &TargetIdentity) {
        debug!(fqdn = %target.fqdn(), phase = %phase, "reaper phase");
    }
}
