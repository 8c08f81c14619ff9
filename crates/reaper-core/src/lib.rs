//! Core of the DNS reaper
//!
//! Removes the address record of a decommissioned host from a hosted zone,
//! but only after confirming no live compute instance still carries the
//! host name.
//!
//! # Flow
//!
//! 1. Query the instance inventory for instances tagged `Name=<short host>`
//! 2. Abort if any of them is not terminated
//! 3. Resolve the hosted zone id from the zone suffix
//! 4. Look up the A record; stop if it is absent
//! 5. Delete it (unless dry run) and read it back to confirm
//!
//! The two remote services sit behind the [`ZoneDirectory`] and
//! [`InstanceInventory`] traits; `reaper-aws` provides the Route 53 and EC2
//! implementations.
//!
//! ```ignore
//! let reaper = RecordReaper::new(directory, inventory, config, logger);
//! let target = reaper.target_for("web01")?;
//! match reaper.run(&target).await? {
//!     ReapOutcome::Deleted { fqdn, .. } => println!("removed {fqdn}"),
//!     other => println!("{other:?}"),
//! }
//! ```

pub mod config;
pub mod errors;
pub mod instances;
pub mod logger;
pub mod reaper;
pub mod records;
pub mod target;
pub mod zones;

#[cfg(test)]
pub mod test_utils;

pub use config::{LogSettings, ReaperConfig, DEFAULT_HOSTED_ZONE, DEFAULT_RECORD_TTL};
pub use errors::ReaperError;
pub use instances::{
    evaluate_gate, GateDecision, InstanceInventory, InstanceState, InstanceSummary, NAME_TAG,
};
pub use logger::{ConsoleLogger, MemorySink, Severity};
pub use reaper::{ReapOutcome, ReapPhase, RecordReaper};
pub use records::{delete_address_record, lookup_address_record, resolve_zone_id};
pub use target::TargetIdentity;
pub use zones::{
    ChangeAction, ChangeBatch, ChangeInfo, HostedZone, RecordChange, RecordSet, RecordSetQuery,
    RecordType, ZoneDirectory,
};
