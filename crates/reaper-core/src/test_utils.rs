//! In-memory stand-ins for the DNS and compute services

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::ReaperError;
use crate::instances::{InstanceInventory, InstanceState, InstanceSummary};
use crate::zones::{
    ChangeAction, ChangeBatch, ChangeInfo, HostedZone, RecordSet, RecordSetQuery, RecordType,
    ZoneDirectory,
};

pub fn zone(id: &str, name: &str) -> HostedZone {
    HostedZone {
        id: id.to_string(),
        name: name.to_string(),
        private_zone: true,
    }
}

pub fn a_record(name: &str, value: &str) -> RecordSet {
    RecordSet {
        name: name.to_string(),
        record_type: RecordType::A,
        ttl: Some(300),
        values: vec![value.to_string()],
    }
}

pub fn multi_value_record(name: &str, values: &[&str]) -> RecordSet {
    RecordSet {
        values: values.iter().map(|v| v.to_string()).collect(),
        ..a_record(name, "")
    }
}

pub fn instance(id: &str, state: &str) -> InstanceSummary {
    InstanceSummary {
        instance_id: id.to_string(),
        state: InstanceState::parse(state),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    ListZones,
    ListRecords {
        zone_id: String,
        query: RecordSetQuery,
    },
    Change {
        zone_id: String,
        batch: ChangeBatch,
    },
}

/// Zone directory backed by a vector of `(zone_id, record)` pairs.
///
/// Listing emulates a positional query over records sorted by name.
/// Deletes must match name, type and values exactly, like the real service.
pub struct FakeZoneDirectory {
    zones: Vec<HostedZone>,
    records: RwLock<Vec<(String, RecordSet)>>,
    calls: RwLock<Vec<DirectoryCall>>,
    apply_changes: bool,
    reject_reason: Option<String>,
}

impl FakeZoneDirectory {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        Self {
            zones,
            records: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            apply_changes: true,
            reject_reason: None,
        }
    }

    pub fn with_record(mut self, zone_id: &str, record: RecordSet) -> Self {
        self.records.get_mut().push((zone_id.to_string(), record));
        self
    }

    /// Accept deletes without removing anything
    pub fn ignoring_changes(mut self) -> Self {
        self.apply_changes = false;
        self
    }

    /// Refuse every change batch with `reason`
    pub fn rejecting_changes(mut self, reason: &str) -> Self {
        self.reject_reason = Some(reason.to_string());
        self
    }

    pub async fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.read().await.clone()
    }

    pub async fn delete_calls(&self) -> Vec<DirectoryCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| matches!(call, DirectoryCall::Change { .. }))
            .cloned()
            .collect()
    }

    pub async fn lookup_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| matches!(call, DirectoryCall::ListRecords { .. }))
            .count()
    }

    pub async fn zone_listing_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| matches!(call, DirectoryCall::ListZones))
            .count()
    }

    pub async fn records_in(&self, zone_id: &str) -> Vec<RecordSet> {
        self.records
            .read()
            .await
            .iter()
            .filter(|(zone, _)| zone == zone_id)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl ZoneDirectory for FakeZoneDirectory {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ReaperError> {
        self.calls.write().await.push(DirectoryCall::ListZones);
        Ok(self.zones.clone())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, ReaperError> {
        self.calls.write().await.push(DirectoryCall::ListRecords {
            zone_id: zone_id.to_string(),
            query: query.clone(),
        });

        let records = self.records.read().await;
        let mut in_zone: Vec<&RecordSet> = records
            .iter()
            .filter(|(zone, _)| zone == zone_id)
            .map(|(_, record)| record)
            .collect();
        in_zone.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(in_zone
            .into_iter()
            .filter(|record| record.name >= query.start_name)
            .take(query.max_items as usize)
            .cloned()
            .collect())
    }

    async fn change_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, ReaperError> {
        self.calls.write().await.push(DirectoryCall::Change {
            zone_id: zone_id.to_string(),
            batch: batch.clone(),
        });

        let first_name = batch
            .changes
            .first()
            .map(|change| change.record_set.name.clone())
            .unwrap_or_default();

        if let Some(reason) = &self.reject_reason {
            return Err(ReaperError::DeleteRejected {
                fqdn: first_name,
                reason: reason.clone(),
            });
        }

        let mut records = self.records.write().await;
        for change in &batch.changes {
            if change.action != ChangeAction::Delete {
                continue;
            }
            let wanted = &change.record_set;
            let position = records.iter().position(|(zone, record)| {
                zone == zone_id
                    && record.name == wanted.name
                    && record.record_type == wanted.record_type
                    && record.values == wanted.values
            });
            match position {
                Some(index) if self.apply_changes => {
                    records.remove(index);
                }
                Some(_) => {}
                None => {
                    return Err(ReaperError::DeleteRejected {
                        fqdn: wanted.name.clone(),
                        reason: "record set not found or values differ".to_string(),
                    })
                }
            }
        }

        Ok(ChangeInfo {
            id: "/change/C0000000000001".to_string(),
            status: "PENDING".to_string(),
            submitted_at: None,
        })
    }
}

/// Instance inventory with a fixed answer
pub struct FakeInventory {
    instances: Vec<InstanceSummary>,
    calls: RwLock<Vec<(String, String)>>,
}

impl FakeInventory {
    pub fn new(instances: Vec<InstanceSummary>) -> Self {
        Self {
            instances,
            calls: RwLock::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl InstanceInventory for FakeInventory {
    async fn find_instances_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<InstanceSummary>, ReaperError> {
        self.calls
            .write()
            .await
            .push((key.to_string(), value.to_string()));
        Ok(self.instances.clone())
    }
}
