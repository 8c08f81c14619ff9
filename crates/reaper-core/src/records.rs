//! Zone resolution, address record lookup and record deletion

use tracing::{debug, info};

use crate::errors::ReaperError;
use crate::logger::ConsoleLogger;
use crate::zones::{
    ChangeAction, ChangeBatch, ChangeInfo, RecordChange, RecordSet, RecordSetQuery, RecordType,
    ZoneDirectory,
};

const CHANGE_COMMENT: &str = "Stale record removed by dns-reaper";

/// Map a zone suffix to the provider's bare hosted zone id.
///
/// Zones whose name starts with the suffix are candidates. A single
/// candidate wins outright; among several, the one whose name is exactly
/// the suffix wins. Anything else is ambiguous and refused.
pub async fn resolve_zone_id(
    directory: &dyn ZoneDirectory,
    suffix: &str,
    logger: &ConsoleLogger,
) -> Result<String, ReaperError> {
    logger.verbose(format!("Retrieving hostedZone for {}", suffix));

    let zones = directory.list_hosted_zones().await?;
    logger.debug_dump("ListHostedZones", &zones);

    let suffix = suffix.trim_end_matches('.').to_lowercase();
    let mut candidates = Vec::new();
    for zone in &zones {
        logger.verbose(format!("Zonename = {}", zone.name));
        if zone.name.to_lowercase().starts_with(&suffix) {
            candidates.push(zone);
        }
    }

    match candidates.as_slice() {
        [] => Err(ReaperError::ZoneNotFound(suffix)),
        [only] => Ok(only.bare_id().to_string()),
        many => {
            let exact: Vec<_> = many
                .iter()
                .filter(|zone| zone.name.trim_end_matches('.').eq_ignore_ascii_case(&suffix))
                .collect();
            match exact.as_slice() {
                [zone] => {
                    debug!(
                        "{} zones start with {}, using exact match {}",
                        many.len(),
                        suffix,
                        zone.id
                    );
                    Ok(zone.bare_id().to_string())
                }
                _ => Err(ReaperError::AmbiguousZone {
                    suffix,
                    zone_ids: many.iter().map(|zone| zone.bare_id().to_string()).collect(),
                }),
            }
        }
    }
}

/// Fetch the address record named exactly `fqdn`, if any.
///
/// Asks for the first A record at or after `fqdn`; a different name at that
/// position means the record does not exist. Alias records carry no values
/// and count as absent. Read-only, safe to repeat.
pub async fn lookup_address_record(
    directory: &dyn ZoneDirectory,
    zone_id: &str,
    fqdn: &str,
    logger: &ConsoleLogger,
) -> Result<Option<RecordSet>, ReaperError> {
    logger.verbose(format!(
        "Retrieving IP from DNS record {} in zone {}",
        fqdn, zone_id
    ));

    let query = RecordSetQuery {
        start_name: fqdn.to_string(),
        start_type: RecordType::A,
        max_items: 1,
    };
    let record_sets = directory.list_record_sets(zone_id, &query).await?;
    logger.debug_dump("ListResourceRecordSets", &record_sets);

    let Some(first) = record_sets.into_iter().next() else {
        return Ok(None);
    };

    if !first.name.eq_ignore_ascii_case(fqdn) || first.record_type != RecordType::A {
        debug!(
            "First record at {} is {} {}, not a match",
            fqdn, first.name, first.record_type
        );
        return Ok(None);
    }

    if first.is_alias() {
        logger.verbose(format!("{} is an alias record, nothing to delete", fqdn));
        return Ok(None);
    }

    Ok(Some(first))
}

/// Submit a DELETE change for exactly this record.
///
/// The provider refuses the change unless name, type, TTL and values match
/// the live record; that refusal comes back as an error.
pub async fn delete_address_record(
    directory: &dyn ZoneDirectory,
    zone_id: &str,
    record: &RecordSet,
    ttl: u32,
    logger: &ConsoleLogger,
) -> Result<ChangeInfo, ReaperError> {
    logger.verbose(format!("deleting record {}", record.name));

    let batch = ChangeBatch {
        comment: Some(CHANGE_COMMENT.to_string()),
        changes: vec![RecordChange {
            action: ChangeAction::Delete,
            record_set: RecordSet {
                name: record.name.clone(),
                record_type: RecordType::A,
                ttl: Some(ttl),
                values: record.values.clone(),
            },
        }],
    };

    let change = directory.change_record_sets(zone_id, &batch).await?;
    logger.debug_dump("ChangeResourceRecordSets", &change);
    info!(
        "Submitted delete of {} in zone {} as change {} ({})",
        record.name, zone_id, change.id, change.status
    );

    Ok(change)
}
