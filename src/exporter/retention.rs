// src/exporter/retention.rs
//! Bounded retention of stored profiles
//!
//! `plan` is a pure decision over a listing: keep the `keep_count` newest
//! profiles by capture time, evict the rest. `enforce` lists a source's
//! keys, plans, and deletes the victims one by one. A failed delete is
//! logged and skipped; the object is simply retried on the next pass.

use crate::error::Result;
use crate::keys;
use crate::store::ObjectStore;
use chrono::NaiveTime;
use tracing::{info, warn};

/// Outcome of planning retention for one source
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Keys that survive, newest first
    pub keep: Vec<String>,
    /// Keys to delete, newest first
    pub evict: Vec<String>,
}

/// Outcome of one retention pass against the store
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    /// Number of keys found under the source prefix
    pub listed: usize,
    /// Keys deleted successfully
    pub deleted: Vec<String>,
    /// Keys whose deletion failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Decide which of `listed` (all under `source_prefix`) to evict
///
/// Every key must carry a parseable timestamp; a single foreign or corrupt
/// key aborts the plan instead of guessing.
pub fn plan(source_prefix: &str, listed: &[String], keep_count: usize) -> Result<RetentionPlan> {
    let mut stamped: Vec<(NaiveTime, &String)> = listed
        .iter()
        .map(|key| keys::parse_timestamp(source_prefix, key).map(|time| (time, key)))
        .collect::<Result<_>>()?;

    // Newest first; key order breaks ties so the plan is deterministic
    stamped.sort_by(|a, b| b.cmp(a));

    let mut ordered: Vec<String> = stamped.into_iter().map(|(_, key)| key.clone()).collect();
    let evict = if ordered.len() > keep_count {
        ordered.split_off(keep_count)
    } else {
        Vec::new()
    };

    Ok(RetentionPlan {
        keep: ordered,
        evict,
    })
}

/// List `source_prefix` and delete everything beyond the newest `keep_count`
pub async fn enforce(
    store: &dyn ObjectStore,
    source_prefix: &str,
    keep_count: usize,
) -> Result<RetentionReport> {
    let listed = store.list(source_prefix).await?;
    let plan = plan(source_prefix, &listed, keep_count)?;

    let mut report = RetentionReport {
        listed: listed.len(),
        ..Default::default()
    };

    for key in plan.evict {
        info!("Deleting profile {} from {} store", key, store.name());
        match store.delete(&key).await {
            Ok(()) => report.deleted.push(key),
            Err(e) => {
                warn!("Failed to delete profile {}: {}", key, e);
                report.failed.push((key, e.to_string()));
            }
        }
    }

    Ok(report)
}
