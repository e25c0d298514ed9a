//! Consumer-side directory cache
//!
//! Maintains the consumer's view of the provider catalog by applying
//! refresh, update, and status messages in arrival order. Application is
//! tolerant: a delta referencing an unknown service synthesizes a record
//! rather than failing, and a delete for an unknown service is ignored.
//! Both anomalies are counted and logged.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use types::StreamState;

use crate::messages::{DirectoryRefresh, DirectoryStatus, DirectoryUpdate};
use crate::service::{ServiceChange, ServiceEntry, ServiceRecord};

/// The consumer's materialized view of the service catalog.
///
/// Iteration order is ascending service id, so two caches holding the same
/// services compare and enumerate identically regardless of arrival order.
#[derive(Debug, Default)]
pub struct ServiceCache {
    services: BTreeMap<u32, ServiceRecord>,
    stale: bool,
    records_synthesized: u64,
    deletes_ignored: u64,
}

impl ServiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, service_id: u32) -> Option<&ServiceRecord> {
        self.services.get(&service_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &ServiceRecord)> {
        self.services.iter().map(|(id, record)| (*id, record))
    }

    /// Whether the directory stream is in a state where cached contents may
    /// no longer reflect the provider.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Updates applied for services the cache had never seen.
    pub fn records_synthesized(&self) -> u64 {
        self.records_synthesized
    }

    /// Deletes received for services the cache had never seen.
    pub fn deletes_ignored(&self) -> u64 {
        self.deletes_ignored
    }

    /// Apply a refresh.
    ///
    /// With `clear_cache` set the refresh is the new catalog: existing
    /// contents are discarded first. Without it the refresh's entries are
    /// applied like an update.
    pub fn apply_refresh(&mut self, refresh: &DirectoryRefresh) {
        if refresh.clear_cache {
            self.services.clear();
        }
        // In a replacement refresh a Delete entry is simply omitted from
        // the new catalog, not an anomaly worth counting.
        self.apply_entries(&refresh.services, !refresh.clear_cache);

        if refresh.state.is_open() {
            self.stale = false;
        }
        info!(
            services = self.services.len(),
            clear_cache = refresh.clear_cache,
            solicited = refresh.solicited,
            "applied directory refresh"
        );
    }

    /// Apply an update delta.
    pub fn apply_update(&mut self, update: &DirectoryUpdate) {
        self.apply_entries(&update.services, true);
        debug!(
            entries = update.services.len(),
            services = self.services.len(),
            "applied directory update"
        );
    }

    /// Apply a status message.
    ///
    /// A non-open stream state marks the cache stale without dropping
    /// contents; recovery arrives as a later refresh. `clear_cache` drops
    /// the contents outright.
    pub fn apply_status(&mut self, status: &DirectoryStatus) {
        if let Some(state) = &status.state {
            if state.stream_state != StreamState::Open {
                self.stale = true;
                warn!(
                    stream_state = ?state.stream_state,
                    text = %state.text,
                    "directory stream not open, cache marked stale"
                );
            }
        }
        if status.clear_cache {
            self.services.clear();
            info!("directory status cleared cache");
        }
    }

    fn apply_entries(&mut self, entries: &[ServiceEntry], count_missing_deletes: bool) {
        for entry in entries {
            match &entry.change {
                ServiceChange::Delete => {
                    if self.services.remove(&entry.service_id).is_none() && count_missing_deletes {
                        self.deletes_ignored += 1;
                        warn!(
                            service_id = entry.service_id,
                            "delete for unknown service ignored"
                        );
                    }
                }
                ServiceChange::Add(record) => {
                    // Re-adding a known id is treated as an update; the
                    // wire may legitimately re-add an id this cache had
                    // already evicted.
                    let dest = self.services.entry(entry.service_id).or_default();
                    record.merge_into(dest);
                }
                ServiceChange::Update(record) => {
                    if !self.services.contains_key(&entry.service_id) {
                        self.records_synthesized += 1;
                        warn!(
                            service_id = entry.service_id,
                            "update for unknown service, synthesizing record"
                        );
                    }
                    let dest = self.services.entry(entry.service_id).or_default();
                    record.merge_into(dest);
                }
            }
        }
    }
}
