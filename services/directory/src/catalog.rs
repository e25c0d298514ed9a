//! Provider-side catalog
//!
//! The authoritative set of services a provider advertises, plus the
//! machinery to answer a consumer request with a refresh scoped and
//! filtered the way the request asked.

use std::collections::BTreeMap;

use tracing::debug;

use types::Status;

use crate::messages::{DirectoryRefresh, DirectoryRequest};
use crate::service::{ServiceEntry, ServiceRecord};

/// The services a provider currently advertises, keyed by service id.
#[derive(Debug, Default)]
pub struct ProviderCatalog {
    services: BTreeMap<u32, ServiceRecord>,
}

impl ProviderCatalog {
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

    /// Insert or replace a service record.
    pub fn upsert(&mut self, service_id: u32, record: ServiceRecord) {
        debug!(service_id, "catalog upsert");
        self.services.insert(service_id, record);
    }

    /// Withdraw a service. Returns the record if it was advertised.
    pub fn remove(&mut self, service_id: u32) -> Option<ServiceRecord> {
        debug!(service_id, "catalog remove");
        self.services.remove(&service_id)
    }

    /// Build the solicited refresh answering `request`.
    ///
    /// The refresh carries every advertised service in the request's scope,
    /// each restricted to the requested attribute groups, as `Add` entries.
    /// `clear_cache` is always set: a refresh is the full catalog for its
    /// scope, and whatever the consumer held before is superseded.
    pub fn refresh_for(&self, request: &DirectoryRequest) -> DirectoryRefresh {
        let services: Vec<ServiceEntry> = self
            .services
            .iter()
            .filter(|(id, _)| request.service_id.map_or(true, |want| want == **id))
            .map(|(id, record)| ServiceEntry::add(*id, record.restricted_to(request.filter)))
            .collect();

        debug!(
            stream_id = request.stream_id,
            services = services.len(),
            filter = request.filter.bits(),
            "built directory refresh"
        );
        DirectoryRefresh {
            stream_id: request.stream_id,
            filter: request.filter,
            state: Status::open_ok(),
            solicited: true,
            clear_cache: true,
            sequence_number: None,
            service_id: request.service_id,
            services,
        }
    }
}
