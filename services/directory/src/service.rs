//! Service record model
//!
//! The in-memory representation of one catalog entry: a service and its
//! seven independently optional attribute groups. Each group maps to one
//! fixed filter id on the wire; a group's presence in any given message is
//! independent of the others, and a receiver must never touch cached
//! values for groups a delta does not mention.
//!
//! Merge semantics (applying a sparse delta onto a cached snapshot) live
//! here as `ServiceRecord::merge_into`; the codec and cache layers stay
//! free of per-group knowledge.

use serde::{Deserialize, Serialize};
use types::{FilterId, FilterMask, Qos, Status};

/// Static descriptive information about a service: identity, capabilities,
/// dictionaries, and request-handling properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Name identifying the service.
    pub service_name: String,
    /// Name identifying the vendor of the service's data.
    pub vendor: Option<String>,
    /// Whether the service publishes directly or consolidates sources.
    pub is_source: Option<bool>,
    /// Capability domains the service supports.
    pub capabilities: Vec<u64>,
    /// Names of dictionaries this service provides.
    pub dictionaries_provided: Option<Vec<String>>,
    /// Names of dictionaries a consumer needs to decode this service.
    pub dictionaries_used: Option<Vec<String>>,
    /// Qualities of service this service can provide.
    pub qos: Vec<Qos>,
    /// Whether items may be requested with a QoS range.
    pub supports_qos_range: Option<bool>,
    /// Item name yielding a symbol list of everything this service offers.
    pub item_list: Option<String>,
    /// Whether snapshots can be requested once the open limit is reached.
    pub supports_out_of_band_snapshots: Option<bool>,
    /// Whether the service accepts consumer-status (mirroring) messages.
    pub accepting_consumer_status: Option<bool>,
}

impl ServiceInfo {
    /// A minimal info group with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}

/// Operating state of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    /// Numeric service state: nonzero = up.
    pub service_state: u64,
    /// Whether the service currently accepts item requests.
    pub accepting_requests: Option<bool>,
    /// Status applied to every item the service provides.
    pub status: Option<Status>,
}

impl ServiceState {
    pub fn up() -> Self {
        Self {
            service_state: 1,
            accepting_requests: Some(true),
            status: None,
        }
    }

    pub fn down() -> Self {
        Self {
            service_state: 0,
            accepting_requests: Some(false),
            status: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.service_state != 0
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::up()
    }
}

/// Load characteristics of a service. Each member is independently
/// optional on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceLoad {
    /// Maximum number of items a consumer may open from this service.
    pub open_limit: Option<u64>,
    /// Maximum number of outstanding (unrefreshed) item requests.
    pub open_window: Option<u64>,
    /// Current workload of the source providing the data.
    pub load_factor: Option<u64>,
}

/// Opaque typed payload applied to all items the service provides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceData {
    /// Discriminant describing the content of `data`.
    pub data_type: u64,
    /// The encoded payload itself.
    pub data: Vec<u8>,
}

/// One upstream source feeding this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLink {
    /// Name identifying the upstream source.
    pub name: String,
    /// Type of the source.
    pub link_type: Option<u64>,
    /// Nonzero = the source is up.
    pub link_state: u64,
    /// Code with additional detail about the source's condition.
    pub link_code: Option<u64>,
    /// Text further describing the link state.
    pub text: Option<String>,
}

impl ServiceLink {
    pub fn up(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_type: None,
            link_state: 1,
            link_code: None,
            text: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.link_state != 0
    }
}

/// The set of upstream links feeding a service, keyed by link name on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkSet {
    pub links: Vec<ServiceLink>,
}

/// Status for one item group within a service.
///
/// Group entries are append-only per message: successive deltas carry new
/// entries rather than replacing old ones by key, unlike every other
/// attribute group. This mirrors the wire protocol, which defines no merge
/// key for group entries, and makes repeated identical updates
/// intentionally non-idempotent for this group alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatus {
    /// Opaque item-group identifier this status concerns.
    pub group: Vec<u8>,
    /// Group the items now belong to, if they were merged away.
    pub merged_to_group: Option<Vec<u8>>,
    /// Status applied to all items in the group.
    pub status: Option<Status>,
}

/// A host/port pair for an auxiliary directory server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPort {
    pub address: String,
    pub port: u16,
}

/// A multicast channel: address, port, and the domain it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McastChannel {
    pub address: String,
    pub port: u16,
    pub domain: u8,
}

/// Sequencing/multicast metadata for a service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeqMcastInfo {
    pub snapshot_server: Option<AddressPort>,
    pub gap_recovery_server: Option<AddressPort>,
    pub ref_data_server: Option<AddressPort>,
    pub streaming_channels: Vec<McastChannel>,
    pub gap_channels: Vec<McastChannel>,
}

/// One catalog entry: up to seven optional attribute groups plus the set
/// of groups a delta explicitly clears.
///
/// A cached record always has `cleared` empty; only decoded deltas carry
/// clear bits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub info: Option<ServiceInfo>,
    pub state: Option<ServiceState>,
    pub load: Option<ServiceLoad>,
    pub data: Option<ServiceData>,
    pub link: Option<LinkSet>,
    pub groups: Vec<GroupStatus>,
    pub seq_mcast: Option<SeqMcastInfo>,
    /// Groups explicitly cleared by this delta (wire Clear action).
    pub cleared: FilterMask,
}

impl ServiceRecord {
    /// Mask of the groups currently present.
    pub fn present_mask(&self) -> FilterMask {
        let mut mask = FilterMask::NONE;
        if self.info.is_some() {
            mask.insert(FilterId::Info);
        }
        if self.state.is_some() {
            mask.insert(FilterId::State);
        }
        if !self.groups.is_empty() {
            mask.insert(FilterId::Group);
        }
        if self.load.is_some() {
            mask.insert(FilterId::Load);
        }
        if self.data.is_some() {
            mask.insert(FilterId::Data);
        }
        if self.link.is_some() {
            mask.insert(FilterId::Link);
        }
        if self.seq_mcast.is_some() {
            mask.insert(FilterId::SeqMcast);
        }
        mask
    }

    /// Whether the record carries no groups, no group statuses, and no
    /// clear bits.
    pub fn is_empty(&self) -> bool {
        self.present_mask().is_empty() && self.cleared.is_empty()
    }

    /// Apply this record as a delta onto `dest`.
    ///
    /// Present groups overwrite the corresponding group in `dest`; cleared
    /// groups are dropped from `dest`; absent groups are left untouched.
    /// Group statuses are appended (no merge key — see the `GroupStatus`
    /// docs). `dest` ends with an empty `cleared` mask.
    pub fn merge_into(&self, dest: &mut ServiceRecord) {
        if self.cleared.contains(FilterId::Info) {
            dest.info = None;
        } else if let Some(info) = &self.info {
            dest.info = Some(info.clone());
        }

        if self.cleared.contains(FilterId::State) {
            dest.state = None;
        } else if let Some(state) = &self.state {
            dest.state = Some(state.clone());
        }

        if self.cleared.contains(FilterId::Load) {
            dest.load = None;
        } else if let Some(load) = &self.load {
            dest.load = Some(*load);
        }

        if self.cleared.contains(FilterId::Data) {
            dest.data = None;
        } else if let Some(data) = &self.data {
            dest.data = Some(data.clone());
        }

        if self.cleared.contains(FilterId::Link) {
            dest.link = None;
        } else if let Some(link) = &self.link {
            dest.link = Some(link.clone());
        }

        if self.cleared.contains(FilterId::SeqMcast) {
            dest.seq_mcast = None;
        } else if let Some(seq_mcast) = &self.seq_mcast {
            dest.seq_mcast = Some(seq_mcast.clone());
        }

        if self.cleared.contains(FilterId::Group) {
            dest.groups.clear();
        }
        dest.groups.extend(self.groups.iter().cloned());

        dest.cleared = FilterMask::NONE;
    }

    /// A copy restricted to the groups named in `mask`. Group statuses are
    /// kept only when the Group filter is requested.
    pub fn restricted_to(&self, mask: FilterMask) -> ServiceRecord {
        ServiceRecord {
            info: if mask.contains(FilterId::Info) {
                self.info.clone()
            } else {
                None
            },
            state: if mask.contains(FilterId::State) {
                self.state.clone()
            } else {
                None
            },
            load: if mask.contains(FilterId::Load) {
                self.load
            } else {
                None
            },
            data: if mask.contains(FilterId::Data) {
                self.data.clone()
            } else {
                None
            },
            link: if mask.contains(FilterId::Link) {
                self.link.clone()
            } else {
                None
            },
            groups: if mask.contains(FilterId::Group) {
                self.groups.clone()
            } else {
                Vec::new()
            },
            seq_mcast: if mask.contains(FilterId::SeqMcast) {
                self.seq_mcast.clone()
            } else {
                None
            },
            cleared: FilterMask::NONE,
        }
    }
}

/// How a message changes one service: the action-gated payload made
/// explicit. `Delete` carries no record, so no payload can ever be read
/// or written for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceChange {
    Add(ServiceRecord),
    Update(ServiceRecord),
    Delete,
}

impl ServiceChange {
    pub fn record(&self) -> Option<&ServiceRecord> {
        match self {
            ServiceChange::Add(record) | ServiceChange::Update(record) => Some(record),
            ServiceChange::Delete => None,
        }
    }
}

/// One entry of a message's service list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub service_id: u32,
    pub change: ServiceChange,
}

impl ServiceEntry {
    pub fn add(service_id: u32, record: ServiceRecord) -> Self {
        Self {
            service_id,
            change: ServiceChange::Add(record),
        }
    }

    pub fn update(service_id: u32, record: ServiceRecord) -> Self {
        Self {
            service_id,
            change: ServiceChange::Update(record),
        }
    }

    pub fn delete(service_id: u32) -> Self {
        Self {
            service_id,
            change: ServiceChange::Delete,
        }
    }
}
