//! Directory message types
//!
//! The six message shapes of the source directory domain, gathered in one
//! closed sum type. Each variant owns its fields outright, so a decoded
//! message never aliases the decode buffer and `Clone` is a full deep
//! copy.

use serde::{Deserialize, Serialize};
use types::{FilterMask, SourceMirroringMode, Status};

use crate::service::ServiceEntry;

/// Consumer request for source directory information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRequest {
    pub stream_id: i32,
    /// Attribute groups the consumer wants.
    pub filter: FilterMask,
    /// Whether updates are desired after the initial refresh.
    pub streaming: bool,
    /// Scope to one service; absent means all services.
    pub service_id: Option<u32>,
}

impl DirectoryRequest {
    /// A streaming request for the groups consumers typically need.
    pub fn streaming_defaults(stream_id: i32) -> Self {
        Self {
            stream_id,
            filter: FilterMask::INFO | FilterMask::STATE | FilterMask::GROUP,
            streaming: true,
            service_id: None,
        }
    }
}

/// Provider snapshot of the catalog for the requested scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRefresh {
    pub stream_id: i32,
    /// Groups that may appear on this stream.
    pub filter: FilterMask,
    /// State of the directory stream itself.
    pub state: Status,
    /// Whether this refresh answers a request, versus being pushed.
    pub solicited: bool,
    /// Whether the consumer must discard cached services before applying.
    pub clear_cache: bool,
    pub sequence_number: Option<u32>,
    /// Scope of this stream; absent means all services.
    pub service_id: Option<u32>,
    pub services: Vec<ServiceEntry>,
}

/// Provider delta: only changed records and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUpdate {
    pub stream_id: i32,
    pub filter: Option<FilterMask>,
    pub service_id: Option<u32>,
    pub sequence_number: Option<u32>,
    pub services: Vec<ServiceEntry>,
}

/// Provider notice of a change to the directory stream itself. Carries no
/// service records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStatus {
    pub stream_id: i32,
    pub filter: Option<FilterMask>,
    pub service_id: Option<u32>,
    pub state: Option<Status>,
    pub clear_cache: bool,
}

/// Close of the directory stream, from either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryClose {
    pub stream_id: i32,
}

/// How a consumer-status message changes one service's mirroring entry.
/// `Delete` carries no mode, matching the payload-less wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumerStatusChange {
    Add(SourceMirroringMode),
    Update(SourceMirroringMode),
    Delete,
}

impl ConsumerStatusChange {
    pub fn mode(&self) -> Option<SourceMirroringMode> {
        match self {
            ConsumerStatusChange::Add(mode) | ConsumerStatusChange::Update(mode) => Some(*mode),
            ConsumerStatusChange::Delete => None,
        }
    }
}

/// Per-service mirroring intent reported by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStatusService {
    pub service_id: u32,
    pub change: ConsumerStatusChange,
}

/// Consumer report of per-service source-mirroring intent.
///
/// Carried on the login stream rather than the directory stream, but keyed
/// by the same service ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConsumerStatus {
    pub stream_id: i32,
    pub services: Vec<ConsumerStatusService>,
}

/// Any message of the source directory domain.
///
/// A closed sum type: there is no shared mutable "current type" state, and
/// field access is an exhaustive match checked at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryMessage {
    Request(DirectoryRequest),
    Refresh(DirectoryRefresh),
    Update(DirectoryUpdate),
    Status(DirectoryStatus),
    Close(DirectoryClose),
    ConsumerStatus(DirectoryConsumerStatus),
}

impl DirectoryMessage {
    /// The stream this message belongs to.
    pub fn stream_id(&self) -> i32 {
        match self {
            DirectoryMessage::Request(m) => m.stream_id,
            DirectoryMessage::Refresh(m) => m.stream_id,
            DirectoryMessage::Update(m) => m.stream_id,
            DirectoryMessage::Status(m) => m.stream_id,
            DirectoryMessage::Close(m) => m.stream_id,
            DirectoryMessage::ConsumerStatus(m) => m.stream_id,
        }
    }

    /// A short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectoryMessage::Request(_) => "request",
            DirectoryMessage::Refresh(_) => "refresh",
            DirectoryMessage::Update(_) => "update",
            DirectoryMessage::Status(_) => "status",
            DirectoryMessage::Close(_) => "close",
            DirectoryMessage::ConsumerStatus(_) => "consumer-status",
        }
    }
}
