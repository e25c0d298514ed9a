//! Source Directory Service
//!
//! The source directory domain of the market-data platform: providers
//! advertise a catalog of services, consumers subscribe to it and hold a
//! synchronized local copy.
//!
//! - Message types for the six directory message shapes
//! - Wire codec over the shared container grammar
//! - Consumer-side cache applying refreshes, deltas, and status changes
//! - Provider-side catalog answering requests with scoped refreshes
//!
//! # Architecture
//!
//! ```text
//!  Provider                              Consumer
//! ┌─────────────────┐                  ┌──────────────┐
//! │ ProviderCatalog │                  │ ServiceCache │
//! └───────┬─────────┘                  └──────▲───────┘
//!         │ refresh_for()                     │ apply_*()
//!   ┌─────▼──────┐      bytes          ┌──────┴───────┐
//!   │   encode   ├─────────────────────▶    decode    │
//!   └────────────┘                     └──────────────┘
//! ```
//!
//! Request and consumer-status messages travel the same path in the other
//! direction.

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod messages;
pub mod service;

pub use cache::ServiceCache;
pub use catalog::ProviderCatalog;
pub use codec::{CodecError, DOMAIN_SOURCE_DIRECTORY};
pub use messages::{
    ConsumerStatusChange, ConsumerStatusService, DirectoryClose, DirectoryConsumerStatus,
    DirectoryMessage, DirectoryRefresh, DirectoryRequest, DirectoryStatus, DirectoryUpdate,
};
pub use service::{
    AddressPort, GroupStatus, LinkSet, McastChannel, SeqMcastInfo, ServiceChange, ServiceData,
    ServiceEntry, ServiceInfo, ServiceLink, ServiceLoad, ServiceRecord, ServiceState,
};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
