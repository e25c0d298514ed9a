//! Core type definitions for the service directory domain
//!
//! Shared primitives consumed by the wire codec and the directory service:
//! stream/data states and statuses, quality-of-service descriptors, filter
//! group identifiers and masks, and source-mirroring modes.
//!
//! These types are wire-agnostic: the binary layout lives in the `wire`
//! and `directory` crates.

pub mod filter;
pub mod mirroring;
pub mod qos;
pub mod status;

pub use filter::{FilterId, FilterMask};
pub use mirroring::SourceMirroringMode;
pub use qos::{Qos, QosRate, QosTimeliness};
pub use status::{DataState, Status, StatusCode, StreamState};
