//! Source-mirroring modes
//!
//! A consumer reports, per service, whether it treats that service as its
//! active source or as a warm standby. Providers use this to coordinate
//! failover between mirrored sources.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source mirroring mode: {0}")]
pub struct UnknownMirroringMode(pub u64);

/// How a consumer intends to use a service with regard to mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SourceMirroringMode {
    /// The consumer consumes this service actively and has no standby.
    ActiveNoStandby = 0,
    /// The consumer consumes this service actively and keeps a standby.
    ActiveWithStandby = 1,
    /// The consumer holds this service as a warm standby only.
    Standby = 2,
}

impl SourceMirroringMode {
    pub fn from_wire(value: u64) -> Result<Self, UnknownMirroringMode> {
        match value {
            0 => Ok(Self::ActiveNoStandby),
            1 => Ok(Self::ActiveWithStandby),
            2 => Ok(Self::Standby),
            other => Err(UnknownMirroringMode(other)),
        }
    }
}

impl Default for SourceMirroringMode {
    fn default() -> Self {
        Self::ActiveNoStandby
    }
}
