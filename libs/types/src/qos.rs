//! Quality-of-service descriptors
//!
//! Each service advertises the qualities of service it can provide:
//! how timely its data is and at what rate it conflates updates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a wire value does not name a known QoS component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownQos {
    pub kind: &'static str,
    pub value: u8,
}

/// How current the service's data is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum QosTimeliness {
    Realtime = 1,
    DelayedUnknown = 2,
    Delayed = 3,
}

impl QosTimeliness {
    pub fn from_wire(value: u8) -> Result<Self, UnknownQos> {
        match value {
            1 => Ok(Self::Realtime),
            2 => Ok(Self::DelayedUnknown),
            3 => Ok(Self::Delayed),
            other => Err(UnknownQos {
                kind: "QosTimeliness",
                value: other,
            }),
        }
    }
}

/// How the service conflates updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum QosRate {
    TickByTick = 1,
    JitConflated = 2,
    TimeConflated = 3,
}

impl QosRate {
    pub fn from_wire(value: u8) -> Result<Self, UnknownQos> {
        match value {
            1 => Ok(Self::TickByTick),
            2 => Ok(Self::JitConflated),
            3 => Ok(Self::TimeConflated),
            other => Err(UnknownQos {
                kind: "QosRate",
                value: other,
            }),
        }
    }
}

/// One quality of service a service can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qos {
    pub timeliness: QosTimeliness,
    pub rate: QosRate,
}

impl Qos {
    /// Realtime, tick-by-tick: the best quality a source can offer.
    pub fn realtime() -> Self {
        Self {
            timeliness: QosTimeliness::Realtime,
            rate: QosRate::TickByTick,
        }
    }
}

impl Default for Qos {
    fn default() -> Self {
        Self::realtime()
    }
}
