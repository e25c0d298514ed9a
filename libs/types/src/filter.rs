//! Filter group identifiers and masks
//!
//! A service record is presented on the wire as up to seven independently
//! optional attribute groups, each addressed by a small fixed filter id.
//! Consumers request groups with a bitmask; providers encode one filter
//! entry per present group.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// The seven attribute groups of a service record.
///
/// Ids are fixed by the protocol and never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterId {
    Info = 1,
    State = 2,
    Group = 3,
    Load = 4,
    Data = 5,
    Link = 6,
    SeqMcast = 7,
}

impl FilterId {
    /// All known filter ids, in catalog order.
    pub const ALL: [FilterId; 7] = [
        FilterId::Info,
        FilterId::State,
        FilterId::Group,
        FilterId::Load,
        FilterId::Data,
        FilterId::Link,
        FilterId::SeqMcast,
    ];

    /// Look up a filter id from its wire value. Returns `None` for ids
    /// outside the known set (callers decide whether to skip or reject).
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Info),
            2 => Some(Self::State),
            3 => Some(Self::Group),
            4 => Some(Self::Load),
            5 => Some(Self::Data),
            6 => Some(Self::Link),
            7 => Some(Self::SeqMcast),
            _ => None,
        }
    }

    /// The mask bit for this group: `1 << (id - 1)`.
    pub fn bit(self) -> u32 {
        1 << ((self as u8) - 1)
    }
}

/// A bitmask of requested or present filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMask(u32);

impl FilterMask {
    pub const NONE: FilterMask = FilterMask(0);
    pub const INFO: FilterMask = FilterMask(1 << 0);
    pub const STATE: FilterMask = FilterMask(1 << 1);
    pub const GROUP: FilterMask = FilterMask(1 << 2);
    pub const LOAD: FilterMask = FilterMask(1 << 3);
    pub const DATA: FilterMask = FilterMask(1 << 4);
    pub const LINK: FilterMask = FilterMask(1 << 5);
    pub const SEQ_MCAST: FilterMask = FilterMask(1 << 6);

    /// Every known group.
    pub const ALL: FilterMask = FilterMask(0x7f);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, id: FilterId) -> bool {
        self.0 & id.bit() != 0
    }

    pub fn insert(&mut self, id: FilterId) {
        self.0 |= id.bit();
    }

    pub fn remove(&mut self, id: FilterId) {
        self.0 &= !id.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the known groups set in this mask, in catalog order.
    pub fn iter(self) -> impl Iterator<Item = FilterId> {
        FilterId::ALL.into_iter().filter(move |id| self.contains(*id))
    }
}

impl From<FilterId> for FilterMask {
    fn from(id: FilterId) -> Self {
        FilterMask(id.bit())
    }
}

impl BitOr for FilterMask {
    type Output = FilterMask;

    fn bitor(self, rhs: FilterMask) -> FilterMask {
        FilterMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for FilterMask {
    fn bitor_assign(&mut self, rhs: FilterMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for FilterMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}
