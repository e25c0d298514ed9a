//! Stream and data state types
//!
//! A `Status` describes the condition of a stream or of the items a service
//! provides: whether the stream remains open, whether its data is usable,
//! an optional diagnostic code, and free-form text.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raised when a wire discriminant does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} discriminant: {value}")]
pub struct UnknownDiscriminant {
    pub kind: &'static str,
    pub value: u8,
}

/// State of the stream carrying the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StreamState {
    /// Stream is open; updates will follow.
    Open = 1,
    /// Stream delivers a final snapshot and then closes.
    NonStreaming = 2,
    /// Stream is closed but may be re-requested.
    ClosedRecover = 3,
    /// Stream is closed permanently.
    Closed = 4,
    /// Stream has been redirected to another provider.
    Redirected = 5,
}

impl StreamState {
    pub fn from_wire(value: u8) -> Result<Self, UnknownDiscriminant> {
        match value {
            1 => Ok(Self::Open),
            2 => Ok(Self::NonStreaming),
            3 => Ok(Self::ClosedRecover),
            4 => Ok(Self::Closed),
            5 => Ok(Self::Redirected),
            other => Err(UnknownDiscriminant {
                kind: "StreamState",
                value: other,
            }),
        }
    }
}

/// State of the data flowing on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataState {
    /// No change from the previous data state.
    NoChange = 0,
    /// Data is current and valid.
    Ok = 1,
    /// Data may be stale or otherwise unreliable.
    Suspect = 2,
}

impl DataState {
    pub fn from_wire(value: u8) -> Result<Self, UnknownDiscriminant> {
        match value {
            0 => Ok(Self::NoChange),
            1 => Ok(Self::Ok),
            2 => Ok(Self::Suspect),
            other => Err(UnknownDiscriminant {
                kind: "DataState",
                value: other,
            }),
        }
    }
}

/// Diagnostic code qualifying a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatusCode {
    None = 0,
    NotFound = 1,
    Timeout = 2,
    NotAuthorized = 3,
    InvalidArgument = 4,
    UsageError = 5,
    TooManyItems = 6,
    NoResources = 7,
}

impl StatusCode {
    pub fn from_wire(value: u8) -> Result<Self, UnknownDiscriminant> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::NotFound),
            2 => Ok(Self::Timeout),
            3 => Ok(Self::NotAuthorized),
            4 => Ok(Self::InvalidArgument),
            5 => Ok(Self::UsageError),
            6 => Ok(Self::TooManyItems),
            7 => Ok(Self::NoResources),
            other => Err(UnknownDiscriminant {
                kind: "StatusCode",
                value: other,
            }),
        }
    }
}

/// A full status: stream state, data state, code, and descriptive text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub stream_state: StreamState,
    pub data_state: DataState,
    pub code: StatusCode,
    pub text: String,
}

impl Status {
    /// An open / OK status with no code or text.
    pub fn open_ok() -> Self {
        Self {
            stream_state: StreamState::Open,
            data_state: DataState::Ok,
            code: StatusCode::None,
            text: String::new(),
        }
    }

    /// A closed-recoverable / suspect status with the given text.
    pub fn closed_recover(text: impl Into<String>) -> Self {
        Self {
            stream_state: StreamState::ClosedRecover,
            data_state: DataState::Suspect,
            code: StatusCode::None,
            text: text.into(),
        }
    }

    /// Whether the stream this status describes remains open.
    pub fn is_open(&self) -> bool {
        self.stream_state == StreamState::Open
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::open_ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?} ({:?})",
            self.stream_state, self.data_state, self.code
        )?;
        if !self.text.is_empty() {
            write!(f, ": {}", self.text)?;
        }
        Ok(())
    }
}
