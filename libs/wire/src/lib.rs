//! Binary container codec
//!
//! The generic encode/decode layer underneath the directory message codec.
//! Three container shapes are supported:
//!
//! - **Map**: a keyed collection. Entries are keyed by an unsigned integer
//!   or a string, carry an action code, and (unless the action suppresses
//!   it) an embedded length-prefixed sub-container.
//! - **FilterList**: a filtered attribute-group collection. Entries are
//!   identified by a small integer filter id, carry an action code, and an
//!   embedded payload unless the action is Clear.
//! - **ElementList**: a tagged field list of name-id → typed-value pairs.
//!
//! Encoders follow an init/entries/complete protocol: `begin` reserves the
//! header, entries are written through the live encoder, and `complete`
//! back-patches entry counts. Entry payload sizes are back-patched through
//! reserved u16 marks, so callers never pre-compute sizes.
//!
//! Decoders are pull-style iterators; each entry exposes its payload as an
//! independent sub-decoder positioned over exactly the payload bytes.
//!
//! All integers are big-endian. Strings and byte buffers carry a u16
//! length prefix.

pub mod buffer;
pub mod containers;
pub mod error;

pub use buffer::{Decoder, Encoder, SizeMark};
pub use containers::{
    ArrayValue, ElemType, ElemValue, Element, ElementListDecoder, ElementListEncoder,
    FilterEntry, FilterEntryAction, FilterListDecoder, FilterListEncoder, KeyType, MapDecoder,
    MapEncoder, MapEntry, MapEntryAction, MapKey,
};
pub use error::{DecodeError, EncodeError};
