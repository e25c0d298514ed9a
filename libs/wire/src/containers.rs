//! Container encoders and decoders
//!
//! Maps, filter lists, and element lists. Encoders back-patch entry counts
//! on `complete`, so callers add entries without pre-counting. Decoders
//! yield one entry at a time; payloads come back as independent
//! sub-decoders over exactly the payload bytes.

use crate::buffer::{Decoder, Encoder, SizeMark};
use crate::error::{DecodeError, EncodeError};

// ── Actions and keys ────────────────────────────────────────────────

/// Key type of a map container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyType {
    UInt = 1,
    Str = 2,
}

impl KeyType {
    fn from_wire(value: u8) -> Result<Self, DecodeError> {
        match value {
            1 => Ok(Self::UInt),
            2 => Ok(Self::Str),
            other => Err(DecodeError::UnknownCode {
                kind: "KeyType",
                value: other,
            }),
        }
    }
}

/// A decoded map key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapKey<'a> {
    UInt(u32),
    Str(&'a str),
}

impl MapKey<'_> {
    /// The unsigned-integer key, or a type error for string-keyed maps.
    pub fn as_uint(&self) -> Result<u32, DecodeError> {
        match self {
            MapKey::UInt(v) => Ok(*v),
            MapKey::Str(_) => Err(DecodeError::WrongElementType {
                expected: "uint key",
                actual: "string key",
            }),
        }
    }

    /// The string key, or a type error for integer-keyed maps.
    pub fn as_str(&self) -> Result<&str, DecodeError> {
        match self {
            MapKey::Str(v) => Ok(v),
            MapKey::UInt(_) => Err(DecodeError::WrongElementType {
                expected: "string key",
                actual: "uint key",
            }),
        }
    }
}

/// Action carried by a map entry. `Delete` entries have no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MapEntryAction {
    Add = 1,
    Update = 2,
    Delete = 3,
}

impl MapEntryAction {
    pub fn has_payload(self) -> bool {
        self != MapEntryAction::Delete
    }

    fn from_wire(value: u8) -> Result<Self, DecodeError> {
        match value {
            1 => Ok(Self::Add),
            2 => Ok(Self::Update),
            3 => Ok(Self::Delete),
            other => Err(DecodeError::UnknownCode {
                kind: "MapEntryAction",
                value: other,
            }),
        }
    }
}

/// Action carried by a filter entry. `Clear` entries have no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterEntryAction {
    Set = 1,
    Update = 2,
    Clear = 3,
}

impl FilterEntryAction {
    pub fn has_payload(self) -> bool {
        self != FilterEntryAction::Clear
    }

    fn from_wire(value: u8) -> Result<Self, DecodeError> {
        match value {
            1 => Ok(Self::Set),
            2 => Ok(Self::Update),
            3 => Ok(Self::Clear),
            other => Err(DecodeError::UnknownCode {
                kind: "FilterEntryAction",
                value: other,
            }),
        }
    }
}

// ── Map ─────────────────────────────────────────────────────────────

/// Three-phase map encoder: begin, entries, complete.
pub struct MapEncoder<'e, 'b> {
    enc: &'e mut Encoder<'b>,
    key_type: KeyType,
    count_mark: SizeMark,
    count: u16,
}

impl<'e, 'b> MapEncoder<'e, 'b> {
    pub fn begin(enc: &'e mut Encoder<'b>, key_type: KeyType) -> Result<Self, EncodeError> {
        enc.put_u8(key_type as u8)?;
        let count_mark = enc.mark_u16()?;
        Ok(Self {
            enc,
            key_type,
            count_mark,
            count: 0,
        })
    }

    fn put_key(&mut self, key: &MapKey<'_>) -> Result<(), EncodeError> {
        debug_assert!(matches!(
            (self.key_type, key),
            (KeyType::UInt, MapKey::UInt(_)) | (KeyType::Str, MapKey::Str(_))
        ));
        match key {
            MapKey::UInt(v) => self.enc.put_u32(*v),
            MapKey::Str(v) => self.enc.put_str(v),
        }
    }

    fn bump(&mut self) -> Result<(), EncodeError> {
        self.count = self.count.checked_add(1).ok_or(EncodeError::CountOverflow)?;
        Ok(())
    }

    /// Add an entry whose payload is written by `f` into the live encoder.
    pub fn entry_with<F>(
        &mut self,
        key: MapKey<'_>,
        action: MapEntryAction,
        f: F,
    ) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Encoder<'b>) -> Result<(), EncodeError>,
    {
        if !action.has_payload() {
            return Err(EncodeError::ActionPayloadMismatch { action: "Delete" });
        }
        self.enc.put_u8(action as u8)?;
        self.put_key(&key)?;
        let size = self.enc.mark_u16()?;
        f(self.enc)?;
        self.enc.finish_size(size)?;
        self.bump()
    }

    /// Add a payload-less entry (Delete).
    pub fn entry_no_payload(
        &mut self,
        key: MapKey<'_>,
        action: MapEntryAction,
    ) -> Result<(), EncodeError> {
        if action.has_payload() {
            return Err(EncodeError::ActionPayloadMismatch { action: "Add/Update" });
        }
        self.enc.put_u8(action as u8)?;
        self.put_key(&key)?;
        self.bump()
    }

    pub fn complete(self) -> Result<(), EncodeError> {
        self.enc.patch_u16(self.count_mark, self.count);
        Ok(())
    }
}

/// A decoded map entry. `payload` is `None` exactly when the action
/// suppresses it.
#[derive(Debug)]
pub struct MapEntry<'a> {
    pub key: MapKey<'a>,
    pub action: MapEntryAction,
    pub payload: Option<Decoder<'a>>,
}

/// Pull-style map decoder.
pub struct MapDecoder<'d, 'a> {
    dec: &'d mut Decoder<'a>,
    key_type: KeyType,
    remaining: u16,
}

impl<'d, 'a> MapDecoder<'d, 'a> {
    pub fn begin(dec: &'d mut Decoder<'a>) -> Result<Self, DecodeError> {
        let key_type = KeyType::from_wire(dec.get_u8()?)?;
        let remaining = dec.get_u16()?;
        Ok(Self {
            dec,
            key_type,
            remaining,
        })
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Declared number of entries not yet consumed.
    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    pub fn next_entry(&mut self) -> Result<Option<MapEntry<'a>>, DecodeError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let action = MapEntryAction::from_wire(self.dec.get_u8()?)?;
        let key = match self.key_type {
            KeyType::UInt => MapKey::UInt(self.dec.get_u32()?),
            KeyType::Str => MapKey::Str(self.dec.get_str()?),
        };
        let payload = if action.has_payload() {
            Some(self.dec.sub_decoder_prefixed()?)
        } else {
            None
        };
        Ok(Some(MapEntry {
            key,
            action,
            payload,
        }))
    }
}

// ── FilterList ──────────────────────────────────────────────────────

/// Three-phase filter-list encoder.
pub struct FilterListEncoder<'e, 'b> {
    enc: &'e mut Encoder<'b>,
    count_mark: SizeMark,
    count: u16,
}

impl<'e, 'b> FilterListEncoder<'e, 'b> {
    pub fn begin(enc: &'e mut Encoder<'b>) -> Result<Self, EncodeError> {
        let count_mark = enc.mark_u16()?;
        Ok(Self {
            enc,
            count_mark,
            count: 0,
        })
    }

    fn bump(&mut self) -> Result<(), EncodeError> {
        self.count = self.count.checked_add(1).ok_or(EncodeError::CountOverflow)?;
        Ok(())
    }

    /// Add an entry whose payload is written by `f` into the live encoder.
    pub fn entry_with<F>(
        &mut self,
        filter_id: u8,
        action: FilterEntryAction,
        f: F,
    ) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Encoder<'b>) -> Result<(), EncodeError>,
    {
        if !action.has_payload() {
            return Err(EncodeError::ActionPayloadMismatch { action: "Clear" });
        }
        self.enc.put_u8(filter_id)?;
        self.enc.put_u8(action as u8)?;
        let size = self.enc.mark_u16()?;
        f(self.enc)?;
        self.enc.finish_size(size)?;
        self.bump()
    }

    /// Add a payload-less entry (Clear).
    pub fn entry_clear(&mut self, filter_id: u8) -> Result<(), EncodeError> {
        self.enc.put_u8(filter_id)?;
        self.enc.put_u8(FilterEntryAction::Clear as u8)?;
        self.bump()
    }

    pub fn complete(self) -> Result<(), EncodeError> {
        self.enc.patch_u16(self.count_mark, self.count);
        Ok(())
    }
}

/// A decoded filter entry. The id is raw so callers can skip ids they do
/// not recognize.
#[derive(Debug)]
pub struct FilterEntry<'a> {
    pub filter_id: u8,
    pub action: FilterEntryAction,
    pub payload: Option<Decoder<'a>>,
}

/// Pull-style filter-list decoder.
pub struct FilterListDecoder<'d, 'a> {
    dec: &'d mut Decoder<'a>,
    remaining: u16,
}

impl<'d, 'a> FilterListDecoder<'d, 'a> {
    pub fn begin(dec: &'d mut Decoder<'a>) -> Result<Self, DecodeError> {
        let remaining = dec.get_u16()?;
        Ok(Self { dec, remaining })
    }

    pub fn next_entry(&mut self) -> Result<Option<FilterEntry<'a>>, DecodeError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let filter_id = self.dec.get_u8()?;
        let action = FilterEntryAction::from_wire(self.dec.get_u8()?)?;
        let payload = if action.has_payload() {
            Some(self.dec.sub_decoder_prefixed()?)
        } else {
            None
        };
        Ok(Some(FilterEntry {
            filter_id,
            action,
            payload,
        }))
    }
}

// ── ElementList ─────────────────────────────────────────────────────

/// Wire type of an element value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElemType {
    UInt = 1,
    Int = 2,
    Str = 3,
    Bytes = 4,
    Array = 5,
}

impl ElemType {
    fn from_wire(value: u8) -> Result<Self, DecodeError> {
        match value {
            1 => Ok(Self::UInt),
            2 => Ok(Self::Int),
            3 => Ok(Self::Str),
            4 => Ok(Self::Bytes),
            5 => Ok(Self::Array),
            other => Err(DecodeError::UnknownCode {
                kind: "ElemType",
                value: other,
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::UInt => "uint",
            Self::Int => "int",
            Self::Str => "string",
            Self::Bytes => "bytes",
            Self::Array => "array",
        }
    }
}

/// Three-phase element-list encoder.
pub struct ElementListEncoder<'e, 'b> {
    enc: &'e mut Encoder<'b>,
    count_mark: SizeMark,
    count: u16,
}

impl<'e, 'b> ElementListEncoder<'e, 'b> {
    pub fn begin(enc: &'e mut Encoder<'b>) -> Result<Self, EncodeError> {
        let count_mark = enc.mark_u16()?;
        Ok(Self {
            enc,
            count_mark,
            count: 0,
        })
    }

    fn header(&mut self, name_id: u16, ty: ElemType) -> Result<SizeMark, EncodeError> {
        self.enc.put_u16(name_id)?;
        self.enc.put_u8(ty as u8)?;
        self.enc.mark_u16()
    }

    fn finish(&mut self, size: SizeMark) -> Result<(), EncodeError> {
        self.enc.finish_size(size)?;
        self.count = self.count.checked_add(1).ok_or(EncodeError::CountOverflow)?;
        Ok(())
    }

    pub fn elem_uint(&mut self, name_id: u16, value: u64) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::UInt)?;
        self.enc.put_u64(value)?;
        self.finish(size)
    }

    pub fn elem_int(&mut self, name_id: u16, value: i64) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::Int)?;
        self.enc.put_i64(value)?;
        self.finish(size)
    }

    pub fn elem_str(&mut self, name_id: u16, value: &str) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::Str)?;
        self.enc.put_str(value)?;
        self.finish(size)
    }

    pub fn elem_bytes(&mut self, name_id: u16, value: &[u8]) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::Bytes)?;
        self.enc.put_bytes(value)?;
        self.finish(size)
    }

    fn array_header(&mut self, item_type: ElemType, count: usize) -> Result<(), EncodeError> {
        let count = u16::try_from(count).map_err(|_| EncodeError::CountOverflow)?;
        self.enc.put_u8(item_type as u8)?;
        self.enc.put_u16(count)?;
        Ok(())
    }

    pub fn elem_array_uint(&mut self, name_id: u16, values: &[u64]) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::Array)?;
        self.array_header(ElemType::UInt, values.len())?;
        for v in values {
            self.enc.put_u64(*v)?;
        }
        self.finish(size)
    }

    pub fn elem_array_str<S: AsRef<str>>(
        &mut self,
        name_id: u16,
        values: &[S],
    ) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::Array)?;
        self.array_header(ElemType::Str, values.len())?;
        for v in values {
            self.enc.put_str(v.as_ref())?;
        }
        self.finish(size)
    }

    pub fn elem_array_bytes<B: AsRef<[u8]>>(
        &mut self,
        name_id: u16,
        values: &[B],
    ) -> Result<(), EncodeError> {
        let size = self.header(name_id, ElemType::Array)?;
        self.array_header(ElemType::Bytes, values.len())?;
        for v in values {
            self.enc.put_bytes(v.as_ref())?;
        }
        self.finish(size)
    }

    pub fn complete(self) -> Result<(), EncodeError> {
        self.enc.patch_u16(self.count_mark, self.count);
        Ok(())
    }
}

/// An array value awaiting item extraction.
#[derive(Debug)]
pub struct ArrayValue<'a> {
    item_type: ElemType,
    count: u16,
    dec: Decoder<'a>,
}

impl<'a> ArrayValue<'a> {
    pub fn item_type(&self) -> ElemType {
        self.item_type
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn expect(&self, expected: ElemType) -> Result<(), DecodeError> {
        if self.item_type != expected {
            return Err(DecodeError::WrongElementType {
                expected: expected.label(),
                actual: self.item_type.label(),
            });
        }
        Ok(())
    }

    pub fn uints(mut self) -> Result<Vec<u64>, DecodeError> {
        self.expect(ElemType::UInt)?;
        let mut out = Vec::with_capacity(self.count as usize);
        for _ in 0..self.count {
            out.push(self.dec.get_u64()?);
        }
        Ok(out)
    }

    pub fn strings(mut self) -> Result<Vec<String>, DecodeError> {
        self.expect(ElemType::Str)?;
        let mut out = Vec::with_capacity(self.count as usize);
        for _ in 0..self.count {
            out.push(self.dec.get_str()?.to_string());
        }
        Ok(out)
    }

    pub fn byte_items(mut self) -> Result<Vec<Vec<u8>>, DecodeError> {
        self.expect(ElemType::Bytes)?;
        let mut out = Vec::with_capacity(self.count as usize);
        for _ in 0..self.count {
            out.push(self.dec.get_bytes()?.to_vec());
        }
        Ok(out)
    }
}

/// A decoded element value.
#[derive(Debug)]
pub enum ElemValue<'a> {
    UInt(u64),
    Int(i64),
    Str(&'a str),
    Bytes(&'a [u8]),
    Array(ArrayValue<'a>),
}

impl<'a> ElemValue<'a> {
    fn label(&self) -> &'static str {
        match self {
            Self::UInt(_) => "uint",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
        }
    }

    pub fn as_uint(&self) -> Result<u64, DecodeError> {
        match self {
            Self::UInt(v) => Ok(*v),
            other => Err(DecodeError::WrongElementType {
                expected: "uint",
                actual: other.label(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, DecodeError> {
        Ok(self.as_uint()? != 0)
    }

    pub fn as_str(&self) -> Result<&'a str, DecodeError> {
        match self {
            Self::Str(v) => Ok(v),
            other => Err(DecodeError::WrongElementType {
                expected: "string",
                actual: other.label(),
            }),
        }
    }

    pub fn as_bytes(&self) -> Result<&'a [u8], DecodeError> {
        match self {
            Self::Bytes(v) => Ok(v),
            other => Err(DecodeError::WrongElementType {
                expected: "bytes",
                actual: other.label(),
            }),
        }
    }

    pub fn into_array(self) -> Result<ArrayValue<'a>, DecodeError> {
        match self {
            Self::Array(v) => Ok(v),
            other => Err(DecodeError::WrongElementType {
                expected: "array",
                actual: other.label(),
            }),
        }
    }
}

/// A decoded element: fixed name id plus typed value.
#[derive(Debug)]
pub struct Element<'a> {
    pub name_id: u16,
    pub value: ElemValue<'a>,
}

/// Pull-style element-list decoder.
pub struct ElementListDecoder<'d, 'a> {
    dec: &'d mut Decoder<'a>,
    remaining: u16,
}

impl<'d, 'a> ElementListDecoder<'d, 'a> {
    pub fn begin(dec: &'d mut Decoder<'a>) -> Result<Self, DecodeError> {
        let remaining = dec.get_u16()?;
        Ok(Self { dec, remaining })
    }

    pub fn next_element(&mut self) -> Result<Option<Element<'a>>, DecodeError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let name_id = self.dec.get_u16()?;
        let ty = ElemType::from_wire(self.dec.get_u8()?)?;
        let mut value_dec = self.dec.sub_decoder_prefixed()?;
        let value = match ty {
            ElemType::UInt => ElemValue::UInt(value_dec.get_u64()?),
            ElemType::Int => ElemValue::Int(value_dec.get_i64()?),
            ElemType::Str => ElemValue::Str(value_dec.get_str()?),
            ElemType::Bytes => ElemValue::Bytes(value_dec.get_bytes()?),
            ElemType::Array => {
                let item_type = ElemType::from_wire(value_dec.get_u8()?)?;
                let count = value_dec.get_u16()?;
                ElemValue::Array(ArrayValue {
                    item_type,
                    count,
                    dec: value_dec,
                })
            }
        };
        Ok(Some(Element { name_id, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_round_trip() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut map = MapEncoder::begin(&mut enc, KeyType::UInt).unwrap();
        map.entry_with(MapKey::UInt(7), MapEntryAction::Add, |e| e.put_u64(99))
            .unwrap();
        map.entry_no_payload(MapKey::UInt(2), MapEntryAction::Delete)
            .unwrap();
        map.complete().unwrap();

        let mut dec = Decoder::new(&buf);
        let mut map = MapDecoder::begin(&mut dec).unwrap();
        assert_eq!(map.key_type(), KeyType::UInt);

        let first = map.next_entry().unwrap().unwrap();
        assert_eq!(first.key, MapKey::UInt(7));
        assert_eq!(first.action, MapEntryAction::Add);
        assert_eq!(first.payload.unwrap().get_u64().unwrap(), 99);

        let second = map.next_entry().unwrap().unwrap();
        assert_eq!(second.key, MapKey::UInt(2));
        assert_eq!(second.action, MapEntryAction::Delete);
        assert!(second.payload.is_none());

        assert!(map.next_entry().unwrap().is_none());
        assert!(dec.is_empty());
    }

    #[test]
    fn test_map_string_keys() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut map = MapEncoder::begin(&mut enc, KeyType::Str).unwrap();
        map.entry_with(MapKey::Str("uplink-a"), MapEntryAction::Add, |e| {
            e.put_u8(1)
        })
        .unwrap();
        map.complete().unwrap();

        let mut dec = Decoder::new(&buf);
        let mut map = MapDecoder::begin(&mut dec).unwrap();
        let entry = map.next_entry().unwrap().unwrap();
        assert_eq!(entry.key.as_str().unwrap(), "uplink-a");
    }

    #[test]
    fn test_map_delete_with_payload_rejected() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut map = MapEncoder::begin(&mut enc, KeyType::UInt).unwrap();
        let err = map
            .entry_with(MapKey::UInt(1), MapEntryAction::Delete, |e| e.put_u8(0))
            .unwrap_err();
        assert!(matches!(err, EncodeError::ActionPayloadMismatch { .. }));
    }

    #[test]
    fn test_filter_list_round_trip() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut fl = FilterListEncoder::begin(&mut enc).unwrap();
        fl.entry_with(2, FilterEntryAction::Set, |e| e.put_u32(5))
            .unwrap();
        fl.entry_clear(4).unwrap();
        fl.complete().unwrap();

        let mut dec = Decoder::new(&buf);
        let mut fl = FilterListDecoder::begin(&mut dec).unwrap();

        let first = fl.next_entry().unwrap().unwrap();
        assert_eq!(first.filter_id, 2);
        assert_eq!(first.action, FilterEntryAction::Set);
        assert_eq!(first.payload.unwrap().get_u32().unwrap(), 5);

        let second = fl.next_entry().unwrap().unwrap();
        assert_eq!(second.filter_id, 4);
        assert_eq!(second.action, FilterEntryAction::Clear);
        assert!(second.payload.is_none());

        assert!(fl.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_element_list_round_trip() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut el = ElementListEncoder::begin(&mut enc).unwrap();
        el.elem_uint(1, 42).unwrap();
        el.elem_str(2, "vendor").unwrap();
        el.elem_bytes(3, &[0xca, 0xfe]).unwrap();
        el.elem_array_uint(4, &[6, 7, 8]).unwrap();
        el.elem_array_str(5, &["a", "b"]).unwrap();
        el.complete().unwrap();

        let mut dec = Decoder::new(&buf);
        let mut el = ElementListDecoder::begin(&mut dec).unwrap();

        let e = el.next_element().unwrap().unwrap();
        assert_eq!(e.name_id, 1);
        assert_eq!(e.value.as_uint().unwrap(), 42);

        let e = el.next_element().unwrap().unwrap();
        assert_eq!(e.value.as_str().unwrap(), "vendor");

        let e = el.next_element().unwrap().unwrap();
        assert_eq!(e.value.as_bytes().unwrap(), &[0xca, 0xfe]);

        let e = el.next_element().unwrap().unwrap();
        assert_eq!(e.value.into_array().unwrap().uints().unwrap(), vec![6, 7, 8]);

        let e = el.next_element().unwrap().unwrap();
        assert_eq!(
            e.value.into_array().unwrap().strings().unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );

        assert!(el.next_element().unwrap().is_none());
    }

    #[test]
    fn test_unknown_element_skippable_by_reader() {
        // A reader that does not recognize a name id can simply ignore the
        // element; the decoder always consumes the full value segment.
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut el = ElementListEncoder::begin(&mut enc).unwrap();
        el.elem_bytes(999, &[1, 2, 3, 4]).unwrap();
        el.elem_uint(1, 5).unwrap();
        el.complete().unwrap();

        let mut dec = Decoder::new(&buf);
        let mut el = ElementListDecoder::begin(&mut dec).unwrap();
        let _skipped = el.next_element().unwrap().unwrap();
        let kept = el.next_element().unwrap().unwrap();
        assert_eq!(kept.name_id, 1);
        assert_eq!(kept.value.as_uint().unwrap(), 5);
    }

    #[test]
    fn test_array_type_mismatch() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut el = ElementListEncoder::begin(&mut enc).unwrap();
        el.elem_array_uint(1, &[1]).unwrap();
        el.complete().unwrap();

        let mut dec = Decoder::new(&buf);
        let mut el = ElementListDecoder::begin(&mut dec).unwrap();
        let e = el.next_element().unwrap().unwrap();
        let err = e.value.into_array().unwrap().strings().unwrap_err();
        assert!(matches!(err, DecodeError::WrongElementType { .. }));
    }

    #[test]
    fn test_truncated_map_fails_cleanly() {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        let mut map = MapEncoder::begin(&mut enc, KeyType::UInt).unwrap();
        map.entry_with(MapKey::UInt(1), MapEntryAction::Add, |e| e.put_u64(1))
            .unwrap();
        map.complete().unwrap();

        // Drop the last byte of the payload.
        buf.truncate(buf.len() - 1);
        let mut dec = Decoder::new(&buf);
        let mut map = MapDecoder::begin(&mut dec).unwrap();
        assert!(map.next_entry().is_err());
    }
}
