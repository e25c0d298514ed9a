//! Primitive encoder and decoder cursors
//!
//! `Encoder` appends big-endian primitives to a caller-owned `Vec<u8>`,
//! optionally bounded by a byte limit so encode failures surface before
//! transmission. `Decoder` is a cheap cursor over a borrowed slice;
//! sub-decoders share the underlying buffer without copying.
//!
//! Decode state lives entirely in stack-local cursors; nothing is retained
//! between calls.

use crate::error::{DecodeError, EncodeError};

/// Position of a reserved u16 that will be back-patched later.
#[derive(Debug, Clone, Copy)]
pub struct SizeMark(usize);

/// Appends primitives to a growable output buffer.
pub struct Encoder<'a> {
    buf: &'a mut Vec<u8>,
    limit: usize,
}

impl<'a> Encoder<'a> {
    /// An encoder with no byte limit beyond the u16 framing limits.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self {
            buf,
            limit: usize::MAX,
        }
    }

    /// An encoder that fails with `BufferFull` once `limit` bytes are used.
    pub fn with_limit(buf: &'a mut Vec<u8>, limit: usize) -> Self {
        Self { buf, limit }
    }

    fn ensure(&self, additional: usize) -> Result<(), EncodeError> {
        if self.buf.len() + additional > self.limit {
            return Err(EncodeError::BufferFull { limit: self.limit });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) -> Result<(), EncodeError> {
        self.ensure(1)?;
        self.buf.push(v);
        Ok(())
    }

    pub fn put_u16(&mut self, v: u16) -> Result<(), EncodeError> {
        self.ensure(2)?;
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    pub fn put_u32(&mut self, v: u32) -> Result<(), EncodeError> {
        self.ensure(4)?;
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    pub fn put_u64(&mut self, v: u64) -> Result<(), EncodeError> {
        self.ensure(8)?;
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    pub fn put_i32(&mut self, v: i32) -> Result<(), EncodeError> {
        self.ensure(4)?;
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    pub fn put_i64(&mut self, v: i64) -> Result<(), EncodeError> {
        self.ensure(8)?;
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    /// Write a u16-length-prefixed byte buffer.
    pub fn put_bytes(&mut self, v: &[u8]) -> Result<(), EncodeError> {
        if v.len() > u16::MAX as usize {
            return Err(EncodeError::TooLong { len: v.len() });
        }
        self.ensure(2 + v.len())?;
        self.buf.extend_from_slice(&(v.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(v);
        Ok(())
    }

    /// Write a u16-length-prefixed UTF-8 string.
    pub fn put_str(&mut self, v: &str) -> Result<(), EncodeError> {
        self.put_bytes(v.as_bytes())
    }

    /// Reserve a u16 to be back-patched via `patch_u16` or `finish_size`.
    pub fn mark_u16(&mut self) -> Result<SizeMark, EncodeError> {
        self.ensure(2)?;
        let mark = SizeMark(self.buf.len());
        self.buf.extend_from_slice(&[0, 0]);
        Ok(mark)
    }

    /// Patch a reserved u16 with an explicit value (entry counts).
    pub fn patch_u16(&mut self, mark: SizeMark, value: u16) {
        self.buf[mark.0..mark.0 + 2].copy_from_slice(&value.to_be_bytes());
    }

    /// Patch a reserved u16 with the number of bytes written since the
    /// reservation (payload sizes).
    pub fn finish_size(&mut self, mark: SizeMark) -> Result<(), EncodeError> {
        let written = self.buf.len() - (mark.0 + 2);
        if written > u16::MAX as usize {
            return Err(EncodeError::TooLong { len: written });
        }
        self.patch_u16(mark, written as u16);
        Ok(())
    }
}

/// A cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_u64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn get_i32(&mut self) -> Result<i32, DecodeError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_i64(&mut self) -> Result<i64, DecodeError> {
        let b = self.take(8)?;
        Ok(i64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a u16-length-prefixed byte buffer, borrowing from the input.
    pub fn get_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.get_u16()? as usize;
        if len > self.remaining() {
            return Err(DecodeError::BadLength {
                declared: len,
                remaining: self.remaining(),
            });
        }
        self.take(len)
    }

    /// Read a u16-length-prefixed UTF-8 string, borrowing from the input.
    pub fn get_str(&mut self) -> Result<&'a str, DecodeError> {
        let bytes = self.get_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Split off an independent sub-decoder over the next `len` bytes and
    /// advance past them.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder<'a>, DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::BadLength {
                declared: len,
                remaining: self.remaining(),
            });
        }
        let slice = self.take(len)?;
        Ok(Decoder::new(slice))
    }

    /// Split off a sub-decoder over a u16-length-prefixed segment.
    pub fn sub_decoder_prefixed(&mut self) -> Result<Decoder<'a>, DecodeError> {
        let len = self.get_u16()? as usize;
        self.sub_decoder(len)
    }
}
