//! # Framepack
//!
//! Tagged, sequential byte primitives for frame headers.
//!
//! ## Philosophy
//!
//! - **Sequential**: A reader pulls fields in the order they were written. There
//!   are no containers and no random access.
//! - **Self-describing**: Every field carries a one byte tag, so a reader that
//!   expects the wrong field fails instead of misreading.
//! - **Open-ended**: Whatever follows the last field is left untouched and can be
//!   taken as-is with `Decoder::rest`.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//!
//! All integers are Little-Endian.


/// Framepack serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte does not correspond to the `Tag` the reader asked for.
    InvalidTag(u8),
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// Blob length exceeds `u32::MAX`.
    BlobTooLarge(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTag(b) => write!(f, "Invalid Tag byte: {:#04x}", b),
            Error::InvalidUtf8 => write!(f, "String is not valid UTF-8"),
            Error::UnexpectedEnd => write!(f, "Unexpected end of buffer"),
            Error::BlobTooLarge(len) => write!(f, "Blob of {} bytes exceeds u32::MAX", len),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for Framepack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    U8 = 0x03,
    U32 = 0x05,
    String = 0x10,
}

impl Tag {
    /// Returns the Tag variant for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x03 => Some(Tag::U8),
            0x05 => Some(Tag::U32),
            0x10 => Some(Tag::String),
            _ => None,
        }
    }
}

/// An append-only field writer.
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Creates a new encoder with default capacity.
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(64) }
    }

    /// Creates an encoder sized for a header followed by `extra` trailing bytes.
    pub fn with_capacity(extra: usize) -> Self {
        Self { buf: Vec::with_capacity(64 + extra) }
    }

    /// Consumes the encoder and returns the final byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a view of the current buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| Error::BlobTooLarge(len))?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    /// Encodes an unsigned 8-bit integer.
    pub fn u8(&mut self, v: u8) {
        self.buf.push(Tag::U8 as u8);
        self.buf.push(v);
    }

    /// Encodes an unsigned 32-bit integer (LE).
    pub fn u32(&mut self, v: u32) {
        self.buf.push(Tag::U32 as u8);
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Encodes a UTF-8 string blob.
    pub fn str(&mut self, v: &str) -> Result<()> {
        self.buf.push(Tag::String as u8);
        self.write_len(v.len())?;
        self.buf.extend_from_slice(v.as_bytes());
        Ok(())
    }

    /// Appends bytes verbatim, with no tag or length.
    ///
    /// Readers recover them through `Decoder::rest`, so this must be the last write.
    pub fn raw(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Reading advances the internal cursor. A failed read leaves the cursor where it was.
///
/// # Errors
/// All read operations return `Error::UnexpectedEnd` if the buffer is exhausted.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let b = *self.buf.first().ok_or(Error::UnexpectedEnd)?;
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    /// Splits `n` bytes off the front of `buf`, which is only committed by the caller.
    fn split(buf: &'a [u8], n: usize) -> Result<(&'a [u8], &'a [u8])> {
        if n > buf.len() { return Err(Error::UnexpectedEnd); }
        Ok(buf.split_at(n))
    }

    fn fixed<const N: usize>(&mut self, expected: Tag) -> Result<[u8; N]> {
        let tag = self.peek_tag()?;
        if tag != expected {
            return Err(Error::InvalidTag(tag as u8));
        }
        let (head, tail) = Self::split(&self.buf[1..], N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        self.buf = tail;
        Ok(out)
    }

    fn blob(&mut self) -> Result<&'a [u8]> {
        let tag = self.peek_tag()?;
        if tag != Tag::String {
            return Err(Error::InvalidTag(tag as u8));
        }
        let (len_bytes, body) = Self::split(&self.buf[1..], 4)?;
        let mut len = [0u8; 4];
        len.copy_from_slice(len_bytes);
        let (data, tail) = Self::split(body, u32::from_le_bytes(len) as usize)?;
        self.buf = tail;
        Ok(data)
    }

    /// Decodes u8.
    pub fn u8(&mut self) -> Result<u8> { Ok(self.fixed::<1>(Tag::U8)?[0]) }
    /// Decodes u32 (LE).
    pub fn u32(&mut self) -> Result<u32> { Ok(u32::from_le_bytes(self.fixed(Tag::U32)?)) }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        let mut ahead = self.clone();
        let bytes = ahead.blob()?;
        let s = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
        *self = ahead;
        Ok(s)
    }

    /// Takes every byte left in the view, leaving it empty.
    pub fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buf)
    }
}
