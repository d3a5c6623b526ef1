//! KLV (Key-Length-Value) frame codec.
//!
//! ```text
//! +----------------------+---------------------+--------------------+
//! | key (4 bytes)        | length (u32)        | value              |
//! | ASCII, zero-padded   | big-endian          | `length` raw bytes |
//! +----------------------+---------------------+--------------------+
//! ```
//!
//! There is no magic number, version or terminator: parsing relies entirely
//! on the length field. The codec is payload-agnostic and performs no I/O.

use std::{borrow::Cow, fmt};

use thiserror::Error;

/// Width of the key field in bytes.
pub const KEY_LEN: usize = 4;

/// Width of the length field in bytes.
pub const LENGTH_LEN: usize = 4;

/// Fixed header size: key + length.
pub const HEADER_LEN: usize = KEY_LEN + LENGTH_LEN;

/// Codec errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Key is not ASCII, longer than 4 bytes, or contains a NUL byte
    #[error("invalid key '{0}': expected at most 4 ASCII characters without NUL")]
    InvalidKey(String),

    /// Fewer than 8 bytes available for the header
    #[error("truncated header: need 8 bytes, {available} available")]
    TruncatedHeader { available: usize },

    /// Declared value length exceeds the bytes that follow the header
    #[error("truncated value: header declares {declared} bytes, {available} available")]
    TruncatedValue { declared: usize, available: usize },

    /// Value does not fit the 4-byte length field
    #[error("value of {0} bytes does not fit a 4-byte length field")]
    ValueTooLong(usize),

    /// Bytes left over after the last complete nested frame (strict mode only)
    #[error("{0} trailing bytes after the last nested frame")]
    TrailingBytes(usize),
}

/// One complete KLV unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub key: String,
    pub value: Vec<u8>,
}

impl Frame {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Value interpreted as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    /// Size of this frame on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.value.len()
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        encode(&self.key, &self.value)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.key, self.value.len(), self.text())
    }
}

/// A decoded composite frame: the outer key and the frames carried in its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedFrame {
    pub key: String,
    pub items: Vec<Frame>,
}

/// How [`decode_nested`] treats bytes that do not form a complete inner frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NestedMode {
    /// Stop at the first malformed fragment and drop the remainder.
    #[default]
    Lenient,
    /// Fail with [`FrameError::TrailingBytes`] if anything is left over.
    Strict,
}

/// Encode `key` and `value` into a single frame.
///
/// The key is left-justified into 4 bytes and zero-filled; the value length
/// follows as a big-endian u32, then the value verbatim.
pub fn encode(key: &str, value: &[u8]) -> Result<Vec<u8>, FrameError> {
    let key_field = encode_key(key)?;
    let length = u32::try_from(value.len()).map_err(|_| FrameError::ValueTooLong(value.len()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + value.len());
    out.extend_from_slice(&key_field);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(value);
    Ok(out)
}

/// Decode one frame starting at `offset`.
///
/// Returns the frame and the number of bytes consumed (`8 + length`), so that
/// concatenated frames can be parsed sequentially.
pub fn decode(bytes: &[u8], offset: usize) -> Result<(Frame, usize), FrameError> {
    let available = bytes.len().saturating_sub(offset);
    if available < HEADER_LEN {
        return Err(FrameError::TruncatedHeader { available });
    }

    let header = &bytes[offset..offset + HEADER_LEN];
    let key = decode_key(&header[..KEY_LEN]);
    let declared = decode_length(&header[KEY_LEN..]);

    let remaining = available - HEADER_LEN;
    if declared > remaining {
        return Err(FrameError::TruncatedValue {
            declared,
            available: remaining,
        });
    }

    let start = offset + HEADER_LEN;
    let value = bytes[start..start + declared].to_vec();
    Ok((Frame { key, value }, HEADER_LEN + declared))
}

/// Encode `items` back to back and wrap the concatenation as the value of an
/// outer frame keyed by `key`.
pub fn encode_nested(key: &str, items: &[Frame]) -> Result<Vec<u8>, FrameError> {
    let mut inner = Vec::with_capacity(items.iter().map(Frame::wire_len).sum());
    for item in items {
        inner.extend_from_slice(&item.encode()?);
    }
    encode(key, &inner)
}

/// Decode an outer frame and the frames nested in its value.
pub fn decode_nested(bytes: &[u8], mode: NestedMode) -> Result<NestedFrame, FrameError> {
    let (outer, _) = decode(bytes, 0)?;
    let inner = outer.value.as_slice();

    let mut items = Vec::new();
    let mut offset = 0;
    while inner.len() - offset >= HEADER_LEN {
        match decode(inner, offset) {
            Ok((frame, consumed)) => {
                items.push(frame);
                offset += consumed;
            }
            Err(_) => break,
        }
    }

    let leftover = inner.len() - offset;
    if mode == NestedMode::Strict && leftover > 0 {
        return Err(FrameError::TrailingBytes(leftover));
    }
    if leftover > 0 {
        tracing::debug!(
            "Dropped {} malformed trailing bytes in nested frame '{}'",
            leftover,
            outer.key
        );
    }

    Ok(NestedFrame {
        key: outer.key,
        items,
    })
}

/// Space-separated lowercase hex pairs, e.g. `"4d 53 47 00"`.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn encode_key(key: &str) -> Result<[u8; KEY_LEN], FrameError> {
    if key.len() > KEY_LEN || !key.is_ascii() || key.contains('\0') {
        return Err(FrameError::InvalidKey(key.to_string()));
    }
    let mut field = [0u8; KEY_LEN];
    field[..key.len()].copy_from_slice(key.as_bytes());
    Ok(field)
}

fn decode_key(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn decode_length(field: &[u8]) -> usize {
    let mut raw = [0u8; LENGTH_LEN];
    raw.copy_from_slice(field);
    u32::from_be_bytes(raw) as usize
}
