//! Record codec for the write-ahead log.
//!
//! ## Wire format
//!
//! ```text
//! [length: ASCII decimal][action: 1 byte][key bytes]['|'][value bytes]
//! ```
//!
//! `length` counts the action tag, the key, the separator and the value, so
//! it always equals `key.len() + value.len() + 2`. Records are concatenated
//! with no delimiter between them.
//!
//! The key is read up to the separator, the value is read by count. Values
//! may therefore contain `|`; keys may not.

use std::fmt;

use thiserror::Error;

/// Byte that terminates the key field of an encoded record.
pub const SEPARATOR: u8 = b'|';

/// Bytes in a record's `length` that are not key or value: the action tag
/// and the separator.
const FRAMING_BYTES: usize = 2;

/// The mutation a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Put,
    /// Never written by the engine; reads do not touch the log.
    Get,
    Delete,
}

impl Action {
    /// Single-byte tag used on the wire.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Action::Put => b'p',
            Action::Get => b'g',
            Action::Delete => b'd',
        }
    }

    /// Parses a wire tag, returning `None` for anything unknown.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'p' => Some(Action::Put),
            b'g' => Some(Action::Get),
            b'd' => Some(Action::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag() as char)
    }
}

/// A key passed to [`Record::new`] that cannot be logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidKey {
    #[error("key contains the separator byte '|' at index {index}")]
    Separator { index: usize },

    /// Keys end up as JSON strings in SSTable generations, so they must be
    /// text.
    #[error("key is not valid UTF-8 after byte {valid_up_to}")]
    NotUtf8 { valid_up_to: usize },
}

/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    length: usize,
    key: Vec<u8>,
    value: Vec<u8>,
    action: Action,
}

impl Record {
    /// Builds a record, computing its `length` from the key and value.
    ///
    /// Values may hold any bytes. Keys must be UTF-8 without the separator.
    pub fn new(action: Action, key: Vec<u8>, value: Vec<u8>) -> Result<Self, InvalidKey> {
        if let Some(index) = key.iter().position(|&b| b == SEPARATOR) {
            return Err(InvalidKey::Separator { index });
        }
        if let Err(e) = std::str::from_utf8(&key) {
            return Err(InvalidKey::NotUtf8 {
                valid_up_to: e.valid_up_to(),
            });
        }
        Ok(Self {
            length: key.len() + value.len() + FRAMING_BYTES,
            key,
            value,
            action,
        })
    }

    pub fn put(key: Vec<u8>, value: Vec<u8>) -> Result<Self, InvalidKey> {
        Self::new(Action::Put, key, value)
    }

    /// A delete record always has an empty value.
    pub fn delete(key: Vec<u8>) -> Result<Self, InvalidKey> {
        Self::new(Action::Delete, key, Vec::new())
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Splits the record into `(action, key, value)`.
    #[must_use]
    pub fn into_parts(self) -> (Action, Vec<u8>, Vec<u8>) {
        (self.action, self.key, self.value)
    }

    /// Appends the encoded form of this record to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.length.to_string().as_bytes());
        buf.push(self.action.tag());
        buf.extend_from_slice(&self.key);
        buf.push(SEPARATOR);
        buf.extend_from_slice(&self.value);
    }

    /// Returns the encoded form of this record.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length + 20);
        self.encode_into(&mut buf);
        buf
    }
}

/// Malformed log content. Every variant carries the byte offset at which
/// decoding stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected a length digit at offset {offset}")]
    ExpectedDigit { offset: usize },

    #[error("record length overflows at offset {offset}")]
    LengthOverflow { offset: usize },

    #[error("record at offset {offset} ends before its action tag")]
    MissingAction { offset: usize },

    #[error("unknown action tag {tag:#04x} at offset {offset}")]
    UnknownAction { tag: u8, offset: usize },

    #[error("key starting at offset {offset} has no separator")]
    MissingSeparator { offset: usize },

    #[error("record length {length} is too small for a {key_len}-byte key at offset {offset}")]
    LengthTooSmall {
        length: usize,
        key_len: usize,
        offset: usize,
    },

    #[error("value at offset {offset} needs {expected} bytes, only {available} remain")]
    TruncatedValue {
        offset: usize,
        expected: usize,
        available: usize,
    },
}

/// Field the decoder expects next.
#[derive(Debug, Clone, Copy)]
enum State {
    Length,
    Action {
        start: usize,
        length: usize,
    },
    Key {
        start: usize,
        length: usize,
        action: Action,
    },
    Value {
        length: usize,
        action: Action,
        key_start: usize,
        key_end: usize,
    },
}

/// Decodes a buffer holding zero or more concatenated records.
///
/// Either every record decodes or an error is returned; partial results are
/// never handed back.
pub fn decode(data: &[u8]) -> Result<Vec<Record>, DecodeError> {
    let mut records = Vec::new();
    let mut pos = 0usize;
    let mut state = State::Length;

    loop {
        state = match state {
            State::Length => {
                if pos == data.len() {
                    return Ok(records);
                }
                let start = pos;
                let mut length = 0usize;
                while pos < data.len() && data[pos].is_ascii_digit() {
                    length = length
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(usize::from(data[pos] - b'0')))
                        .ok_or(DecodeError::LengthOverflow { offset: pos })?;
                    pos += 1;
                }
                if pos == start {
                    return Err(DecodeError::ExpectedDigit { offset: pos });
                }
                State::Action { start, length }
            }
            State::Action { start, length } => {
                let tag = *data
                    .get(pos)
                    .ok_or(DecodeError::MissingAction { offset: pos })?;
                let action =
                    Action::from_tag(tag).ok_or(DecodeError::UnknownAction { tag, offset: pos })?;
                pos += 1;
                State::Key {
                    start,
                    length,
                    action,
                }
            }
            State::Key {
                start,
                length,
                action,
            } => {
                let key_len = data[pos..]
                    .iter()
                    .position(|&b| b == SEPARATOR)
                    .ok_or(DecodeError::MissingSeparator { offset: pos })?;
                if length < key_len + FRAMING_BYTES {
                    return Err(DecodeError::LengthTooSmall {
                        length,
                        key_len,
                        offset: start,
                    });
                }
                let key_start = pos;
                let key_end = pos + key_len;
                pos = key_end + 1;
                State::Value {
                    length,
                    action,
                    key_start,
                    key_end,
                }
            }
            State::Value {
                length,
                action,
                key_start,
                key_end,
            } => {
                let key = &data[key_start..key_end];
                let value_len = length - key.len() - FRAMING_BYTES;
                let available = data.len() - pos;
                if value_len > available {
                    return Err(DecodeError::TruncatedValue {
                        offset: pos,
                        expected: value_len,
                        available,
                    });
                }
                let value = data[pos..pos + value_len].to_vec();
                pos += value_len;
                records.push(Record {
                    length,
                    key: key.to_vec(),
                    value,
                    action,
                });
                State::Length
            }
        };
    }
}
