//! Wire message encoding and decoding
//!
//! Decoding is fully bounds-checked: any byte sequence either yields a
//! message or a [`CodecError`], never a panic.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::constants::*;
use crate::error::CodecError;

/// Kind of a wire message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Client asks to receive state pushes (empty payload)
    Subscribe,
    /// Client replaces the shared state with the payload
    Update,
    /// Server acknowledges a request (payload `"ok"`)
    Ack,
    /// Periodic server push of the current state
    State,
    /// Any kind code this version does not assign
    Unknown(u8),
}

impl MessageKind {
    /// Map a kind code to a kind
    pub fn from_u8(code: u8) -> Self {
        match code {
            KIND_SUBSCRIBE => MessageKind::Subscribe,
            KIND_UPDATE => MessageKind::Update,
            KIND_ACK => MessageKind::Ack,
            KIND_STATE => MessageKind::State,
            other => MessageKind::Unknown(other),
        }
    }

    /// Whether this is `Unknown` with a code reserved for another kind
    pub fn is_misassigned(self) -> bool {
        match self {
            MessageKind::Unknown(code) => !matches!(Self::from_u8(code), MessageKind::Unknown(_)),
            _ => false,
        }
    }

    /// Wire code for this kind
    pub fn as_u8(self) -> u8 {
        match self {
            MessageKind::Subscribe => KIND_SUBSCRIBE,
            MessageKind::Update => KIND_UPDATE,
            MessageKind::Ack => KIND_ACK,
            MessageKind::State => KIND_STATE,
            MessageKind::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Subscribe => write!(f, "subscribe"),
            MessageKind::Update => write!(f, "update"),
            MessageKind::Ack => write!(f, "ack"),
            MessageKind::State => write!(f, "state"),
            MessageKind::Unknown(code) => write!(f, "unknown({:#04x})", code),
        }
    }
}

/// A single datagram's worth of protocol data
///
/// Built fresh for every send and never mutated afterwards. The payload is
/// a `Bytes`, so cloning a message only bumps a reference count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Seconds since the UNIX epoch at construction time
    pub timestamp: i64,
    /// Message kind
    pub kind: MessageKind,
    /// Opaque payload
    pub payload: Bytes,
}

impl WireMessage {
    /// Create a message with an explicit timestamp
    pub fn new(timestamp: i64, kind: MessageKind, payload: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            kind,
            payload: payload.into(),
        }
    }

    /// Subscribe request
    pub fn subscribe() -> Self {
        Self::new(unix_timestamp(), MessageKind::Subscribe, Bytes::new())
    }

    /// State update request
    pub fn update(payload: impl Into<Bytes>) -> Self {
        Self::new(unix_timestamp(), MessageKind::Update, payload)
    }

    /// Acknowledgement sent in reply to every decodable request
    pub fn ack() -> Self {
        Self::new(
            unix_timestamp(),
            MessageKind::Ack,
            Bytes::from_static(ACK_PAYLOAD),
        )
    }

    /// Periodic state push
    pub fn state(payload: impl Into<Bytes>) -> Self {
        Self::new(unix_timestamp(), MessageKind::State, payload)
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Encode into a datagram
    ///
    /// Fails when the payload would not fit in one receive buffer, or when
    /// an `Unknown` kind carries an assigned code (it would decode as a
    /// different kind).
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        if self.kind.is_misassigned() {
            return Err(CodecError::AssignedKindCode(self.kind.as_u8()));
        }
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(CodecError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u16(MAGIC);
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u8(self.kind.as_u8());
        buf.put_i64(self.timestamp);
        buf.put_u16(self.payload.len() as u16);
        buf.put_slice(&self.payload);

        Ok(buf.freeze())
    }

    /// Decode a datagram
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                needed: HEADER_LEN,
                available: data.len(),
            });
        }

        let mut buf = data;

        let magic = buf.get_u16();
        if magic != MAGIC {
            return Err(CodecError::BadMagic(magic));
        }

        let version = buf.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let kind = MessageKind::from_u8(buf.get_u8());
        let timestamp = buf.get_i64();
        let len = buf.get_u16() as usize;

        if len > MAX_PAYLOAD_SIZE {
            return Err(CodecError::PayloadTooLarge {
                size: len,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        if buf.remaining() < len {
            return Err(CodecError::Truncated {
                needed: HEADER_LEN + len,
                available: data.len(),
            });
        }
        if buf.remaining() > len {
            return Err(CodecError::TrailingBytes(buf.remaining() - len));
        }

        Ok(Self {
            timestamp,
            kind,
            payload: Bytes::copy_from_slice(&buf[..len]),
        })
    }
}

/// Current time as whole seconds since the UNIX epoch
///
/// A clock set before 1970 reads as 0.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
