//! Wire protocol constants

/// Leading magic bytes ("SH")
pub const MAGIC: u16 = 0x5348;

/// Current protocol version
pub const PROTOCOL_VERSION: u8 = 1;

// Message kind codes
pub const KIND_SUBSCRIBE: u8 = 0x01;
pub const KIND_UPDATE: u8 = 0x02;
pub const KIND_ACK: u8 = 0x03;
pub const KIND_STATE: u8 = 0x04;

/// magic(2) + version(1) + kind(1) + timestamp(8) + length(2)
pub const HEADER_LEN: usize = 14;

/// Receive buffer size; longer datagrams are truncated by the transport
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Largest payload that still fits in a single receive buffer
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_SIZE - HEADER_LEN;

/// Payload carried by every acknowledgement
pub const ACK_PAYLOAD: &[u8] = b"ok";
