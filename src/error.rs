//! Error types
//!
//! Only bind and configuration errors ever escape the server. Everything
//! that happens while serving a single client is logged and absorbed.

use std::net::SocketAddr;

use thiserror::Error;

pub use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// The listen socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Wire codec errors
///
/// Returned by `WireMessage::decode` for any datagram that is not a
/// well-formed message, and by `WireMessage::encode` for oversized payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Fewer bytes than the header or the declared payload needs
    #[error("Truncated message: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Bad magic: {0:#06x}")]
    BadMagic(u16),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Datagram carries bytes past the declared payload
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("Payload of {size} bytes exceeds maximum of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// `MessageKind::Unknown` carrying a code that names a known kind
    #[error("Kind code {0:#04x} is assigned and cannot be sent as unknown")]
    AssignedKindCode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::Truncated {
            needed: 14,
            available: 3,
        };
        assert_eq!(err.to_string(), "Truncated message: need 14 bytes, got 3");

        let err = CodecError::BadMagic(0xdead);
        assert_eq!(err.to_string(), "Bad magic: 0xdead");
    }

    #[test]
    fn test_error_from_codec() {
        let err: Error = CodecError::UnsupportedVersion(9).into();
        assert!(matches!(err, Error::Codec(CodecError::UnsupportedVersion(9))));
        assert!(err.to_string().contains("Unsupported protocol version: 9"));
    }

    #[test]
    fn test_bind_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::Bind {
            addr: "127.0.0.1:10001".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:10001"));
        assert!(err.source().is_some());
    }
}
