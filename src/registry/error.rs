//! Registry error types

use std::net::SocketAddr;

use thiserror::Error;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Subscriber limit reached, new endpoint not added
    #[error("Registry full ({limit} subscribers), rejected {endpoint}")]
    Full { endpoint: SocketAddr, limit: usize },
}
