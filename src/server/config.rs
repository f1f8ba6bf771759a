//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::constants::MAX_PAYLOAD_SIZE;
use crate::registry::RegistryConfig;
use crate::state::store::DEFAULT_STATE;

/// Default UDP port
pub const DEFAULT_PORT: u16 = 10001;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the UDP socket to
    pub bind_addr: SocketAddr,

    /// Interval between broadcast cycles
    pub broadcast_period: Duration,

    /// State value served before the first update
    pub initial_state: Bytes,

    /// Subscriber registry configuration
    pub registry: RegistryConfig,

    /// Remove subscribers whose sends fail permanently
    pub evict_unreachable: bool,

    /// Interval for logging hub statistics (None = disabled)
    pub stats_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            broadcast_period: Duration::from_secs(1),
            initial_state: Bytes::from_static(DEFAULT_STATE),
            registry: RegistryConfig::default(),
            evict_unreachable: false,
            stats_interval: None,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set only the port of the bind address
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the broadcast period
    pub fn broadcast_period(mut self, period: Duration) -> Self {
        self.broadcast_period = period;
        self
    }

    /// Set the startup state
    pub fn initial_state(mut self, state: impl Into<Bytes>) -> Self {
        self.initial_state = state.into();
        self
    }

    /// Set the subscriber limit (0 = unlimited)
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.registry = self.registry.max_subscribers(max);
        self
    }

    /// Enable or disable eviction of unreachable subscribers
    pub fn evict_unreachable(mut self, evict: bool) -> Self {
        self.evict_unreachable = evict;
        self
    }

    /// Log statistics at the given interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = Some(interval);
        self
    }

    /// Check the configuration before binding
    pub fn validate(&self) -> Result<()> {
        if self.broadcast_period.is_zero() {
            return Err(Error::Config("broadcast period must be non-zero".into()));
        }
        if self.initial_state.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::Config(format!(
                "initial state is {} bytes, maximum is {}",
                self.initial_state.len(),
                MAX_PAYLOAD_SIZE
            )));
        }
        if self.stats_interval.is_some_and(|d| d.is_zero()) {
            return Err(Error::Config("stats interval must be non-zero".into()));
        }
        Ok(())
    }
}
