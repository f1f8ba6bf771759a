//! Subscriber registry implementation

use std::collections::BTreeSet;
use std::net::SocketAddr;

use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::error::RegistryError;

/// Deduplicated set of subscriber endpoints
///
/// Thread-safe via `RwLock`. Every method takes the lock for the duration of
/// a single call and returns owned data, so callers never hold the lock
/// across network I/O.
pub struct SubscriberRegistry {
    /// Subscribers keyed by address (equality by address value)
    subscribers: RwLock<BTreeSet<SocketAddr>>,

    /// Configuration
    config: RegistryConfig,
}

impl SubscriberRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            subscribers: RwLock::new(BTreeSet::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register an endpoint
    ///
    /// Returns `true` if the endpoint was newly added, `false` if it was
    /// already subscribed. A known endpoint is always accepted, even when the
    /// registry is full.
    pub async fn register(&self, endpoint: SocketAddr) -> Result<bool, RegistryError> {
        let mut subscribers = self.subscribers.write().await;

        if subscribers.contains(&endpoint) {
            tracing::debug!(peer = %endpoint, "Subscriber already registered");
            return Ok(false);
        }

        if self.config.is_full(subscribers.len()) {
            return Err(RegistryError::Full {
                endpoint,
                limit: self.config.max_subscribers,
            });
        }

        subscribers.insert(endpoint);

        tracing::info!(
            peer = %endpoint,
            subscribers = subscribers.len(),
            "Subscriber added"
        );

        Ok(true)
    }

    /// Remove an endpoint
    ///
    /// Returns `true` if the endpoint was registered.
    pub async fn remove(&self, endpoint: &SocketAddr) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(endpoint);

        if removed {
            tracing::info!(
                peer = %endpoint,
                subscribers = subscribers.len(),
                "Subscriber removed"
            );
        }

        removed
    }

    /// Point-in-time copy of all endpoints, ordered by address
    ///
    /// The lock is released before this returns; iterate the result freely.
    pub async fn snapshot_all(&self) -> Vec<SocketAddr> {
        self.subscribers.read().await.iter().copied().collect()
    }

    /// Check whether an endpoint is subscribed
    pub async fn contains(&self, endpoint: &SocketAddr) -> bool {
        self.subscribers.read().await.contains(endpoint)
    }

    /// Number of subscribers
    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Whether there are no subscribers
    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
