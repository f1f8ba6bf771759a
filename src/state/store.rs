//! State store implementation

use bytes::Bytes;
use tokio::sync::RwLock;

/// Default state before any update arrives
pub const DEFAULT_STATE: &[u8] = b"started";

struct Inner {
    value: Bytes,
    version: u64,
}

/// Holder of the current state value
///
/// Replacement happens under the write lock, so a reader sees either the old
/// or the new value, never a mix. `get()` hands out a reference-counted
/// `Bytes`; later sets do not affect a value already returned.
pub struct StateStore {
    inner: RwLock<Inner>,
}

impl StateStore {
    /// Create a store holding `initial`
    pub fn new(initial: impl Into<Bytes>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                value: initial.into(),
                version: 0,
            }),
        }
    }

    /// Current value
    pub async fn get(&self) -> Bytes {
        self.inner.read().await.value.clone()
    }

    /// Current value together with its version
    pub async fn get_versioned(&self) -> (Bytes, u64) {
        let inner = self.inner.read().await;
        (inner.value.clone(), inner.version)
    }

    /// Replace the current value, returning the new version
    pub async fn set(&self, value: impl Into<Bytes>) -> u64 {
        let value = value.into();
        let mut inner = self.inner.write().await;
        inner.value = value;
        inner.version += 1;
        inner.version
    }

    /// Number of committed sets
    pub async fn version(&self) -> u64 {
        self.inner.read().await.version
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(Bytes::from_static(DEFAULT_STATE))
    }
}
