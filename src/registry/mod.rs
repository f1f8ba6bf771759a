//! Subscriber registry
//!
//! Tracks the endpoints that receive periodic state pushes. The dispatcher
//! registers endpoints, the broadcaster reads them and may evict dead ones.
//!
//! # Snapshot-then-iterate
//!
//! ```text
//!   Dispatcher                 Arc<SubscriberRegistry>            Broadcaster
//!   register(addr) ──write──► ┌──────────────────────────┐
//!                             │ subscribers: BTreeSet<   │
//!                             │   SocketAddr>            │ ◄──read── snapshot_all()
//!                             │                          │              │
//!                             └──────────────────────────┘              ▼
//!                                                            Vec<SocketAddr> (lock released)
//!                                                                       │
//!                                                               send_to() per endpoint
//! ```
//!
//! No lock is ever held while a packet is being sent.

pub mod config;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use store::SubscriberRegistry;
