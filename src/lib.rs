//! UDP state broadcast hub
//!
//! Clients subscribe to receive periodic snapshots of a shared state value,
//! and any client may push a new value that is then broadcast to every
//! current subscriber.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<UdpSocket>
//!                 ┌───────────┴────────────┐
//!                 ▼                        ▼
//!           [Dispatcher]             [Broadcaster]
//!           recv_from()              interval.tick()
//!               │                        │
//!     Subscribe │ Update        snapshot │ get()
//!               ▼    ▼                   ▼    ▼
//!   Arc<SubscriberRegistry>   Arc<StateStore>
//! ```
//!
//! Both tasks share the registry and the state store. Every access goes
//! through a lock that is released before any network I/O happens, so one
//! unreachable subscriber can never stall registration or updates.
//!
//! # Example
//!
//! ```no_run
//! use state_hub::{HubServer, ServerConfig};
//!
//! # async fn example() -> state_hub::error::Result<()> {
//! let config = ServerConfig::default().port(10001);
//! let server = HubServer::bind(config).await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod state;
pub mod stats;

pub use client::HubClient;
pub use error::{CodecError, Error, Result};
pub use protocol::{MessageKind, WireMessage};
pub use registry::{RegistryConfig, SubscriberRegistry};
pub use server::{HubServer, ServerConfig};
pub use state::StateStore;
pub use stats::{HubStats, HubStatsSnapshot};
