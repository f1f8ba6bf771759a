//! Hub server implementation
//!
//! - `dispatcher`: receive loop applying subscribe/update requests
//! - `broadcaster`: periodic state push to every subscriber
//! - `listener`: socket ownership and task lifecycle

pub mod broadcaster;
pub mod config;
pub mod dispatcher;
pub mod listener;

pub use broadcaster::{Broadcaster, CycleReport};
pub use config::ServerConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use listener::HubServer;
