//! Hub client
//!
//! Client-side helper for talking to a hub: subscribe, push updates and read
//! acknowledgements and state pushes.

pub mod subscriber;

pub use subscriber::HubClient;
