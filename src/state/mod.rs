//! Shared state value
//!
//! The single current state, written by update requests and read by the
//! broadcaster on every cycle.

pub mod store;

pub use store::StateStore;
