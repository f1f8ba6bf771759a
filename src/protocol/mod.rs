//! Hub wire protocol
//!
//! Every datagram carries exactly one [`WireMessage`]:
//!
//! ```text
//! ┌───────┬─────────┬──────┬───────────────┬────────┬─────────────┐
//! │ magic │ version │ kind │ timestamp     │ length │ payload     │
//! │ "SH"  │ u8      │ u8   │ i64 BE (secs) │ u16 BE │ length bytes│
//! └───────┴─────────┴──────┴───────────────┴────────┴─────────────┘
//! ```

pub mod constants;
pub mod message;

pub use message::{unix_timestamp, MessageKind, WireMessage};
