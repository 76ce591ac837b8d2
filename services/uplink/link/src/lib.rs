//! Link lifecycle management for the uplink client.
//!
//! The physical link (a radio, a NIC) is an external collaborator driven
//! through the [`LinkDriver`] capability trait. On top of it sit the
//! two-state connection machine ([`LinkState`]) and the reconnect policy
//! ([`ConnectionManager`]): keep the link up as much as possible, retry on
//! the next periodic invocation whenever anything fails, and never let a
//! link failure escalate past a log line.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod error;
pub mod manager;
pub mod state;

pub use driver::{HostedLink, LinkDriver, LinkIdentity, SecurityMode};
pub use error::LinkError;
pub use manager::ConnectionManager;
pub use state::{ConnectionState, LinkState};
