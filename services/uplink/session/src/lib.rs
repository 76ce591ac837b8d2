//! Transport sessions and request/reply transactions for the uplink client.
//!
//! A transaction is one short-lived session against the remote endpoint:
//! encode the request into the reused send buffer, connect, push the whole
//! buffer out, wait for one bounded reply, close. The [`TransactionRunner`]
//! is invoked both on a fixed cadence and on demand from the trigger
//! bridge, always from the scheduler's serialized context.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod indicator;
pub mod runner;
pub mod transport;

pub use indicator::{LogIndicator, StatusIndicator};
pub use runner::{RunnerConfig, TransactionRunner};
pub use transport::{Connector, TcpConnector, TcpSession, TransportSession};
