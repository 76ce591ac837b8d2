//! Periodic and on-demand request/reply transactions.
//!
//! The error taxonomy is deliberate and asymmetric:
//! - a connect failure demotes the link state and forces full
//!   reacquisition (the only escalating failure),
//! - a send failure abandons the transaction but keeps the link state,
//! - a receive failure is logged only.
//!
//! Nothing here returns an error to the scheduler; every outcome ends in
//! the log and the next scheduled transaction retries independently.

use std::time::Duration;

use tracing::{debug, info, warn};

use uplink_link::{ConnectionManager, LinkDriver, LinkState};
use uplink_wire::{encode_request, reply_display, request_display, Tag};

use crate::indicator::StatusIndicator;
use crate::transport::{Connector, TransportSession};

/// Tunables for the transaction runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Remote endpoint host.
    pub host: String,
    /// Remote endpoint port.
    pub port: u16,
    /// Session timeout covering connect and receive.
    pub session_timeout: Duration,
    /// Send buffer capacity in bytes.
    pub send_capacity: usize,
    /// Receive buffer capacity in bytes.
    pub recv_capacity: usize,
}

/// Runs one request/reply transaction per invocation over a fresh
/// transport session.
pub struct TransactionRunner<T: Connector, I: StatusIndicator> {
    connector: T,
    indicator: I,
    config: RunnerConfig,
    // Incremented once per attempted transaction, success or not.
    // Wraps at u64::MAX; never reset.
    counter: u64,
    // Reused across transactions, never reallocated.
    send_buf: Box<[u8]>,
    recv_buf: Box<[u8]>,
}

impl<T: Connector, I: StatusIndicator> TransactionRunner<T, I> {
    /// Runner sending through `connector`, reporting success on
    /// `indicator`.
    pub fn new(connector: T, indicator: I, config: RunnerConfig) -> Self {
        let send_buf = vec![0u8; config.send_capacity].into_boxed_slice();
        let recv_buf = vec![0u8; config.recv_capacity].into_boxed_slice();
        Self {
            connector,
            indicator,
            config,
            counter: 0,
            send_buf,
            recv_buf,
        }
    }

    /// Current transaction counter.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Read access to the liveness indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    #[cfg(test)]
    pub(crate) fn set_counter(&mut self, counter: u64) {
        self.counter = counter;
    }

    /// Run one transaction. A no-op while the link is down; never fails.
    pub async fn run<D: LinkDriver>(
        &mut self,
        tag: Tag,
        state: &mut LinkState,
        manager: &mut ConnectionManager<D>,
    ) {
        if !state.is_connected() {
            return;
        }

        self.counter = self.counter.wrapping_add(1);
        let len = match encode_request(tag, self.counter, &mut self.send_buf) {
            Ok(len) => len,
            Err(err) => {
                warn!(%err, %tag, "request dropped");
                return;
            }
        };

        debug!(
            bytes = len,
            host = %self.config.host,
            port = self.config.port,
            "sending request"
        );

        let mut session = self.connector.open(self.config.session_timeout);
        if let Err(err) = session
            .connect(&self.config.host, self.config.port)
            .await
        {
            // The single state-demoting path: force the link down so the
            // connection manager re-runs full reacquisition next period.
            warn!(%err, host = %self.config.host, "session connect failed; dropping link");
            session.close().await;
            manager.drop_link(state).await;
            return;
        }

        // The full buffer goes out before reuse; send may write partially.
        let mut sent = 0;
        while sent < len {
            match session.send(&self.send_buf[sent..len]).await {
                Ok(0) => {
                    warn!(sent, "connection closed mid-send; transaction abandoned");
                    session.close().await;
                    return;
                }
                Ok(n) => sent += n,
                Err(err) => {
                    // Link state stays up; the next scheduled transaction
                    // retries independently.
                    warn!(%err, sent, "send failed; transaction abandoned");
                    session.close().await;
                    return;
                }
            }
        }
        debug!(request = %request_display(&self.send_buf[..len]), "request sent");

        match session.recv(&mut self.recv_buf).await {
            Ok(n) => {
                info!(reply = %reply_display(&self.recv_buf[..n]), "reply received");
                self.indicator.toggle();
            }
            Err(err) => warn!(%err, "receive failed"),
        }

        session.close().await;
    }
}
