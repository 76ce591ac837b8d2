//! Reconnect policy state machine.
//!
//! [`ConnectionManager::manage`] runs on a fixed cadence from the
//! scheduler. While the link is up it does nothing; otherwise it walks the
//! full acquire + join sequence. Failures are logged and swallowed: the
//! next periodic invocation is the retry, so the retry interval equals the
//! scheduling period.

use tracing::{info, warn};

use crate::driver::{LinkDriver, SecurityMode};
use crate::state::LinkState;

/// Owns the link driver and the network credentials, and keeps the link
/// up as much as possible.
pub struct ConnectionManager<D> {
    driver: D,
    ssid: String,
    passphrase: String,
    security: SecurityMode,
}

impl<D: LinkDriver> ConnectionManager<D> {
    /// Manager for `driver` with the given credentials.
    pub fn new(driver: D, ssid: String, passphrase: String, security: SecurityMode) -> Self {
        Self {
            driver,
            ssid,
            passphrase,
            security,
        }
    }

    /// One step of the reconnect policy. Never fails; every outcome goes
    /// to the log.
    ///
    /// While connected this is a no-op, which is what bounds reconnect
    /// storms: the expensive path only runs while the link is down.
    pub async fn manage(&mut self, state: &mut LinkState) {
        if state.is_connected() {
            return;
        }

        info!("initializing link");

        if let Err(err) = self.driver.acquire().await {
            warn!(%err, "no link interface; retrying next period");
            return;
        }

        info!(ssid = %self.ssid, "joining network");
        if let Err(err) = self
            .driver
            .join(&self.ssid, &self.passphrase, self.security)
            .await
        {
            warn!(%err, "association failed; retrying next period");
            return;
        }

        state.mark_connected();
        info!(
            mac = %self.driver.mac_address(),
            ip = %self.driver.ip_address(),
            netmask = %self.driver.netmask(),
            gateway = %self.driver.gateway(),
            rssi = self.driver.rssi(),
            "link up"
        );
    }

    /// Force the link down and demote the state.
    ///
    /// The transaction runner calls this on a session-connect failure; it
    /// is the only path that demotes [`LinkState`]. The next manage period
    /// performs full reacquisition.
    pub async fn drop_link(&mut self, state: &mut LinkState) {
        warn!("dropping link; full reacquisition next manage period");
        self.driver.leave().await;
        state.mark_disconnected();
    }

    /// Read access to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
