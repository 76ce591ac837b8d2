//! Link driver capability interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LinkError;

/// Security mode for link association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityMode {
    /// Open network, no key exchange.
    Open,
    /// WPA/WPA2 passphrase association.
    #[default]
    WpaWpa2,
}

/// Identity and status fields of an associated link.
#[derive(Debug, Clone)]
pub struct LinkIdentity {
    /// Hardware address of the interface.
    pub mac: String,
    /// Assigned address.
    pub ip: String,
    /// Network mask.
    pub netmask: String,
    /// Default gateway.
    pub gateway: String,
    /// Signal strength in dBm; 0 when the medium has no meaningful RSSI.
    pub rssi: i32,
}

impl Default for LinkIdentity {
    fn default() -> Self {
        Self {
            mac: "02:00:00:00:00:01".to_string(),
            ip: "0.0.0.0".to_string(),
            netmask: "0.0.0.0".to_string(),
            gateway: "0.0.0.0".to_string(),
            rssi: 0,
        }
    }
}

/// Capability interface for the physical link.
///
/// The connection manager drives the link exclusively through this trait;
/// the real interface (a WiFi radio, a managed NIC) lives behind it as an
/// external collaborator.
#[async_trait]
pub trait LinkDriver: Send {
    /// Check that a default interface is available to drive.
    async fn acquire(&mut self) -> Result<(), LinkError>;

    /// Authenticated association with the configured network.
    async fn join(
        &mut self,
        ssid: &str,
        passphrase: &str,
        security: SecurityMode,
    ) -> Result<(), LinkError>;

    /// Force the link down.
    async fn leave(&mut self);

    /// Hardware address of the interface.
    fn mac_address(&self) -> String;

    /// Assigned address.
    fn ip_address(&self) -> String;

    /// Network mask.
    fn netmask(&self) -> String;

    /// Default gateway.
    fn gateway(&self) -> String;

    /// Signal strength.
    fn rssi(&self) -> i32;
}

/// Driver for a hosted OS where the kernel already owns the physical link.
///
/// Acquisition and association are formalities here: they succeed
/// immediately and the identity fields come from construction. This keeps
/// the binary runnable without a radio while presenting the exact
/// capability surface a real driver would.
#[derive(Debug, Default)]
pub struct HostedLink {
    identity: LinkIdentity,
    joined: bool,
}

impl HostedLink {
    /// Driver with default identity fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver reporting the given identity once joined.
    pub fn with_identity(identity: LinkIdentity) -> Self {
        Self {
            identity,
            joined: false,
        }
    }

    /// Whether the driver currently considers itself associated.
    pub fn joined(&self) -> bool {
        self.joined
    }
}

#[async_trait]
impl LinkDriver for HostedLink {
    async fn acquire(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn join(
        &mut self,
        ssid: &str,
        _passphrase: &str,
        security: SecurityMode,
    ) -> Result<(), LinkError> {
        debug!(ssid, ?security, "hosted link joined");
        self.joined = true;
        Ok(())
    }

    async fn leave(&mut self) {
        debug!("hosted link left");
        self.joined = false;
    }

    fn mac_address(&self) -> String {
        self.identity.mac.clone()
    }

    fn ip_address(&self) -> String {
        self.identity.ip.clone()
    }

    fn netmask(&self) -> String {
        self.identity.netmask.clone()
    }

    fn gateway(&self) -> String {
        self.identity.gateway.clone()
    }

    fn rssi(&self) -> i32 {
        self.identity.rssi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hosted_link_join_leave() {
        let mut link = HostedLink::new();
        assert!(!link.joined());

        link.acquire().await.unwrap();
        link.join("net", "secret", SecurityMode::WpaWpa2)
            .await
            .unwrap();
        assert!(link.joined());

        link.leave().await;
        assert!(!link.joined());
    }

    #[tokio::test]
    async fn test_hosted_link_identity() {
        let link = HostedLink::with_identity(LinkIdentity {
            mac: "aa:bb:cc:dd:ee:ff".to_string(),
            ip: "10.0.0.2".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: "10.0.0.1".to_string(),
            rssi: -52,
        });
        assert_eq!(link.mac_address(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(link.ip_address(), "10.0.0.2");
        assert_eq!(link.rssi(), -52);
    }
}
