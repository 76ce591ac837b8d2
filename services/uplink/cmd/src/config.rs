//! Configuration handling for the uplink binary.
//!
//! Values come from defaults, then an optional YAML file, then environment
//! overrides. The defaults mirror the build-time constants of the
//! reference design; a missing or unparsable file is a warning, never a
//! startup failure.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use uplink_link::SecurityMode;

/// Uplink client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    /// Network credentials
    pub network: NetworkConfig,
    /// Remote endpoint
    pub remote: RemoteConfig,
    /// Buffer capacities
    pub buffers: BufferConfig,
    /// Cadences and timeouts
    pub timing: TimingConfig,
}

/// Network credentials and security mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network SSID
    pub ssid: String,
    /// Network passphrase
    pub passphrase: String,
    /// Association security mode
    pub security: SecurityMode,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "uplink-net".to_string(),
            passphrase: String::new(),
            security: SecurityMode::WpaWpa2,
        }
    }
}

/// Remote endpoint for transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Remote host
    pub host: String,
    /// Remote port
    pub port: u16,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "broker.mqtt.it".to_string(),
            port: 8888,
        }
    }
}

/// Send/receive buffer capacities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Send buffer capacity in bytes
    pub send_capacity: usize,
    /// Receive buffer capacity in bytes
    pub recv_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            send_capacity: 32,
            recv_capacity: 32,
        }
    }
}

/// Cadences and timeouts, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Link manage cadence
    pub manage_interval_ms: u64,
    /// Periodic transaction cadence
    pub transact_interval_ms: u64,
    /// Session timeout covering connect and receive
    pub session_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            manage_interval_ms: 5000,
            transact_interval_ms: 1000,
            session_timeout_ms: 3000,
        }
    }
}

impl TimingConfig {
    /// Link manage cadence as a [`Duration`].
    pub fn manage_interval(&self) -> Duration {
        Duration::from_millis(self.manage_interval_ms)
    }

    /// Periodic transaction cadence as a [`Duration`].
    pub fn transact_interval(&self) -> Duration {
        Duration::from_millis(self.transact_interval_ms)
    }

    /// Session timeout as a [`Duration`].
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

impl UplinkConfig {
    /// Load configuration from an optional file, then apply environment
    /// overrides.
    pub fn load<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                    Ok(config) => {
                        info!("loaded configuration from {:?}", path.as_ref());
                        config
                    }
                    Err(err) => {
                        warn!(
                            %err,
                            "failed to parse config file {:?}; using defaults",
                            path.as_ref()
                        );
                        Self::default()
                    }
                },
                Err(_) => {
                    warn!("config file {:?} not found; using defaults", path.as_ref());
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_environment_overrides();

        info!(
            ssid = %config.network.ssid,
            remote = %format!("{}:{}", config.remote.host, config.remote.port),
            manage_interval_ms = config.timing.manage_interval_ms,
            transact_interval_ms = config.timing.transact_interval_ms,
            "final uplink configuration"
        );

        Ok(config)
    }

    fn apply_environment_overrides(&mut self) {
        if let Ok(ssid) = std::env::var("UPLINK_SSID") {
            info!(%ssid, "SSID overridden by environment");
            self.network.ssid = ssid;
        }

        if let Ok(passphrase) = std::env::var("UPLINK_PASSPHRASE") {
            self.network.passphrase = passphrase;
        }

        if let Ok(host) = std::env::var("UPLINK_REMOTE_HOST") {
            info!(%host, "remote host overridden by environment");
            self.remote.host = host;
        }

        if let Ok(port) = std::env::var("UPLINK_REMOTE_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                info!(port, "remote port overridden by environment");
                self.remote.port = port;
            }
        }
    }
}
