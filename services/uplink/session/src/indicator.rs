//! Liveness indicator output.

use tracing::debug;

/// Binary output toggled once per fully successful transaction
/// round-trip. If the level keeps flipping, the system is alive.
pub trait StatusIndicator: Send {
    /// Flip the indicator.
    fn toggle(&mut self);

    /// Current level.
    fn is_on(&self) -> bool;
}

/// Indicator that reports level changes on the diagnostic log, the
/// hosted stand-in for a panel LED.
#[derive(Debug, Default)]
pub struct LogIndicator {
    on: bool,
}

impl StatusIndicator for LogIndicator {
    fn toggle(&mut self) {
        self.on = !self.on;
        debug!(on = self.on, "liveness indicator toggled");
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
