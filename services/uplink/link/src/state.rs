//! Connection state shared by the connection manager and the transaction
//! runner.
//!
//! A single [`LinkState`] lives inside the scheduler context and is only
//! ever touched from there. Exclusive access comes from the `&mut` the
//! scheduler hands each task, not from a lock, and the raw flag is private
//! so every mutation goes through a named transition.

use tracing::debug;

/// Two-valued link state gating whether transactional I/O is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No authenticated association; transactions are skipped.
    #[default]
    Disconnected,
    /// Link is up; transactions may run.
    Connected,
}

/// Owner of the [`ConnectionState`] flag, exposing transitions only.
#[derive(Debug, Default)]
pub struct LinkState {
    state: ConnectionState,
}

impl LinkState {
    /// New state, starting disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the link is currently up.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Current state value.
    pub fn current(&self) -> ConnectionState {
        self.state
    }

    /// Disconnected -> Connected, after successful acquisition and
    /// association.
    pub fn mark_connected(&mut self) {
        if self.state != ConnectionState::Connected {
            debug!("link state: disconnected -> connected");
            self.state = ConnectionState::Connected;
        }
    }

    /// Connected -> Disconnected.
    ///
    /// Only the session-connect failure path demotes the state; send and
    /// receive failures leave it alone.
    pub fn mark_disconnected(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!("link state: connected -> disconnected");
            self.state = ConnectionState::Disconnected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let state = LinkState::new();
        assert!(!state.is_connected());
        assert_eq!(state.current(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_transitions() {
        let mut state = LinkState::new();
        state.mark_connected();
        assert!(state.is_connected());
        state.mark_disconnected();
        assert!(!state.is_connected());
    }

    #[test]
    fn test_transitions_idempotent() {
        let mut state = LinkState::new();
        state.mark_disconnected();
        assert!(!state.is_connected());
        state.mark_connected();
        state.mark_connected();
        assert!(state.is_connected());
    }
}
