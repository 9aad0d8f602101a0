use std::time::Duration;

use crate::types::ErrorKind;

/// Mutable bookkeeping owned by the poller task.
#[derive(Debug, Clone, Default)]
pub struct PollerRunState {
    /// Set once the first configuration has been accepted.
    pub started: bool,
    pub in_flight: bool,
    pub resolved_vin: Option<String>,
    pub last_error: Option<ErrorKind>,
    /// Fetch cycles dispatched since start.
    pub cycles: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    /// Waiting for configuration.
    Idle,
    FetchInFlight,
    /// Next cycle is armed and fires after `delay`.
    Scheduled { delay: Duration },
    /// Last cycle failed and no retry is armed; waiting for an external refresh.
    IdleAfterFailure,
}

/// Read-only view of the poller, published after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerStatus {
    pub phase: PollerPhase,
    pub resolved_vin: Option<String>,
    pub last_error: Option<ErrorKind>,
    pub cycles: u64,
}

impl Default for PollerStatus {
    fn default() -> Self {
        Self {
            phase: PollerPhase::Idle,
            resolved_vin: None,
            last_error: None,
            cycles: 0,
        }
    }
}

impl PollerRunState {
    pub fn phase(&self, pending: Option<Duration>) -> PollerPhase {
        if self.in_flight {
            return PollerPhase::FetchInFlight;
        }
        if let Some(delay) = pending {
            return PollerPhase::Scheduled { delay };
        }
        if self.started && self.last_error.is_some() {
            PollerPhase::IdleAfterFailure
        } else {
            PollerPhase::Idle
        }
    }

    pub fn status(&self, pending: Option<Duration>) -> PollerStatus {
        PollerStatus {
            phase: self.phase(pending),
            resolved_vin: self.resolved_vin.clone(),
            last_error: self.last_error,
            cycles: self.cycles,
        }
    }
}
