//! Transfer Phase Definitions
//!
//! Phases are strictly sequential. The coordinator only enters the next
//! phase after the previous one reported success.

use std::fmt;

/// Automated Transfer session phases
///
/// Terminal phases: SUCCEEDED, FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferPhase {
    /// Pre-flight capability check against the remote
    CheckingEligibility,

    /// Remote transfer is being started for the plugin
    Initiating,

    /// Remote transfer started, waiting for it to report completion
    Polling,

    /// Remote side complete, local site record is being re-synced
    RefreshingSite,

    /// Site re-synced, fetching the installed plugin list
    ReloadingPlugins,

    /// Terminal: plugin installed and local state refreshed
    Succeeded,

    /// Terminal: the attempt gave up (notice already surfaced)
    Failed,
}

impl TransferPhase {
    /// Check if this is a terminal phase (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferPhase::Succeeded | TransferPhase::Failed)
    }

    /// Phase that follows a successful run of this one
    pub fn next(&self) -> Option<Self> {
        match self {
            TransferPhase::CheckingEligibility => Some(TransferPhase::Initiating),
            TransferPhase::Initiating => Some(TransferPhase::Polling),
            TransferPhase::Polling => Some(TransferPhase::RefreshingSite),
            TransferPhase::RefreshingSite => Some(TransferPhase::ReloadingPlugins),
            TransferPhase::ReloadingPlugins => Some(TransferPhase::Succeeded),
            TransferPhase::Succeeded | TransferPhase::Failed => None,
        }
    }

    /// Get human-readable phase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::CheckingEligibility => "CHECKING_ELIGIBILITY",
            TransferPhase::Initiating => "INITIATING",
            TransferPhase::Polling => "POLLING",
            TransferPhase::RefreshingSite => "REFRESHING_SITE",
            TransferPhase::ReloadingPlugins => "RELOADING_PLUGINS",
            TransferPhase::Succeeded => "SUCCEEDED",
            TransferPhase::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(TransferPhase::Succeeded.is_terminal());
        assert!(TransferPhase::Failed.is_terminal());

        assert!(!TransferPhase::CheckingEligibility.is_terminal());
        assert!(!TransferPhase::Initiating.is_terminal());
        assert!(!TransferPhase::Polling.is_terminal());
        assert!(!TransferPhase::RefreshingSite.is_terminal());
        assert!(!TransferPhase::ReloadingPlugins.is_terminal());
    }

    #[test]
    fn test_phase_order() {
        let mut phase = TransferPhase::CheckingEligibility;
        let mut visited = vec![phase];
        while let Some(next) = phase.next() {
            visited.push(next);
            phase = next;
        }

        assert_eq!(
            visited,
            vec![
                TransferPhase::CheckingEligibility,
                TransferPhase::Initiating,
                TransferPhase::Polling,
                TransferPhase::RefreshingSite,
                TransferPhase::ReloadingPlugins,
                TransferPhase::Succeeded,
            ]
        );
        assert_eq!(TransferPhase::Failed.next(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferPhase::Polling.to_string(), "POLLING");
        assert_eq!(TransferPhase::Failed.to_string(), "FAILED");
    }
}
