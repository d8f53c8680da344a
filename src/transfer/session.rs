//! Per-attempt mutable state

use chrono::{DateTime, Utc};

use super::error::TransferError;
use super::retry::{RetryEffect, RetryEvent, RetryPolicy, RetryState};
use super::state::TransferPhase;
use super::types::{
    AttemptId, SitePlugins, StatusReport, TransferId, TransferOptions, TransferRequest,
};

/// State of one transfer attempt, from confirmation to a terminal phase.
///
/// The retry state belongs to the current phase only: it is created on
/// the phase's first transient failure and dropped when the phase succeeds
/// or runs out of retries.
#[derive(Debug)]
pub struct TransferSession {
    pub attempt_id: AttemptId,
    pub request: TransferRequest,
    pub options: TransferOptions,
    pub started_at: DateTime<Utc>,
    phase: TransferPhase,
    transfer_id: Option<TransferId>,
    progress: f32,
    step: Option<u32>,
    total_steps: Option<u32>,
    polls: u32,
    retry: Option<RetryState>,
    retry_history: Vec<(TransferPhase, u32)>,
    plugins: Option<SitePlugins>,
    error: Option<TransferError>,
}

impl TransferSession {
    pub fn new(request: TransferRequest, options: TransferOptions) -> Self {
        Self {
            attempt_id: AttemptId::new(),
            request,
            options,
            started_at: Utc::now(),
            phase: TransferPhase::CheckingEligibility,
            transfer_id: None,
            progress: 0.0,
            step: None,
            total_steps: None,
            polls: 0,
            retry: None,
            retry_history: Vec::new(),
            plugins: None,
            error: None,
        }
    }

    /// Wall-clock time since the attempt was confirmed
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    pub fn transfer_id(&self) -> Option<&TransferId> {
        self.transfer_id.as_ref()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn steps(&self) -> (Option<u32>, Option<u32>) {
        (self.step, self.total_steps)
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn retry_state(&self) -> Option<&RetryState> {
        self.retry.as_ref()
    }

    /// Retries each phase needed before it succeeded
    pub fn retry_history(&self) -> &[(TransferPhase, u32)] {
        &self.retry_history
    }

    pub fn plugins(&self) -> Option<&SitePlugins> {
        self.plugins.as_ref()
    }

    pub fn error(&self) -> Option<&TransferError> {
        self.error.as_ref()
    }

    pub fn set_plugins(&mut self, plugins: SitePlugins) {
        self.plugins = Some(plugins);
    }

    pub fn set_transfer_id(&mut self, id: TransferId) {
        self.transfer_id = Some(id);
    }

    pub fn record_progress(&mut self, fraction: f32) {
        self.progress = fraction.clamp(0.0, 1.0);
    }

    /// Count a poll and remember its step counters
    pub fn record_report(&mut self, report: &StatusReport) {
        self.polls += 1;
        if report.step.is_some() {
            self.step = report.step;
        }
        if report.total_steps.is_some() {
            self.total_steps = report.total_steps;
        }
        if let Some(fraction) = report.progress_fraction() {
            self.record_progress(fraction);
        }
    }

    /// Feed a retry event for the current phase.
    ///
    /// The retry state is created on the first `Failed` and discarded once
    /// it goes back to inactive or gives up.
    pub fn apply_retry(&mut self, policy: &RetryPolicy, event: RetryEvent) -> RetryEffect {
        let current = match (self.retry, event) {
            (Some(state), _) => state,
            (None, RetryEvent::Failed) => RetryState::Inactive,
            (None, _) => return RetryEffect::None,
        };

        let (next, effect) = current.transition(policy, event);
        if event == RetryEvent::Succeeded && current.retry_count() > 0 {
            self.retry_history.push((self.phase, current.retry_count()));
        }
        self.retry = match (next, effect) {
            (_, RetryEffect::GiveUp { .. }) | (RetryState::Inactive, _) => None,
            (state, _) => Some(state),
        };
        effect
    }

    /// Move to the phase that follows the current one
    pub fn advance(&mut self) -> TransferPhase {
        if let Some(next) = self.phase.next() {
            self.phase = next;
        }
        self.retry = None;
        self.phase
    }

    pub fn fail(&mut self, error: TransferError) {
        self.phase = TransferPhase::Failed;
        self.retry = None;
        self.error = Some(error);
    }
}
