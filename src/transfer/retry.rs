//! Retry/Delay Coordinator
//!
//! Pure state machine for delayed retries of a single phase. The
//! coordinator owns one `RetryState` per active phase and feeds it events;
//! the returned `RetryEffect` tells it whether to schedule a delayed
//! re-run, cancel a pending one, or give up.
//!
//! ```text
//!            Failed                Fired
//! INACTIVE ─────────▶ SCHEDULED ─────────▶ FIRING
//!     ▲                   ▲                  │
//!     │ Succeeded         └──── Failed ──────┤ (retry < max)
//!     │ Cancelled                            │
//!     └──────────────────────────────────────┤ Succeeded
//!                                            ▼ Failed (retry == max)
//!                                        EXHAUSTED
//! ```
//!
//! `retry` counts scheduled retries. It never exceeds `max_retries`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Delay sequence and retry bound for one class of phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before retry N is `delays_secs[N - 1]`; the last entry is
    /// reused once the sequence runs out.
    pub delays_secs: Vec<u64>,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(delays_secs: Vec<u64>, max_retries: u32) -> Self {
        Self {
            delays_secs,
            max_retries,
        }
    }

    /// Single short delay. Used for eligibility and initiation, which are
    /// only retried on request.
    pub fn short() -> Self {
        Self::new(vec![3], 14)
    }

    /// Longer, growing delays for post-provisioning propagation
    /// (status polling, site refresh, plugin reload).
    pub fn long() -> Self {
        Self::new(vec![3, 5, 10], 20)
    }

    /// Delay before the given 1-based retry
    pub fn delay_for(&self, retry: u32) -> Duration {
        let idx = (retry.max(1) - 1) as usize;
        let secs = self
            .delays_secs
            .get(idx)
            .or_else(|| self.delays_secs.last())
            .copied()
            .unwrap_or(0);
        Duration::from_secs(secs)
    }
}

/// Input to the retry state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    /// The guarded operation failed transiently
    Failed,
    /// The scheduled delay elapsed and the operation is about to re-run
    Fired,
    /// The guarded operation succeeded
    Succeeded,
    /// The owner went away; drop any pending retry
    Cancelled,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEffect {
    None,
    /// Re-run the operation after `delay`
    Schedule { retry: u32, delay: Duration },
    /// Invalidate the pending delayed action, if any
    CancelPending,
    /// Retries used up: surface a terminal failure
    GiveUp { retries: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryState {
    /// No failure seen yet for this phase
    #[default]
    Inactive,
    /// A delayed re-run is pending
    Scheduled { retry: u32, delay: Duration },
    /// Delay elapsed, re-run in flight
    Firing { retry: u32 },
    /// Terminal: `max_retries` reached
    Exhausted { retries: u32 },
}

impl RetryState {
    /// Number of retries scheduled so far
    pub fn retry_count(&self) -> u32 {
        match self {
            RetryState::Inactive => 0,
            RetryState::Scheduled { retry, .. } | RetryState::Firing { retry } => *retry,
            RetryState::Exhausted { retries } => *retries,
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryState::Exhausted { .. })
    }

    /// (current state, event) -> (new state, effect)
    pub fn transition(self, policy: &RetryPolicy, event: RetryEvent) -> (RetryState, RetryEffect) {
        use RetryEvent::*;

        match (self, event) {
            (RetryState::Exhausted { .. }, _) => (self, RetryEffect::None),

            (RetryState::Inactive, Failed) => Self::schedule_after(0, policy),
            (RetryState::Scheduled { retry, .. }, Failed)
            | (RetryState::Firing { retry }, Failed) => Self::schedule_after(retry, policy),

            (RetryState::Scheduled { retry, .. }, Fired) => {
                (RetryState::Firing { retry }, RetryEffect::None)
            }
            (RetryState::Inactive, Fired) | (RetryState::Firing { .. }, Fired) => {
                (self, RetryEffect::None)
            }

            (RetryState::Inactive, Succeeded) | (RetryState::Inactive, Cancelled) => {
                (RetryState::Inactive, RetryEffect::None)
            }
            (_, Succeeded) | (_, Cancelled) => (RetryState::Inactive, RetryEffect::CancelPending),
        }
    }

    fn schedule_after(retry: u32, policy: &RetryPolicy) -> (RetryState, RetryEffect) {
        if retry >= policy.max_retries {
            return (
                RetryState::Exhausted { retries: retry },
                RetryEffect::GiveUp { retries: retry },
            );
        }

        let next = retry + 1;
        let delay = policy.delay_for(next);
        (
            RetryState::Scheduled { retry: next, delay },
            RetryEffect::Schedule { retry: next, delay },
        )
    }
}

impl fmt::Display for RetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryState::Inactive => write!(f, "INACTIVE"),
            RetryState::Scheduled { retry, delay } => {
                write!(f, "SCHEDULED(#{} in {}s)", retry, delay.as_secs())
            }
            RetryState::Firing { retry } => write!(f, "FIRING(#{})", retry),
            RetryState::Exhausted { retries } => write!(f, "EXHAUSTED({})", retries),
        }
    }
}
