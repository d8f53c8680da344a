//! Automated Transfer
//!
//! Converts a hosted site into one that can run third-party plugins, then
//! installs the requested plugin and refreshes local state.
//!
//! # Phases
//!
//! ```text
//! CHECKING_ELIGIBILITY → INITIATING → POLLING → REFRESHING_SITE → RELOADING_PLUGINS → SUCCEEDED
//!          ↓                 ↓           ↓             ↓                  ↓
//!                              FAILED
//! ```
//!
//! Each phase may go through the retry coordinator (`retry`) before it
//! succeeds or fails for good.
//!
//! # Invariants
//!
//! 1. **One outcome**: an attempt posts at most one success or error notice
//! 2. **Bounded retries**: the retry counter of a phase never exceeds its
//!    policy's maximum
//! 3. **No local retry**: a missing local site record fails immediately
//! 4. **Ordered polls**: a new status poll is issued only after the previous
//!    one answered

pub mod adapters;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod messages;
pub mod retry;
pub mod session;
pub mod state;
pub mod timer;
pub mod types;


// Re-exports for convenience
pub use coordinator::{
    ConfirmationPrompt, TransferConfig, TransferCoordinator, TransferHandle, TransferReport,
};
pub use error::{EligibilityError, EligibilityRejectionReason, RemoteError, TransferError};
pub use events::{EventReceiver, EventSender, TransferEvent, event_channel};
pub use retry::{RetryEffect, RetryEvent, RetryPolicy, RetryState};
pub use session::TransferSession;
pub use state::TransferPhase;
pub use timer::CancelToken;
pub use types::{
    AttemptId, PluginEntry, SitePlugins, SiteRecord, SiteRef, StatusReport, TransferId,
    TransferOptions, TransferRequest, TransferStatus,
};
