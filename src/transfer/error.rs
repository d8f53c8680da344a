//! Transfer Error Types
//!
//! Three families of failure reach the coordinator:
//! - structured eligibility rejections (closed enumeration)
//! - opaque remote/transport errors
//! - local data integrity errors (site record missing, never retried)

use thiserror::Error;

use super::messages;
use super::state::TransferPhase;

/// Remote-reported reasons a site cannot receive an Automated Transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EligibilityRejectionReason {
    UnverifiedEmail,
    ExcessiveDiskSpaceUsage,
    NoBusinessPlan,
    VipSite,
    NotAdmin,
    NotDomainOwner,
    NoCustomDomain,
    GreylistedSite,
    PrivateSite,
    Unknown,
}

impl EligibilityRejectionReason {
    /// Map a REST eligibility error code to a reason.
    ///
    /// Unrecognized codes become `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "email_unverified" => Self::UnverifiedEmail,
            "excessive_disk_space" => Self::ExcessiveDiskSpaceUsage,
            "no_business_plan" => Self::NoBusinessPlan,
            "no_vip_sites" => Self::VipSite,
            "non_admin_user" => Self::NotAdmin,
            "not_domain_owner" => Self::NotDomainOwner,
            "no_wpcom_domain" => Self::NoCustomDomain,
            "site_graylisted" => Self::GreylistedSite,
            "site_private" => Self::PrivateSite,
            _ => Self::Unknown,
        }
    }

    /// User-facing notice text for this reason
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnverifiedEmail => messages::ELIGIBILITY_UNVERIFIED_EMAIL,
            Self::ExcessiveDiskSpaceUsage => messages::ELIGIBILITY_EXCESSIVE_USAGE,
            Self::NoBusinessPlan => messages::ELIGIBILITY_NO_BUSINESS_PLAN,
            Self::VipSite => messages::ELIGIBILITY_VIP_SITE,
            Self::NotAdmin => messages::ELIGIBILITY_NOT_ADMIN,
            Self::NotDomainOwner => messages::ELIGIBILITY_NOT_DOMAIN_OWNER,
            Self::NoCustomDomain => messages::ELIGIBILITY_NO_CUSTOM_DOMAIN,
            Self::GreylistedSite => messages::ELIGIBILITY_GREYLISTED,
            Self::PrivateSite => messages::ELIGIBILITY_PRIVATE_SITE,
            Self::Unknown => messages::ELIGIBILITY_GENERIC,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnverifiedEmail => "UNVERIFIED_EMAIL",
            Self::ExcessiveDiskSpaceUsage => "EXCESSIVE_DISK_SPACE_USAGE",
            Self::NoBusinessPlan => "NO_BUSINESS_PLAN",
            Self::VipSite => "VIP_SITE",
            Self::NotAdmin => "NOT_ADMIN",
            Self::NotDomainOwner => "NOT_DOMAIN_OWNER",
            Self::NoCustomDomain => "NO_CUSTOM_DOMAIN",
            Self::GreylistedSite => "GREYLISTED_SITE",
            Self::PrivateSite => "PRIVATE_SITE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for EligibilityRejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque remote/transport failure
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Remote transfer reported an error state")]
    TransferErrorState,
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

/// Failure of the eligibility check
#[derive(Error, Debug, Clone)]
pub enum EligibilityError {
    #[error("Site ineligible: {0}")]
    Rejected(EligibilityRejectionReason),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl EligibilityError {
    /// Reason surfaced to the user. Transport failures carry no structured
    /// reason and collapse to `Unknown`.
    pub fn reason(&self) -> EligibilityRejectionReason {
        match self {
            EligibilityError::Rejected(reason) => *reason,
            EligibilityError::Remote(_) => EligibilityRejectionReason::Unknown,
        }
    }
}

/// Terminal outcome of a failed transfer attempt
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    #[error("No OAuth credentials available for site {0}")]
    MissingCredentials(u64),

    #[error("Invalid transfer request: {0}")]
    InvalidRequest(String),

    #[error("Site is not eligible for Automated Transfer: {0}")]
    Ineligible(EligibilityRejectionReason),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Local site record not found (site {site_id}, user {username})")]
    SiteNotFound { site_id: u64, username: String },

    #[error("Retries exhausted in {phase} after {attempts} attempts")]
    RetriesExhausted { phase: TransferPhase, attempts: u32 },

    #[error("Transfer still in progress after {polls} status polls")]
    PollLimitReached { polls: u32 },

    #[error("Transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Get the error code for logs and analytics
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::MissingCredentials(_) => "MISSING_CREDENTIALS",
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::Ineligible(_) => "INELIGIBLE",
            TransferError::Remote(_) => "REMOTE_ERROR",
            TransferError::SiteNotFound { .. } => "SITE_NOT_FOUND",
            TransferError::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            TransferError::PollLimitReached { .. } => "POLL_LIMIT_REACHED",
            TransferError::Cancelled => "CANCELLED",
        }
    }

    /// Failures worth a delayed retry. Local integrity errors and
    /// cancellation are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransferError::Remote(_) | TransferError::Ineligible(_))
    }

    /// Notice title shown to the user for this failure.
    ///
    /// `None` for cancellation: whoever cancelled is no longer listening.
    pub fn notice_title(&self, plugin_name: &str) -> Option<String> {
        match self {
            TransferError::Ineligible(reason) => Some(reason.message().to_string()),
            TransferError::Cancelled => None,
            _ => Some(messages::generic_error(plugin_name)),
        }
    }
}

impl From<EligibilityError> for TransferError {
    fn from(e: EligibilityError) -> Self {
        TransferError::Ineligible(e.reason())
    }
}
