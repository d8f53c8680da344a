//! Automated Transfer - plugin-capable site conversion client
//!
//! Checks a hosted site's eligibility, starts the remote transfer, polls it
//! to completion and refreshes the local site and plugin state afterwards.
//!
//! # Modules
//!
//! - [`transfer`] - Phase driver, retry coordinator and remote adapters
//! - [`config`] - YAML application config
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::{ApiConfig, AppConfig, ConfigError};
pub use transfer::{
    TransferConfig, TransferCoordinator, TransferError, TransferOptions, TransferPhase,
    TransferReport, TransferRequest,
};
