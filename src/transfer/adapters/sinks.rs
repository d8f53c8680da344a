//! Headless sinks and credential providers
//!
//! Used by the CLI, where the "UI" is the log.

use tracing::info;

use super::{AnalyticsSink, CredentialsProvider, ProgressSink};
use crate::transfer::types::SiteRef;

/// Reads the OAuth token from an environment variable
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialsProvider for EnvCredentials {
    fn oauth_token(&self, _site: &SiteRef) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.trim().is_empty())
    }
}

/// Fixed token, or none at all
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn none() -> Self {
        Self { token: None }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn oauth_token(&self, _site: &SiteRef) -> Option<String> {
        self.token.clone()
    }
}

/// Progress surface that writes to the tracing log
#[derive(Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn show_progress(&self, fraction: f32, message: &str) {
        info!(percent = (fraction * 100.0).round() as u32, "{}", message);
    }

    fn dismiss(&self) {
        info!("Progress dismissed");
    }

    fn post_notice(&self, title: &str) {
        info!(notice = %title, "Notice");
    }
}

#[derive(Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&self, event: &str, properties: serde_json::Value) {
        info!(target: "analytics", event = %event, properties = %properties, "track");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials() {
        let site = SiteRef::new(1, "alice");
        assert_eq!(
            StaticCredentials::new("abc").oauth_token(&site).as_deref(),
            Some("abc")
        );
        assert_eq!(StaticCredentials::none().oauth_token(&site), None);
    }

    #[test]
    fn test_env_credentials_missing_var() {
        let creds = EnvCredentials::new("AUTOMATED_TRANSFER_TEST_UNSET_TOKEN_VAR");
        assert_eq!(creds.oauth_token(&SiteRef::new(1, "alice")), None);
    }
}
