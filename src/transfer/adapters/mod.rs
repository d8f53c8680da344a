//! Boundary Adapters
//!
//! Traits for every collaborator the coordinator talks to. The coordinator
//! only ever holds `Arc<dyn Trait>` so the REST client, the local store and
//! the UI surface can be swapped for test doubles.

pub mod rest;
pub mod sinks;
pub mod site_store;

pub use rest::RestClient;
pub use sinks::{EnvCredentials, StaticCredentials, TracingAnalytics, TracingProgress};
pub use site_store::InMemorySiteStore;

use async_trait::async_trait;

use super::error::{EligibilityError, RemoteError};
use super::types::{InitiatedTransfer, SiteRecord, SiteRef, SitePlugins, StatusReport};

/// Remote Automated Transfer endpoints
#[async_trait]
pub trait TransferRemote: Send + Sync {
    /// Pre-flight check. `Ok(())` means the site may be transferred.
    async fn check_eligibility(&self, site_id: u64) -> Result<(), EligibilityError>;

    /// Start the transfer for an eligible site
    async fn initiate(
        &self,
        site_id: u64,
        plugin_slug: &str,
    ) -> Result<InitiatedTransfer, RemoteError>;

    /// Current status of the site's transfer
    async fn fetch_status(&self, site_id: u64) -> Result<StatusReport, RemoteError>;
}

/// Installed-plugins endpoint
#[async_trait]
pub trait PluginRemote: Send + Sync {
    async fn get_plugins(&self, site_id: u64) -> Result<SitePlugins, RemoteError>;
}

/// Site metadata endpoint used by the local store to re-sync a record
#[async_trait]
pub trait SiteRemote: Send + Sync {
    async fn fetch_site(&self, site: &SiteRef) -> Result<SiteRecord, RemoteError>;
}

/// Local store of site records
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Look up the local record by remote site id and username
    async fn find_site(&self, site: &SiteRef) -> Option<SiteRecord>;

    /// Pull the latest metadata for `record` and store it
    async fn sync_site(&self, record: &SiteRecord) -> Result<SiteRecord, RemoteError>;
}

pub trait CredentialsProvider: Send + Sync {
    /// OAuth token for the account owning `site`, if any
    fn oauth_token(&self, site: &SiteRef) -> Option<String>;
}

/// Progress indicator and notice surface. Rendering is up to the caller.
pub trait ProgressSink: Send + Sync {
    fn show_progress(&self, fraction: f32, message: &str);
    fn dismiss(&self);
    fn post_notice(&self, title: &str);
}

/// Fire-and-forget analytics
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &str, properties: serde_json::Value);
}

/// Scripted adapters for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::transfer::types::{TransferId, TransferStatus};

    /// Remote with queued responses per endpoint. An empty queue answers
    /// with the configured default (success / complete).
    pub struct MockRemote {
        eligibility: Mutex<VecDeque<Result<(), EligibilityError>>>,
        initiate: Mutex<VecDeque<Result<InitiatedTransfer, RemoteError>>>,
        status: Mutex<VecDeque<Result<StatusReport, RemoteError>>>,
        plugins: Mutex<VecDeque<Result<SitePlugins, RemoteError>>>,
        default_status: Mutex<StatusReport>,
        plugins_hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
        eligibility_count: AtomicUsize,
        initiate_count: AtomicUsize,
        status_count: AtomicUsize,
        plugins_count: AtomicUsize,
    }

    impl MockRemote {
        pub fn new() -> Self {
            Self {
                eligibility: Mutex::new(VecDeque::new()),
                initiate: Mutex::new(VecDeque::new()),
                status: Mutex::new(VecDeque::new()),
                plugins: Mutex::new(VecDeque::new()),
                default_status: Mutex::new(StatusReport::new(TransferStatus::Complete)),
                plugins_hook: Mutex::new(None),
                eligibility_count: AtomicUsize::new(0),
                initiate_count: AtomicUsize::new(0),
                status_count: AtomicUsize::new(0),
                plugins_count: AtomicUsize::new(0),
            }
        }

        pub fn push_eligibility(&self, result: Result<(), EligibilityError>) {
            self.eligibility.lock().unwrap().push_back(result);
        }

        pub fn push_initiate(&self, result: Result<InitiatedTransfer, RemoteError>) {
            self.initiate.lock().unwrap().push_back(result);
        }

        pub fn push_status(&self, result: Result<StatusReport, RemoteError>) {
            self.status.lock().unwrap().push_back(result);
        }

        pub fn push_plugins(&self, result: Result<SitePlugins, RemoteError>) {
            self.plugins.lock().unwrap().push_back(result);
        }

        pub fn set_default_status(&self, report: StatusReport) {
            *self.default_status.lock().unwrap() = report;
        }

        /// Run `hook` while a plugins request is in flight
        pub fn on_get_plugins(&self, hook: impl Fn() + Send + Sync + 'static) {
            *self.plugins_hook.lock().unwrap() = Some(Box::new(hook));
        }

        pub fn eligibility_count(&self) -> usize {
            self.eligibility_count.load(Ordering::SeqCst)
        }

        pub fn initiate_count(&self) -> usize {
            self.initiate_count.load(Ordering::SeqCst)
        }

        pub fn status_count(&self) -> usize {
            self.status_count.load(Ordering::SeqCst)
        }

        pub fn plugins_count(&self) -> usize {
            self.plugins_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferRemote for MockRemote {
        async fn check_eligibility(&self, _site_id: u64) -> Result<(), EligibilityError> {
            self.eligibility_count.fetch_add(1, Ordering::SeqCst);
            self.eligibility.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn initiate(
            &self,
            _site_id: u64,
            _plugin_slug: &str,
        ) -> Result<InitiatedTransfer, RemoteError> {
            self.initiate_count.fetch_add(1, Ordering::SeqCst);
            self.initiate.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(InitiatedTransfer {
                    transfer_id: TransferId("1001".to_string()),
                    status: TransferStatus::InProgress,
                })
            })
        }

        async fn fetch_status(&self, _site_id: u64) -> Result<StatusReport, RemoteError> {
            self.status_count.fetch_add(1, Ordering::SeqCst);
            let queued = self.status.lock().unwrap().pop_front();
            queued.unwrap_or_else(|| Ok(*self.default_status.lock().unwrap()))
        }
    }

    #[async_trait]
    impl PluginRemote for MockRemote {
        async fn get_plugins(&self, _site_id: u64) -> Result<SitePlugins, RemoteError> {
            self.plugins_count.fetch_add(1, Ordering::SeqCst);
            if let Some(hook) = self.plugins_hook.lock().unwrap().as_ref() {
                hook();
            }
            self.plugins
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SitePlugins::default()))
        }
    }

    /// Local store with scripted sync failures
    pub struct MockSiteStore {
        records: Mutex<HashMap<SiteRef, SiteRecord>>,
        sync_results: Mutex<VecDeque<Result<(), RemoteError>>>,
        find_count: AtomicUsize,
        sync_count: AtomicUsize,
    }

    impl MockSiteStore {
        pub fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                sync_results: Mutex::new(VecDeque::new()),
                find_count: AtomicUsize::new(0),
                sync_count: AtomicUsize::new(0),
            }
        }

        pub fn with_site(site: SiteRef) -> Self {
            let store = Self::new();
            store
                .records
                .lock()
                .unwrap()
                .insert(site.clone(), SiteRecord::new(site));
            store
        }

        pub fn push_sync(&self, result: Result<(), RemoteError>) {
            self.sync_results.lock().unwrap().push_back(result);
        }

        pub fn find_count(&self) -> usize {
            self.find_count.load(Ordering::SeqCst)
        }

        pub fn sync_count(&self) -> usize {
            self.sync_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SiteStore for MockSiteStore {
        async fn find_site(&self, site: &SiteRef) -> Option<SiteRecord> {
            self.find_count.fetch_add(1, Ordering::SeqCst);
            self.records.lock().unwrap().get(site).cloned()
        }

        async fn sync_site(&self, record: &SiteRecord) -> Result<SiteRecord, RemoteError> {
            self.sync_count.fetch_add(1, Ordering::SeqCst);
            let result = self.sync_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
            result.map(|_| {
                let mut synced = record.clone();
                synced.is_jetpack = true;
                synced
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum SinkCall {
        Progress(f32, String),
        Dismiss,
        Notice(String),
    }

    /// Records every call made to the progress surface
    pub struct RecordingSink {
        calls: Mutex<Vec<SinkCall>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<SinkCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn notices(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    SinkCall::Notice(title) => Some(title),
                    _ => None,
                })
                .collect()
        }

        pub fn progress_values(&self) -> Vec<f32> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    SinkCall::Progress(fraction, _) => Some(fraction),
                    _ => None,
                })
                .collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn show_progress(&self, fraction: f32, message: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(SinkCall::Progress(fraction, message.to_string()));
        }

        fn dismiss(&self) {
            self.calls.lock().unwrap().push(SinkCall::Dismiss);
        }

        fn post_notice(&self, title: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(SinkCall::Notice(title.to_string()));
        }
    }

    pub struct RecordingAnalytics {
        events: Mutex<Vec<String>>,
    }

    impl RecordingAnalytics {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AnalyticsSink for RecordingAnalytics {
        fn track(&self, event: &str, _properties: serde_json::Value) {
            self.events.lock().unwrap().push(event.to_string());
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_remote_queues_then_defaults() {
            let remote = MockRemote::new();
            remote.push_status(Err(RemoteError::Transport("down".into())));

            assert!(remote.fetch_status(1).await.is_err());
            let report = remote.fetch_status(1).await.unwrap();
            assert_eq!(report.status, TransferStatus::Complete);
            assert_eq!(remote.status_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_site_store_lookup() {
            let site = SiteRef::new(7, "alice");
            let store = MockSiteStore::with_site(site.clone());

            assert!(store.find_site(&site).await.is_some());
            assert!(store.find_site(&SiteRef::new(7, "bob")).await.is_none());
            assert_eq!(store.find_count(), 2);
        }
    }
}
