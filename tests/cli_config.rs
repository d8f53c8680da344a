use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use automated_transfer::config::AppConfig;
use automated_transfer::transfer::adapters::{
    InMemorySiteStore, PluginRemote, ProgressSink, RestClient, SiteRemote, SiteStore,
    StaticCredentials, TransferRemote,
};
use automated_transfer::transfer::{
    EligibilityError, EligibilityRejectionReason, PluginEntry, RemoteError, SitePlugins,
    SiteRecord, SiteRef, StatusReport, TransferCoordinator, TransferError, TransferId,
    TransferOptions, TransferRequest, TransferStatus, event_channel,
};
use automated_transfer::transfer::types::InitiatedTransfer;

/// Remote that is always eligible and reports a fixed sequence of statuses
struct ScriptedRemote {
    eligible: bool,
    statuses: Mutex<Vec<TransferStatus>>,
}

impl ScriptedRemote {
    fn new(eligible: bool, mut statuses: Vec<TransferStatus>) -> Self {
        statuses.reverse();
        Self {
            eligible,
            statuses: Mutex::new(statuses),
        }
    }
}

#[async_trait]
impl TransferRemote for ScriptedRemote {
    async fn check_eligibility(&self, _site_id: u64) -> Result<(), EligibilityError> {
        if self.eligible {
            Ok(())
        } else {
            Err(EligibilityError::Rejected(
                EligibilityRejectionReason::from_code("no_business_plan"),
            ))
        }
    }

    async fn initiate(
        &self,
        _site_id: u64,
        _plugin_slug: &str,
    ) -> Result<InitiatedTransfer, RemoteError> {
        Ok(InitiatedTransfer {
            transfer_id: TransferId("77".into()),
            status: TransferStatus::InProgress,
        })
    }

    async fn fetch_status(&self, _site_id: u64) -> Result<StatusReport, RemoteError> {
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(TransferStatus::Complete);
        Ok(StatusReport::new(status))
    }
}

#[async_trait]
impl PluginRemote for ScriptedRemote {
    async fn get_plugins(&self, _site_id: u64) -> Result<SitePlugins, RemoteError> {
        Ok(SitePlugins::default())
    }
}

#[async_trait]
impl SiteRemote for ScriptedRemote {
    async fn fetch_site(&self, site: &SiteRef) -> Result<SiteRecord, RemoteError> {
        let mut record = SiteRecord::new(site.clone());
        record.is_jetpack = true;
        Ok(record)
    }
}

#[derive(Default)]
struct Notices(Mutex<Vec<String>>);

impl ProgressSink for Notices {
    fn show_progress(&self, _fraction: f32, _message: &str) {}

    fn dismiss(&self) {}

    fn post_notice(&self, title: &str) {
        self.0.lock().unwrap().push(title.to_string());
    }
}

fn request() -> TransferRequest {
    TransferRequest::new(
        SiteRef::new(9001, "bob"),
        PluginEntry::new("jetpack", "Jetpack"),
    )
}

#[test]
fn test_dev_config_loads() {
    let config = AppConfig::load("dev").unwrap();
    assert_eq!(config.rotation, "daily");
    assert_eq!(config.transfer.short_retry.delays_secs, vec![3]);
    assert_eq!(config.transfer.short_retry.max_retries, 14);
    assert_eq!(config.transfer.long_retry.delays_secs, vec![3, 5, 10]);
    assert_eq!(config.transfer.long_retry.max_retries, 20);
}

#[test]
fn test_missing_credentials_fail_before_network() {
    let config = AppConfig::load("dev").unwrap();
    let result = RestClient::for_site(&config.api, &StaticCredentials::none(), &request().site);
    assert!(matches!(result, Err(TransferError::MissingCredentials(9001))));
}

#[tokio::test(start_paused = true)]
async fn test_public_api_end_to_end() {
    let remote = Arc::new(ScriptedRemote::new(
        true,
        vec![TransferStatus::InProgress, TransferStatus::InProgress],
    ));
    let sites = Arc::new(InMemorySiteStore::new(remote.clone()));
    sites.insert(SiteRecord::new(request().site)).await;
    let notices = Arc::new(Notices::default());
    let (events, _rx) = event_channel();

    let coordinator =
        TransferCoordinator::new(remote.clone(), remote, sites.clone(), notices.clone(), events);
    let report = coordinator
        .execute(request(), TransferOptions::default())
        .await
        .unwrap();

    assert_eq!(report.polls, 3);
    assert_eq!(report.transfer_id, Some(TransferId("77".into())));
    assert_eq!(
        *notices.0.lock().unwrap(),
        vec!["Successfully installed Jetpack.".to_string()]
    );

    let record = sites.find_site(&request().site).await.unwrap();
    assert!(record.is_jetpack);
}

#[tokio::test(start_paused = true)]
async fn test_public_api_ineligible_site() {
    let remote = Arc::new(ScriptedRemote::new(false, Vec::new()));
    let sites = Arc::new(InMemorySiteStore::new(remote.clone()));
    let notices = Arc::new(Notices::default());
    let (events, _rx) = event_channel();

    let coordinator =
        TransferCoordinator::new(remote.clone(), remote, sites, notices.clone(), events);
    let err = coordinator
        .execute(request(), TransferOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::Ineligible(EligibilityRejectionReason::NoBusinessPlan)
    ));
    assert_eq!(
        *notices.0.lock().unwrap(),
        vec!["Plugin feature requires a business plan.".to_string()]
    );
}
