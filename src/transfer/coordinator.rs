//! Transfer Coordinator
//!
//! Drives one Automated Transfer attempt through its phases. Each call to
//! `step()` runs the current phase to completion (including its delayed
//! retries) and either advances the session or fails it. `execute()` loops
//! `step()` until a terminal phase.
//!
//! Terminal outcomes are surfaced exactly once, from `finish_succeeded` or
//! `finish_failed`. Retried failures never reach the user.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::adapters::{
    AnalyticsSink, PluginRemote, ProgressSink, SiteStore, TracingAnalytics, TransferRemote,
};
use super::error::{RemoteError, TransferError};
use super::events::{EventSender, TransferEvent};
use super::messages;
use super::retry::{RetryEffect, RetryEvent, RetryPolicy};
use super::session::TransferSession;
use super::state::TransferPhase;
use super::timer::CancelToken;
use super::types::{
    AttemptId, SitePlugins, TransferId, TransferOptions, TransferRequest, TransferStatus,
};

/// Shown right after the user confirms, before anything came back.
const KICKOFF_PROGRESS: f32 = 0.02;
/// Shown once the remote accepted the transfer. Real progress starts at
/// 1/total_steps.
const INITIATED_PROGRESS: f32 = 0.08;
const ALMOST_DONE_PROGRESS: f32 = 0.99;

/// Timing and retry configuration for the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Pause between two in-progress status polls
    pub refresh_interval_secs: u64,
    /// Pause between a successful initiation and the first poll
    pub initial_poll_delay_secs: u64,
    /// In-progress polls allowed before giving up
    pub max_polls: u32,
    /// Eligibility and initiation, only when retrying is requested
    pub short_retry: RetryPolicy,
    /// Status polling, site refresh and plugin reload
    pub long_retry: RetryPolicy,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 3,
            initial_poll_delay_secs: 3,
            max_polls: 200,
            short_retry: RetryPolicy::short(),
            long_retry: RetryPolicy::long(),
        }
    }
}

impl TransferConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn initial_poll_delay(&self) -> Duration {
        Duration::from_secs(self.initial_poll_delay_secs)
    }
}

/// Texts for the confirmation alert shown before an attempt starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub message: &'static str,
    pub cancel_label: &'static str,
    pub confirm_label: &'static str,
}

/// Handle for cancelling the attempts of a coordinator from elsewhere
#[derive(Debug, Clone)]
pub struct TransferHandle {
    cancel: CancelToken,
}

impl TransferHandle {
    /// Invalidate pending retries and polls. The running attempt ends as
    /// `Cancelled` at its next delay or phase boundary, and later attempts
    /// on the same coordinator are refused by `begin`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Summary of a successful attempt
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub attempt_id: AttemptId,
    pub transfer_id: Option<TransferId>,
    pub polls: u32,
    pub retry_history: Vec<(TransferPhase, u32)>,
    pub plugins: SitePlugins,
}

/// Transfer Coordinator - drives the phase sequence of one site/plugin
pub struct TransferCoordinator {
    remote: Arc<dyn TransferRemote>,
    plugins: Arc<dyn PluginRemote>,
    sites: Arc<dyn SiteStore>,
    progress: Arc<dyn ProgressSink>,
    analytics: Arc<dyn AnalyticsSink>,
    events: EventSender,
    config: TransferConfig,
    cancel: CancelToken,
}

impl TransferCoordinator {
    pub fn new(
        remote: Arc<dyn TransferRemote>,
        plugins: Arc<dyn PluginRemote>,
        sites: Arc<dyn SiteStore>,
        progress: Arc<dyn ProgressSink>,
        events: EventSender,
    ) -> Self {
        Self {
            remote,
            plugins,
            sites,
            progress,
            analytics: Arc::new(TracingAnalytics),
            events,
            config: TransferConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_config(mut self, config: TransferConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn handle(&self) -> TransferHandle {
        TransferHandle {
            cancel: self.cancel.clone(),
        }
    }

    pub fn confirmation_prompt(&self) -> ConfirmationPrompt {
        debug!("Prompting user for confirmation of transfer");
        ConfirmationPrompt {
            message: messages::INSTALL_FIRST_PLUGIN_PROMPT,
            cancel_label: messages::ALERT_CANCEL,
            confirm_label: messages::ALERT_INSTALL,
        }
    }

    /// Start an attempt after the user confirmed the prompt
    pub fn begin(
        &self,
        request: TransferRequest,
        options: TransferOptions,
    ) -> Result<TransferSession, TransferError> {
        request.validate()?;
        if self.cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let mut session = TransferSession::new(request, options);
        info!(
            attempt = %session.attempt_id,
            site = %session.request.site,
            plugin = %session.request.plugin.slug,
            retry_after_failure = options.retry_after_failure,
            "Kicking off Automated Transfer"
        );

        self.show_progress(&mut session, KICKOFF_PROGRESS, None);
        self.analytics.track(
            "automated_transfer_started",
            json!({
                "site_id": session.request.site.site_id,
                "plugin": session.request.plugin.slug,
            }),
        );
        Ok(session)
    }

    /// Run the current phase and move the session on.
    ///
    /// Returns the phase the session is in afterwards.
    pub async fn step(&self, session: &mut TransferSession) -> TransferPhase {
        let phase = session.phase();
        if phase.is_terminal() {
            return phase;
        }

        if self.cancel.is_cancelled() {
            self.finish_failed(session, TransferError::Cancelled);
            return session.phase();
        }

        debug!(attempt = %session.attempt_id, phase = %phase, "Running phase");
        let result = match phase {
            TransferPhase::CheckingEligibility => self.verify_eligibility(session).await,
            TransferPhase::Initiating => self.initiate(session).await,
            TransferPhase::Polling => self.poll_until_complete(session).await,
            TransferPhase::RefreshingSite => self.refresh_site(session).await,
            TransferPhase::ReloadingPlugins => self.reload_plugins(session).await,
            TransferPhase::Succeeded | TransferPhase::Failed => Ok(()),
        };

        match result {
            Ok(()) if self.cancel.is_cancelled() => {
                debug!(attempt = %session.attempt_id, phase = %phase, "Phase result dropped after cancel");
                self.finish_failed(session, TransferError::Cancelled);
            }
            Ok(()) => {
                let next = session.advance();
                debug!(attempt = %session.attempt_id, from = %phase, to = %next, "Phase complete");
                if next == TransferPhase::Succeeded {
                    self.finish_succeeded(session);
                }
            }
            Err(e) => self.finish_failed(session, e),
        }

        session.phase()
    }

    /// Run an attempt to a terminal phase
    pub async fn execute(
        &self,
        request: TransferRequest,
        options: TransferOptions,
    ) -> Result<TransferReport, TransferError> {
        let mut session = self.begin(request, options)?;

        while !session.phase().is_terminal() {
            self.step(&mut session).await;
        }

        match (session.phase(), session.error()) {
            (TransferPhase::Succeeded, _) => Ok(TransferReport {
                attempt_id: session.attempt_id,
                transfer_id: session.transfer_id().cloned(),
                polls: session.polls(),
                retry_history: session.retry_history().to_vec(),
                plugins: session.plugins().cloned().unwrap_or_default(),
            }),
            (_, Some(e)) => Err(e.clone()),
            (phase, None) => Err(TransferError::InvalidRequest(format!(
                "attempt stopped in {} without an error",
                phase
            ))),
        }
    }

    async fn verify_eligibility(&self, session: &mut TransferSession) -> Result<(), TransferError> {
        info!(attempt = %session.attempt_id, "Starting eligibility check");

        let remote = &self.remote;
        let site_id = session.request.site.site_id;
        let policy = session
            .options
            .retry_after_failure
            .then_some(&self.config.short_retry);

        self.with_retry(session, policy, move || async move {
            remote.check_eligibility(site_id).await.map_err(|e| {
                info!(site_id, error = %e, "Site ineligible");
                TransferError::from(e)
            })
        })
        .await?;

        info!(attempt = %session.attempt_id, "Site confirmed eligible");
        Ok(())
    }

    async fn initiate(&self, session: &mut TransferSession) -> Result<(), TransferError> {
        info!(attempt = %session.attempt_id, "Initiating Automated Transfer");

        let remote = &self.remote;
        let site_id = session.request.site.site_id;
        let slug = session.request.plugin.slug.clone();
        let slug = slug.as_str();
        let policy = session
            .options
            .retry_after_failure
            .then_some(&self.config.short_retry);

        let initiated = self
            .with_retry(session, policy, move || async move {
                remote.initiate(site_id, slug).await.map_err(TransferError::from)
            })
            .await?;

        info!(
            attempt = %session.attempt_id,
            transfer_id = %initiated.transfer_id,
            status = %initiated.status,
            "Started Automated Transfer"
        );
        session.set_transfer_id(initiated.transfer_id);
        self.show_progress(session, INITIATED_PROGRESS, None);

        self.cancel.sleep(self.config.initial_poll_delay()).await
    }

    async fn poll_until_complete(&self, session: &mut TransferSession) -> Result<(), TransferError> {
        let remote = &self.remote;
        let site_id = session.request.site.site_id;

        loop {
            if session.polls() >= self.config.max_polls {
                return Err(TransferError::PollLimitReached {
                    polls: session.polls(),
                });
            }

            let report = self
                .with_retry(session, Some(&self.config.long_retry), move || async move {
                    match remote.fetch_status(site_id).await {
                        Ok(report) if report.status == TransferStatus::Error => {
                            Err(TransferError::from(RemoteError::TransferErrorState))
                        }
                        Ok(report) => Ok(report),
                        Err(e) => Err(TransferError::from(e)),
                    }
                })
                .await?;

            session.record_report(&report);
            debug!(
                attempt = %session.attempt_id,
                status = %report.status,
                step = ?report.step,
                total_steps = ?report.total_steps,
                "Received status update"
            );

            if report.status == TransferStatus::Complete {
                info!(attempt = %session.attempt_id, "Remote transfer complete");
                self.show_progress(
                    session,
                    ALMOST_DONE_PROGRESS,
                    Some(messages::INSTALL_ALMOST_DONE),
                );
                return Ok(());
            }

            if let Some(fraction) = report.progress_fraction() {
                self.show_progress(session, fraction, None);
            }

            self.cancel.sleep(self.config.refresh_interval()).await?;
        }
    }

    async fn refresh_site(&self, session: &mut TransferSession) -> Result<(), TransferError> {
        info!(attempt = %session.attempt_id, "Refreshing site after transfer");

        let site = session.request.site.clone();
        let record = self.sites.find_site(&site).await.ok_or_else(|| {
            error!(site = %site, "No local record for site");
            TransferError::SiteNotFound {
                site_id: site.site_id,
                username: site.username.clone(),
            }
        })?;

        let sites = &self.sites;
        let record = &record;
        self.with_retry(session, Some(&self.config.long_retry), move || async move {
            sites.sync_site(record).await.map_err(TransferError::from)
        })
        .await?;

        info!(attempt = %session.attempt_id, "Site synced");
        Ok(())
    }

    async fn reload_plugins(&self, session: &mut TransferSession) -> Result<(), TransferError> {
        info!(attempt = %session.attempt_id, "Fetching site plugins");

        let plugins = &self.plugins;
        let site_id = session.request.site.site_id;
        let fetched = self
            .with_retry(session, Some(&self.config.long_retry), move || async move {
                plugins.get_plugins(site_id).await.map_err(TransferError::from)
            })
            .await?;

        debug!(
            attempt = %session.attempt_id,
            count = fetched.plugins.len(),
            installed = fetched.contains(&session.request.plugin.slug),
            "Fetched plugins"
        );
        session.set_plugins(fetched);
        Ok(())
    }

    /// Run `op`, retrying transient failures under `policy`.
    ///
    /// With no policy the first failure is returned as is.
    async fn with_retry<T, F, Fut>(
        &self,
        session: &mut TransferSession,
        policy: Option<&RetryPolicy>,
        mut op: F,
    ) -> Result<T, TransferError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransferError>>,
    {
        loop {
            let err = match op().await {
                Ok(value) => {
                    let effect = policy
                        .map(|p| session.apply_retry(p, RetryEvent::Succeeded))
                        .unwrap_or(RetryEffect::None);
                    if effect == RetryEffect::CancelPending {
                        debug!(attempt = %session.attempt_id, "Pending retry cancelled");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let Some(policy) = policy.filter(|_| err.is_transient()) else {
                return Err(err);
            };

            match session.apply_retry(policy, RetryEvent::Failed) {
                RetryEffect::Schedule { retry, delay } => {
                    warn!(
                        attempt = %session.attempt_id,
                        phase = %session.phase(),
                        retry,
                        retry_state = %session.retry_state().copied().unwrap_or_default(),
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "Transient failure, retrying"
                    );
                    self.cancel.sleep(delay).await?;
                    session.apply_retry(policy, RetryEvent::Fired);
                }
                RetryEffect::GiveUp { retries } => {
                    warn!(
                        attempt = %session.attempt_id,
                        phase = %session.phase(),
                        retries,
                        error = %err,
                        "Retries exhausted"
                    );
                    return Err(match err {
                        TransferError::Ineligible(_) => err,
                        _ if retries == 0 => err,
                        _ => TransferError::RetriesExhausted {
                            phase: session.phase(),
                            attempts: retries + 1,
                        },
                    });
                }
                RetryEffect::None | RetryEffect::CancelPending => return Err(err),
            }
        }
    }

    fn show_progress(&self, session: &mut TransferSession, fraction: f32, message: Option<&str>) {
        session.record_progress(fraction);
        let title;
        let message = match message {
            Some(m) => m,
            None => {
                title = messages::progress_title(&session.request.plugin.name);
                title.as_str()
            }
        };
        self.progress.show_progress(fraction, message);
    }

    fn finish_succeeded(&self, session: &mut TransferSession) {
        info!(
            attempt = %session.attempt_id,
            polls = session.polls(),
            elapsed_ms = session.elapsed().num_milliseconds(),
            "Automated Transfer complete"
        );

        let plugins = session.plugins().cloned().unwrap_or_default();
        self.events.dispatch(TransferEvent::PluginsReceived {
            site: session.request.site.clone(),
            plugins,
        });
        self.events.dispatch(TransferEvent::Finished {
            attempt_id: session.attempt_id,
            succeeded: true,
        });

        self.progress.dismiss();
        self.progress
            .post_notice(&messages::success(&session.request.plugin.name));
        self.analytics.track(
            "automated_transfer_succeeded",
            json!({
                "site_id": session.request.site.site_id,
                "plugin": session.request.plugin.slug,
                "polls": session.polls(),
            }),
        );
    }

    fn finish_failed(&self, session: &mut TransferSession, err: TransferError) {
        error!(
            attempt = %session.attempt_id,
            phase = %session.phase(),
            code = err.code(),
            error = %err,
            elapsed_ms = session.elapsed().num_milliseconds(),
            "Automated Transfer failed"
        );

        self.progress.dismiss();
        if let Some(title) = err.notice_title(&session.request.plugin.name) {
            self.progress.post_notice(&title);
        }
        self.analytics.track(
            "automated_transfer_failed",
            json!({
                "site_id": session.request.site.site_id,
                "plugin": session.request.plugin.slug,
                "phase": session.phase().as_str(),
                "error": err.code(),
            }),
        );
        self.events.dispatch(TransferEvent::Finished {
            attempt_id: session.attempt_id,
            succeeded: false,
        });
        session.fail(err);
    }
}
