//! WordPress.com REST Client
//!
//! Authenticated JSON client for the Automated Transfer, plugins and site
//! endpoints. Responses are decoded into the closed domain types here, so
//! nothing past this module sees raw status strings or error bodies.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{CredentialsProvider, PluginRemote, SiteRemote, TransferRemote};
use crate::config::ApiConfig;
use crate::transfer::error::{
    EligibilityError, EligibilityRejectionReason, RemoteError, TransferError,
};
use crate::transfer::types::{
    InitiatedTransfer, PluginCapabilities, SitePlugin, SitePlugins, SiteRecord, SiteRef,
    StatusReport, TransferId, TransferStatus,
};

const API_V1_1: &str = "v1.1";
const API_V1_2: &str = "v1.2";

pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// `{"error": "...", "message": "..."}`
#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct EligibilityResponse {
    is_eligible: bool,
    #[serde(default)]
    errors: Vec<EligibilityErrorEntry>,
}

#[derive(Deserialize, Debug)]
struct EligibilityErrorEntry {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct InitiateBody<'a> {
    plugin: &'a str,
}

#[derive(Deserialize, Debug)]
struct InitiateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    transfer_id: serde_json::Value,
}

#[derive(Deserialize, Debug)]
struct StatusResponse {
    #[serde(default)]
    status: String,
    step: Option<u32>,
    total: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct PluginsResponse {
    plugins: Vec<PluginEntryResponse>,
    file_mod_capabilities: CapabilitiesResponse,
}

#[derive(Deserialize, Debug)]
struct PluginEntryResponse {
    name: String,
    slug: String,
    active: bool,
    autoupdate: bool,
    display_name: String,
    author: String,
    version: Option<String>,
    update: Option<PluginUpdateResponse>,
}

#[derive(Deserialize, Debug)]
struct PluginUpdateResponse {
    new_version: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CapabilitiesResponse {
    modify_files: bool,
    autoupdate_files: bool,
}

#[derive(Deserialize, Debug)]
struct SiteResponse {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "URL")]
    url: String,
    #[serde(default)]
    jetpack: bool,
    #[serde(default)]
    plan: Option<PlanResponse>,
}

#[derive(Deserialize, Debug)]
struct PlanResponse {
    product_slug: Option<String>,
}

impl RestClient {
    pub fn new(config: &ApiConfig, token: String) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build a client authenticated for `site`. Fails when no token is
    /// available, before any network call is made.
    pub fn for_site(
        config: &ApiConfig,
        credentials: &dyn CredentialsProvider,
        site: &SiteRef,
    ) -> Result<Self, TransferError> {
        let token = credentials.oauth_token(site).ok_or_else(|| {
            info!(site_id = site.site_id, "No credentials for site, bailing");
            TransferError::MissingCredentials(site.site_id)
        })?;

        Ok(Self::new(config, token)?)
    }

    fn url(&self, version: &str, endpoint: &str) -> String {
        format!("{}/rest/{}/{}", self.base_url, version, endpoint)
    }

    async fn get<R: DeserializeOwned>(&self, version: &str, endpoint: &str) -> Result<R, RemoteError> {
        let url = self.url(version, endpoint);
        debug!(url = %url, "GET");
        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        decode_response(response).await
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        version: &str,
        endpoint: &str,
        body: &B,
    ) -> Result<R, RemoteError> {
        let url = self.url(version, endpoint);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        decode_response(response).await
    }
}

async fn decode_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, RemoteError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn api_error(status: u16, body: &str) -> RemoteError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => RemoteError::Api {
            status,
            code: err.error,
            message: err.message,
        },
        Err(_) => RemoteError::Api {
            status,
            code: "unknown".to_string(),
            message: body.chars().take(200).collect(),
        },
    }
}

fn eligibility_result(response: EligibilityResponse) -> Result<(), EligibilityError> {
    if response.is_eligible {
        return Ok(());
    }

    let reason = response
        .errors
        .first()
        .map(|e| {
            debug!(code = %e.code, message = %e.message, "Eligibility error");
            EligibilityRejectionReason::from_code(&e.code)
        })
        .unwrap_or(EligibilityRejectionReason::Unknown);
    Err(EligibilityError::Rejected(reason))
}

fn initiated_transfer(response: InitiateResponse) -> Result<InitiatedTransfer, RemoteError> {
    if !response.success {
        return Err(RemoteError::Decode(
            "initiate response did not report success".to_string(),
        ));
    }

    let transfer_id = match response.transfer_id {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) if !s.is_empty() => s,
        other => {
            return Err(RemoteError::Decode(format!(
                "unexpected transfer_id: {}",
                other
            )));
        }
    };

    Ok(InitiatedTransfer {
        transfer_id: TransferId(transfer_id),
        status: TransferStatus::from_remote(&response.status),
    })
}

fn status_report(response: StatusResponse) -> StatusReport {
    StatusReport {
        status: TransferStatus::from_remote(&response.status),
        step: response.step,
        total_steps: response.total,
    }
}

fn site_plugins(response: PluginsResponse) -> SitePlugins {
    let plugins = response
        .plugins
        .into_iter()
        .map(|p| SitePlugin {
            id: p.name,
            slug: p.slug,
            active: p.active,
            name: p.display_name,
            author: p.author,
            version: p.version.filter(|v| !v.is_empty()),
            autoupdate: p.autoupdate,
            update_available: p.update.and_then(|u| u.new_version),
        })
        .collect();

    SitePlugins {
        plugins,
        capabilities: PluginCapabilities {
            modify_files: response.file_mod_capabilities.modify_files,
            autoupdate_files: response.file_mod_capabilities.autoupdate_files,
        },
    }
}

fn site_record(site: &SiteRef, response: SiteResponse) -> SiteRecord {
    SiteRecord {
        site: site.clone(),
        name: response.name,
        url: response.url,
        is_jetpack: response.jetpack,
        plan_slug: response.plan.and_then(|p| p.product_slug),
        synced_at: Some(chrono::Utc::now()),
    }
}

#[async_trait]
impl TransferRemote for RestClient {
    async fn check_eligibility(&self, site_id: u64) -> Result<(), EligibilityError> {
        let endpoint = format!("sites/{}/automated-transfers/eligibility", site_id);
        let response: EligibilityResponse = self.get(API_V1_1, &endpoint).await?;
        eligibility_result(response)
    }

    async fn initiate(
        &self,
        site_id: u64,
        plugin_slug: &str,
    ) -> Result<InitiatedTransfer, RemoteError> {
        let endpoint = format!("sites/{}/automated-transfers/initiate", site_id);
        let body = InitiateBody {
            plugin: plugin_slug,
        };
        let response: InitiateResponse = self.post(API_V1_1, &endpoint, &body).await?;
        initiated_transfer(response)
    }

    async fn fetch_status(&self, site_id: u64) -> Result<StatusReport, RemoteError> {
        let endpoint = format!("sites/{}/automated-transfers/status", site_id);
        let response: StatusResponse = self.get(API_V1_1, &endpoint).await?;
        debug!(site_id, raw_status = %response.status, "Transfer status");
        Ok(status_report(response))
    }
}

#[async_trait]
impl PluginRemote for RestClient {
    async fn get_plugins(&self, site_id: u64) -> Result<SitePlugins, RemoteError> {
        let endpoint = format!("sites/{}/plugins", site_id);
        let response: PluginsResponse = self.get(API_V1_2, &endpoint).await?;
        Ok(site_plugins(response))
    }
}

#[async_trait]
impl SiteRemote for RestClient {
    async fn fetch_site(&self, site: &SiteRef) -> Result<SiteRecord, RemoteError> {
        let endpoint = format!("sites/{}", site.site_id);
        let response: SiteResponse = self.get(API_V1_1, &endpoint).await?;
        Ok(site_record(site, response))
    }
}
