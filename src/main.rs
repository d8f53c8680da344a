//! Automated Transfer CLI
//!
//! Runs one transfer attempt for a site/plugin pair against the REST API.
//!
//! ```text
//! ┌──────────┐    ┌─────────────┐    ┌───────────┐    ┌──────────┐
//! │  Config  │───▶│ Eligibility │───▶│  Initiate │───▶│   Poll   │
//! │  (YAML)  │    │   (retry?)  │    │  (retry?) │    │ (retry)  │
//! └──────────┘    └─────────────┘    └───────────┘    └────┬─────┘
//!                                                          ▼
//!                                   ┌──────────┐    ┌─────────────┐
//!                                   │ Plugins  │◀───│ Site sync   │
//!                                   └──────────┘    └─────────────┘
//! ```
//!
//! The OAuth token is read from `WPCOM_OAUTH_TOKEN`.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use automated_transfer::config::AppConfig;
use automated_transfer::transfer::adapters::{
    EnvCredentials, InMemorySiteStore, RestClient, TracingProgress,
};
use automated_transfer::transfer::{
    PluginEntry, SiteRecord, SiteRef, TransferCoordinator, TransferEvent, TransferOptions,
    TransferRequest, event_channel,
};

const TOKEN_VAR: &str = "WPCOM_OAUTH_TOKEN";

/// Value following `flag`, if any
fn get_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn get_env(args: &[String]) -> String {
    get_arg(args, "--env")
        .or_else(|| get_arg(args, "-e"))
        .unwrap_or_else(|| "dev".to_string())
}

fn parse_request(args: &[String]) -> Result<TransferRequest> {
    let site_id: u64 = get_arg(args, "--site")
        .context("missing --site <id>")?
        .parse()
        .context("--site must be a numeric site id")?;
    let Some(username) = get_arg(args, "--username") else {
        bail!("missing --username <name>");
    };
    let Some(slug) = get_arg(args, "--plugin") else {
        bail!("missing --plugin <slug>");
    };
    let name = get_arg(args, "--name").unwrap_or_else(|| slug.clone());

    Ok(TransferRequest::new(
        SiteRef::new(site_id, username),
        PluginEntry::new(slug, name),
    ))
}

async fn run(args: Vec<String>) -> Result<()> {
    let env = get_env(&args);
    let app_config = AppConfig::load(&env).context("loading config")?;
    let _log_guard = automated_transfer::logging::init_logging(&app_config);

    tracing::info!("Starting Automated Transfer client in {} mode", env);

    let request = parse_request(&args)?;
    let options = TransferOptions {
        retry_after_failure: args.iter().any(|a| a == "--retry-after-failure"),
    };

    let credentials = EnvCredentials::new(TOKEN_VAR);
    let client = Arc::new(RestClient::for_site(
        &app_config.api,
        &credentials,
        &request.site,
    )?);

    let sites = Arc::new(InMemorySiteStore::new(client.clone()));
    sites.insert(SiteRecord::new(request.site.clone())).await;

    let (events, mut event_rx) = event_channel();
    let event_logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                TransferEvent::PluginsReceived { site, plugins } => {
                    tracing::info!(site = %site, count = plugins.plugins.len(), "Plugins received");
                }
                TransferEvent::Finished {
                    attempt_id,
                    succeeded,
                } => {
                    tracing::info!(attempt = %attempt_id, succeeded, "Attempt finished");
                }
            }
        }
    });

    let coordinator = TransferCoordinator::new(
        client.clone(),
        client,
        sites,
        Arc::new(TracingProgress),
        events,
    )
    .with_config(app_config.transfer.clone());

    let prompt = coordinator.confirmation_prompt();
    tracing::info!("{}", prompt.message);

    let handle = coordinator.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling transfer");
            handle.cancel();
        }
    });

    let result = coordinator.execute(request, options).await;
    drop(coordinator);
    let _ = event_logger.await;

    let report = result?;
    tracing::info!(
        attempt = %report.attempt_id,
        polls = report.polls,
        plugins = report.plugins.plugins.len(),
        "Transfer succeeded"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
