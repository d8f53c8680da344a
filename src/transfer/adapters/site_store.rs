//! In-memory local site store
//!
//! Keeps the records the app knows about, keyed by (site id, username),
//! and re-syncs a record from the REST site endpoint on demand.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{SiteRemote, SiteStore};
use crate::transfer::error::RemoteError;
use crate::transfer::types::{SiteRecord, SiteRef};

pub struct InMemorySiteStore {
    records: RwLock<HashMap<SiteRef, SiteRecord>>,
    remote: Arc<dyn SiteRemote>,
}

impl InMemorySiteStore {
    pub fn new(remote: Arc<dyn SiteRemote>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            remote,
        }
    }

    pub async fn insert(&self, record: SiteRecord) {
        self.records
            .write()
            .await
            .insert(record.site.clone(), record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SiteStore for InMemorySiteStore {
    async fn find_site(&self, site: &SiteRef) -> Option<SiteRecord> {
        self.records.read().await.get(site).cloned()
    }

    async fn sync_site(&self, record: &SiteRecord) -> Result<SiteRecord, RemoteError> {
        let fresh = self.remote.fetch_site(&record.site).await?;
        debug!(
            site_id = fresh.site.site_id,
            is_jetpack = fresh.is_jetpack,
            "Site record synced"
        );
        self.insert(fresh.clone()).await;
        Ok(fresh)
    }
}
