//! Sync entry point used by the HTTP layer and the CLI

use crate::loader;
use crate::registry::SyncerRegistry;
use crate::request::{ScopeFilter, SyncRequest};
use hcm_cloud::{
    CloudError, DataService, Kit, ResourceKind, ResourceRef, Result, SyncResult, SyncSummary,
    Vendor,
};
use std::sync::Arc;
use std::time::Instant;

/// Runs sync passes through the registry
#[derive(Clone)]
pub struct SyncEngine {
    registry: Arc<SyncerRegistry>,
    data: Arc<dyn DataService>,
}

impl SyncEngine {
    pub fn new(registry: Arc<SyncerRegistry>, data: Arc<dyn DataService>) -> Self {
        Self { registry, data }
    }

    pub fn registry(&self) -> &SyncerRegistry {
        &self.registry
    }

    /// One reconciliation pass over one scope
    pub async fn sync(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        req: &SyncRequest,
    ) -> Result<SyncResult> {
        self.sync_scopes(kt, vendor, kind, std::slice::from_ref(req)).await
    }

    /// Sync several scopes one after another; the first failure stops the rest
    pub async fn sync_scopes(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        reqs: &[SyncRequest],
    ) -> Result<SyncResult> {
        let syncer = self.registry.get(vendor, kind)?;
        let started = Instant::now();

        let mut summary = SyncSummary::default();
        for req in reqs {
            let pass = syncer.sync(kt, req).await?;
            summary.merge(&pass);
        }

        let mut result = SyncResult::new(vendor, kind, summary);
        result.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            rid = %kt.rid, %vendor, %kind, task_id = %result.task_id,
            scopes = reqs.len(), duration_ms = result.duration_ms, "sync task done"
        );
        Ok(result)
    }

    /// Sync a single resource just created in the cloud and return its DB row
    pub async fn sync_created(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        scope: &SyncRequest,
        cloud_id: &str,
    ) -> Result<ResourceRef> {
        let req = scope.narrowed(vec![cloud_id.to_string()]);
        self.sync(kt, vendor, kind, &req).await?;

        let filter = ScopeFilter::account(vendor, &scope.account_id)
            .eq("cloud_id", cloud_id)
            .build();
        loader::load_refs(self.data.as_ref(), kt, kind, vendor, filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CloudError::ResourceNotFound(format!(
                    "{} {} {} not in db after sync",
                    vendor, kind, cloud_id
                ))
            })
    }
}
