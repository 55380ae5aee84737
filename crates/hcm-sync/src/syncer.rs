//! Syncer traits
//!
//! A vendor/kind pair implements [`ResourceSyncer`], which supplies the
//! individual steps. The pass itself (list, load, diff, write, sweep) is
//! written once in the blanket [`Syncer`] impl.

use crate::diff::{self, Changed};
use crate::loader;
use crate::request::SyncRequest;
use crate::sweep;
use crate::writer;
use async_trait::async_trait;
use hcm_cloud::{
    ActionType, CloudError, CloudItem, CloudResource, CreateReq, DataService, Expression, Kit,
    MAX_CLOUD_ID_FILTER, ResourceKind, ResourceSpec, Result, SyncSummary, UpdateReq, Vendor,
    VendorExtension,
};
use std::collections::{HashMap, HashSet};

/// Cloud item of the extension's resource kind
pub type Item<E> = CloudItem<<E as VendorExtension>::Spec, E>;

/// DB row of the extension's resource kind
pub type Row<E> = CloudResource<<E as VendorExtension>::Spec, E>;

/// How a stale row is confirmed gone before deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStrategy {
    /// Delete without asking the cloud again
    NoConfirm,
    /// List the candidates again; any survivor aborts the delete
    Relist,
    /// Fetch every candidate; only a clean not-found deletes it
    DirectLookup,
}

/// Steps of one vendor/kind reconciliation
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    type Ext: VendorExtension;

    fn data(&self) -> &dyn DataService;

    /// Bound on `cloud_ids` / `cloud_cvm_ids`
    fn id_filter_limit(&self) -> usize {
        MAX_CLOUD_ID_FILTER
    }

    fn validate(&self, req: &SyncRequest) -> Result<()> {
        req.validate(self.id_filter_limit())
    }

    /// Everything the cloud reports for the request, all pages drained
    async fn list(&self, kt: &Kit, req: &SyncRequest) -> Result<Vec<Item<Self::Ext>>>;

    /// DB filter selecting the rows the request is authoritative for
    fn db_scope(&self, req: &SyncRequest) -> Expression;

    async fn list_db(
        &self,
        kt: &Kit,
        req: &SyncRequest,
    ) -> Result<HashMap<String, Row<Self::Ext>>> {
        loader::load_rows::<Self::Ext>(self.data(), kt, self.db_scope(req)).await
    }

    fn is_changed(&self, cloud: &Item<Self::Ext>, db: &Row<Self::Ext>) -> bool;

    async fn create(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        items: Vec<Item<Self::Ext>>,
    ) -> Result<Vec<String>> {
        let reqs = items
            .into_iter()
            .map(|item| CreateReq::from_item(req.account_id.clone(), item))
            .collect();
        writer::create_rows::<Self::Ext>(self.data(), kt, reqs).await
    }

    async fn update(
        &self,
        kt: &Kit,
        _req: &SyncRequest,
        items: Vec<Changed<Self::Ext>>,
    ) -> Result<()> {
        let reqs = items
            .into_iter()
            .map(|changed| UpdateReq::from_item(changed.db.id, changed.cloud))
            .collect();
        writer::update_rows::<Self::Ext>(self.data(), kt, reqs).await
    }

    fn confirm_strategy(&self) -> ConfirmStrategy;

    /// Fetch one stale candidate from the cloud; `Err(ResourceNotFound)` when gone
    async fn lookup(&self, _kt: &Kit, _req: &SyncRequest, row: &Row<Self::Ext>) -> Result<()> {
        Err(CloudError::InvalidParameter(format!(
            "{} {} does not support direct lookup",
            Self::Ext::VENDOR,
            row.cloud_id
        )))
    }

    /// Confirm and delete stale rows, returning how many were deleted
    async fn delete(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        candidates: Vec<Row<Self::Ext>>,
    ) -> Result<usize> {
        sweep::delete_stale(self, kt, req, candidates).await
    }
}

/// Object-safe face of a syncer, kept in the registry
#[async_trait]
pub trait Syncer: Send + Sync {
    fn vendor(&self) -> Vendor;

    fn kind(&self) -> ResourceKind;

    /// Reject a request before any lease or cloud call is made
    fn validate_request(&self, req: &SyncRequest) -> Result<()>;

    /// Run one reconciliation pass
    async fn sync(&self, kt: &Kit, req: &SyncRequest) -> Result<SyncSummary>;
}

#[async_trait]
impl<T: ResourceSyncer> Syncer for T {
    fn vendor(&self) -> Vendor {
        T::Ext::VENDOR
    }

    fn kind(&self) -> ResourceKind {
        <<T::Ext as VendorExtension>::Spec as ResourceSpec>::KIND
    }

    fn validate_request(&self, req: &SyncRequest) -> Result<()> {
        self.validate(req)
    }

    async fn sync(&self, kt: &Kit, req: &SyncRequest) -> Result<SyncSummary> {
        let vendor = self.vendor();
        let kind = self.kind();
        self.validate(req)?;

        let items = self.list(kt, req).await.inspect_err(|e| {
            tracing::error!(
                rid = %kt.rid, %vendor, %kind, account_id = %req.account_id,
                region = %req.region, error = %e, "list from cloud failed"
            );
        })?;
        let db = self.list_db(kt, req).await.inspect_err(|e| {
            tracing::error!(
                rid = %kt.rid, %vendor, %kind, account_id = %req.account_id,
                region = %req.region, error = %e, "load db snapshot failed"
            );
        })?;

        if items.is_empty() && !db.is_empty() && !req.is_partial() {
            tracing::error!(
                rid = %kt.rid, %vendor, %kind, account_id = %req.account_id,
                region = %req.region, db_count = db.len(), "cloud listing is empty, sync aborted"
            );
            return Err(CloudError::EmptyListing(format!(
                "{} {} in account {} ({}) has {} db rows",
                vendor,
                kind,
                req.account_id,
                req.scope_name(),
                db.len()
            )));
        }

        let all_cloud_ids: HashSet<String> =
            items.iter().map(|item| item.cloud_id.clone()).collect();
        let plan = diff::diff(items, &db, |cloud, row| self.is_changed(cloud, row));

        let mut summary = SyncSummary::default();
        summary.record(ActionType::NoOp, plan.unchanged);

        if !plan.updates.is_empty() {
            let n = plan.updates.len();
            self.update(kt, req, plan.updates).await?;
            summary.record(ActionType::Update, n);
        }

        if !plan.creates.is_empty() {
            let ids = self.create(kt, req, plan.creates).await?;
            summary.record(ActionType::Create, ids.len());
        }

        let candidates: Vec<Row<T::Ext>> = db
            .into_values()
            .filter(|row| !all_cloud_ids.contains(&row.cloud_id))
            .collect();
        if !candidates.is_empty() {
            let deleted = self.delete(kt, req, candidates).await?;
            summary.record(ActionType::Delete, deleted);
        }

        tracing::info!(
            rid = %kt.rid, %vendor, %kind, account_id = %req.account_id,
            region = %req.region, "sync finished: {}", summary
        );
        Ok(summary)
    }
}
