//! VPC sync
//!
//! One generic [`VpcSyncer`] serves every vendor. What differs per vendor
//! (scope, confirmation, tracked extension fields) lives in the vendor's
//! [`VpcRules`] impl.

mod aws;
mod azure;
mod gcp;
mod huawei;
mod tcloud;

pub use tcloud::TCLOUD_QUERY_LIMIT;

use crate::diff::{self, Changed};
use crate::request::{ScopeFilter, SyncRequest};
use crate::syncer::{ConfirmStrategy, Item, ResourceSyncer, Row};
use crate::writer;
use async_trait::async_trait;
use hcm_cloud::{
    DataService, Expression, Kit, MAX_CLOUD_ID_FILTER, Result, UpdateReq, VendorExtension,
    VpcAdaptor, VpcSpec, collect_pages,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// Vendor-specific VPC sync rules
pub trait VpcRules: VendorExtension<Spec = VpcSpec> {
    const CONFIRM: ConfirmStrategy = ConfirmStrategy::Relist;

    /// Largest `cloud_ids` group one list call accepts
    const QUERY_CHUNK: usize = MAX_CLOUD_ID_FILTER;

    /// Scope fields the vendor needs on top of `account_id`
    fn validate(req: &SyncRequest) -> Result<()> {
        req.require_region()
    }

    fn db_scope(req: &SyncRequest) -> Expression {
        ScopeFilter::account(Self::VENDOR, &req.account_id)
            .eq("region", &req.region)
            .in_list("cloud_id", &req.cloud_ids)
            .build()
    }

    /// Canonical form of a listed VPC, applied before the diff
    fn normalize(_item: &mut Item<Self>) {}

    fn extension_changed(cloud: &Self, db: &Self) -> bool;
}

/// Tracked spec fields shared by every vendor
pub(crate) fn spec_changed(cloud: &VpcSpec, db: &VpcSpec) -> bool {
    cloud.name != db.name
        || cloud.region != db.region
        || (cloud.memo.is_some() && diff::opt_str_changed(&cloud.memo, &db.memo))
}

pub struct VpcSyncer<E: VpcRules> {
    data: Arc<dyn DataService>,
    adaptor: Arc<dyn VpcAdaptor<E>>,
    _ext: PhantomData<fn() -> E>,
}

impl<E: VpcRules> VpcSyncer<E> {
    pub fn new(data: Arc<dyn DataService>, adaptor: Arc<dyn VpcAdaptor<E>>) -> Self {
        Self {
            data,
            adaptor,
            _ext: PhantomData,
        }
    }
}

#[async_trait]
impl<E: VpcRules> ResourceSyncer for VpcSyncer<E> {
    type Ext = E;

    fn data(&self) -> &dyn DataService {
        self.data.as_ref()
    }

    fn validate(&self, req: &SyncRequest) -> Result<()> {
        req.validate(self.id_filter_limit())?;
        E::validate(req)
    }

    async fn list(&self, kt: &Kit, req: &SyncRequest) -> Result<Vec<Item<E>>> {
        let opt = req.list_option();
        let mut items = if opt.cloud_ids.is_empty() {
            collect_pages(&opt, |o| async move { self.adaptor.list_vpc(kt, &o).await }).await?
        } else {
            let mut items = Vec::new();
            for chunk in opt.cloud_ids.chunks(E::QUERY_CHUNK) {
                let narrowed = opt.clone().with_cloud_ids(chunk.to_vec());
                items.extend(
                    collect_pages(&narrowed, |o| async move {
                        self.adaptor.list_vpc(kt, &o).await
                    })
                    .await?,
                );
            }
            items
        };
        items.iter_mut().for_each(E::normalize);
        Ok(items)
    }

    fn db_scope(&self, req: &SyncRequest) -> Expression {
        E::db_scope(req)
    }

    fn is_changed(&self, cloud: &Item<E>, db: &Row<E>) -> bool {
        spec_changed(&cloud.spec, &db.spec)
            || diff::extension_changed(&cloud.extension, db.extension.as_ref(), E::extension_changed)
    }

    async fn update(&self, kt: &Kit, _req: &SyncRequest, items: Vec<Changed<E>>) -> Result<()> {
        let reqs = items
            .into_iter()
            .map(|Changed { mut cloud, db }| {
                // Category and cloud area are assigned inside HCM, never by the vendor
                cloud.spec.category = db.spec.category;
                cloud.spec.bk_cloud_id = db.spec.bk_cloud_id;
                if cloud.spec.memo.is_none() {
                    cloud.spec.memo = db.spec.memo;
                }
                UpdateReq::from_item(db.id, cloud)
            })
            .collect();
        writer::update_rows::<E>(self.data(), kt, reqs).await
    }

    fn confirm_strategy(&self) -> ConfirmStrategy {
        E::CONFIRM
    }
}
