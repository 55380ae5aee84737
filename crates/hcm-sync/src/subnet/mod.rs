//! Subnet sync
//!
//! Like VPCs, one generic [`SubnetSyncer`] plus a [`SubnetRules`] impl per
//! vendor. Listed subnets carry their parent VPC by cloud id (GCP: by network
//! self link); the parent is resolved to the internal `vpc_id` before the
//! diff, syncing missing VPCs on the way.

mod aws;
mod azure;
mod gcp;
mod huawei;
mod tcloud;

use crate::diff::{self, Changed, same_set};
use crate::relation::{ParentKey, ParentResolver};
use crate::request::{ScopeFilter, SyncRequest};
use crate::syncer::{ConfirmStrategy, Item, ResourceSyncer, Row};
use crate::writer;
use async_trait::async_trait;
use hcm_cloud::{
    DataService, Expression, Kit, MAX_CLOUD_ID_FILTER, Result, SubnetAdaptor, SubnetSpec,
    UpdateReq, VendorExtension, collect_pages,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// Vendor-specific subnet sync rules
pub trait SubnetRules: VendorExtension<Spec = SubnetSpec> {
    const CONFIRM: ConfirmStrategy = ConfirmStrategy::Relist;

    /// How a listed subnet names its VPC
    const PARENT: ParentKey = ParentKey::CloudId;

    /// Largest `cloud_ids` group one list call accepts
    const QUERY_CHUNK: usize = MAX_CLOUD_ID_FILTER;

    fn validate(req: &SyncRequest) -> Result<()> {
        req.require_region()
    }

    fn db_scope(req: &SyncRequest) -> Expression {
        ScopeFilter::account(Self::VENDOR, &req.account_id)
            .eq("region", &req.region)
            .in_list("cloud_id", &req.cloud_ids)
            .build()
    }

    /// Parent VPC key of a listed subnet, matching [`Self::PARENT`]
    fn parent_key(item: &Item<Self>) -> &str {
        &item.spec.cloud_vpc_id
    }

    /// Scope of the VPC sync run for missing parents
    fn parent_scope(req: &SyncRequest) -> SyncRequest {
        req.narrowed(Vec::new())
    }

    /// Canonical form of a listed subnet, applied before the parent lookup
    fn normalize(_item: &mut Item<Self>) {}

    fn extension_changed(cloud: &Self, db: &Self) -> bool;
}

pub(crate) fn spec_changed(cloud: &SubnetSpec, db: &SubnetSpec) -> bool {
    cloud.name != db.name
        || cloud.region != db.region
        || cloud.zone != db.zone
        || cloud.cloud_vpc_id != db.cloud_vpc_id
        || cloud.vpc_id != db.vpc_id
        || !same_set(&cloud.ipv4_cidr, &db.ipv4_cidr)
        || !same_set(&cloud.ipv6_cidr, &db.ipv6_cidr)
        || diff::opt_str_changed(&cloud.cloud_route_table_id, &db.cloud_route_table_id)
        || (cloud.memo.is_some() && diff::opt_str_changed(&cloud.memo, &db.memo))
}

pub struct SubnetSyncer<E: SubnetRules> {
    data: Arc<dyn DataService>,
    adaptor: Arc<dyn SubnetAdaptor<E>>,
    vpcs: Arc<ParentResolver>,
    _ext: PhantomData<fn() -> E>,
}

impl<E: SubnetRules> SubnetSyncer<E> {
    /// `vpcs` resolves VPCs of the same vendor
    pub fn new(
        data: Arc<dyn DataService>,
        adaptor: Arc<dyn SubnetAdaptor<E>>,
        vpcs: Arc<ParentResolver>,
    ) -> Self {
        Self {
            data,
            adaptor,
            vpcs,
            _ext: PhantomData,
        }
    }

    async fn fill_parents(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        items: &mut [Item<E>],
    ) -> Result<()> {
        let keys: Vec<String> = items
            .iter()
            .map(|item| E::parent_key(item).to_string())
            .collect();
        let parents = self
            .vpcs
            .query_ids_and_sync(kt, &E::parent_scope(req), E::PARENT, &keys)
            .await?;

        for item in items.iter_mut() {
            if let Some(vpc) = parents.get(E::parent_key(item)) {
                item.spec.vpc_id = vpc.id.clone();
                if item.spec.cloud_vpc_id.is_empty() {
                    item.spec.cloud_vpc_id = vpc.cloud_id.clone();
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<E: SubnetRules> ResourceSyncer for SubnetSyncer<E> {
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
            collect_pages(&opt, |o| async move { self.adaptor.list_subnet(kt, &o).await })
                .await?
        } else {
            let mut items = Vec::new();
            for chunk in opt.cloud_ids.chunks(E::QUERY_CHUNK) {
                let narrowed = opt.clone().with_cloud_ids(chunk.to_vec());
                items.extend(
                    collect_pages(&narrowed, |o| async move {
                        self.adaptor.list_subnet(kt, &o).await
                    })
                    .await?,
                );
            }
            items
        };
        items.iter_mut().for_each(E::normalize);
        self.fill_parents(kt, req, &mut items).await?;
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
                if cloud.spec.route_table_id.is_none() {
                    cloud.spec.route_table_id = db.spec.route_table_id;
                }
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
