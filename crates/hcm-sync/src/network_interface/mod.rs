//! Network interface sync
//!
//! Interfaces are synced for Azure, GCP and HuaWei only, each by its own
//! syncer. They share the spec comparison and the rule that a new interface
//! joins the business of its server.

mod azure;
mod gcp;
mod huawei;

pub use azure::AzureNISyncer;
pub use gcp::GcpNISyncer;
pub use huawei::HuaWeiNISyncer;

use crate::diff::same_set;
use crate::loader;
use crate::relation::ParentRef;
use crate::request::ScopeFilter;
use crate::syncer::Item;
use crate::writer;
use hcm_cloud::{
    CreateReq, DEFAULT_MAX_IN_LIMIT, DataService, Kit, NetworkInterfaceSpec, ResourceKind, Result,
    UNASSIGNED_BIZ, Vendor, VendorExtension,
};
use std::collections::HashMap;

pub(crate) fn spec_changed(cloud: &NetworkInterfaceSpec, db: &NetworkInterfaceSpec) -> bool {
    cloud.name != db.name
        || cloud.region != db.region
        || cloud.zone != db.zone
        || cloud.cloud_vpc_id != db.cloud_vpc_id
        || cloud.vpc_id != db.vpc_id
        || cloud.cloud_subnet_id != db.cloud_subnet_id
        || cloud.subnet_id != db.subnet_id
        || cloud.instance_id != db.instance_id
        || !same_set(&cloud.private_ipv4, &db.private_ipv4)
        || !same_set(&cloud.private_ipv6, &db.private_ipv6)
        || !same_set(&cloud.public_ipv4, &db.public_ipv4)
        || !same_set(&cloud.public_ipv6, &db.public_ipv6)
}

/// Copy a resolved subnet (and its VPC) onto the interface
pub(crate) fn attach_subnet(spec: &mut NetworkInterfaceSpec, subnet: &ParentRef) {
    spec.subnet_id = subnet.id.clone();
    if spec.cloud_subnet_id.is_empty() {
        spec.cloud_subnet_id = subnet.cloud_id.clone();
    }
    if !subnet.vpc_id.is_empty() {
        spec.vpc_id = subnet.vpc_id.clone();
    }
    if spec.cloud_vpc_id.is_empty() {
        spec.cloud_vpc_id = subnet.cloud_vpc_id.clone();
    }
}

/// `bk_biz_id` of each server, keyed by its cloud id
async fn server_biz(
    data: &dyn DataService,
    kt: &Kit,
    vendor: Vendor,
    account_id: &str,
    cloud_cvm_ids: &[String],
) -> Result<HashMap<String, i64>> {
    let mut biz = HashMap::new();
    for chunk in cloud_cvm_ids.chunks(DEFAULT_MAX_IN_LIMIT) {
        let filter = ScopeFilter::account(vendor, account_id)
            .in_list("cloud_id", chunk)
            .build();
        let refs = loader::load_refs(data, kt, ResourceKind::Cvm, vendor, filter).await?;
        biz.extend(refs.into_iter().map(|r| (r.cloud_id, r.bk_biz_id)));
    }
    Ok(biz)
}

/// Insert new interfaces into the business of the server each is attached to
///
/// Detached interfaces, and those whose server has no row yet, stay unassigned.
pub(crate) async fn create_in_server_biz<E>(
    data: &dyn DataService,
    kt: &Kit,
    account_id: &str,
    items: Vec<Item<E>>,
) -> Result<Vec<String>>
where
    E: VendorExtension<Spec = NetworkInterfaceSpec>,
{
    let mut cvm_ids: Vec<String> = items
        .iter()
        .map(|item| item.spec.instance_id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    cvm_ids.sort();
    cvm_ids.dedup();
    let biz = server_biz(data, kt, E::VENDOR, account_id, &cvm_ids).await?;

    let reqs = items
        .into_iter()
        .map(|item| {
            let bk_biz_id = biz
                .get(&item.spec.instance_id)
                .copied()
                .unwrap_or(UNASSIGNED_BIZ);
            CreateReq {
                bk_biz_id,
                ..CreateReq::from_item(account_id, item)
            }
        })
        .collect();
    writer::create_rows::<E>(data, kt, reqs).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(ips: &[&str]) -> NetworkInterfaceSpec {
        NetworkInterfaceSpec {
            name: "nic-1".to_string(),
            private_ipv4: ips.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ip_order_independent() {
        assert!(!spec_changed(
            &spec(&["10.0.0.1", "10.0.0.2"]),
            &spec(&["10.0.0.2", "10.0.0.1"])
        ));
        assert!(spec_changed(
            &spec(&["10.0.0.1", "10.0.0.2"]),
            &spec(&["10.0.0.1"])
        ));
    }

    #[test]
    fn test_attach_subnet_keeps_reported_cloud_ids() {
        let mut ni = NetworkInterfaceSpec {
            cloud_subnet_id: "/subscriptions/s/subnets/web".to_string(),
            ..Default::default()
        };
        let subnet = ParentRef {
            id: "00000007".to_string(),
            cloud_id: "/subscriptions/s/subnets/web".to_string(),
            vpc_id: "00000002".to_string(),
            cloud_vpc_id: "/subscriptions/s/vnets/main".to_string(),
            ..Default::default()
        };
        attach_subnet(&mut ni, &subnet);
        assert_eq!(ni.subnet_id, "00000007");
        assert_eq!(ni.vpc_id, "00000002");
        assert_eq!(ni.cloud_vpc_id, "/subscriptions/s/vnets/main");
    }
}
