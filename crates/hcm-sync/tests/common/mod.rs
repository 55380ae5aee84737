use hcm_cloud::{
    AwsSubnetExtension, AwsVpcExtension, AzureNIExtension, CloudItem, GcpNIExtension,
    GcpSubnetExtension, GcpVpcExtension, HuaWeiNIExtension, Kit, NetworkInterfaceSpec,
    SubnetSpec, VpcSpec,
};
use hcm_dataservice::MemoryDataService;
use hcm_sync::syncer::Item;
use hcm_sync::testkit::FakeCloud;
use hcm_sync::{Adaptors, LeaseConfig, LeaseManager, SyncEngine, SyncerRegistry};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ACCOUNT: &str = "acc-1";
pub const REGION: &str = "us-east-1";
pub const RG: &str = "rg-prod";

pub struct Harness {
    pub cloud: Arc<FakeCloud>,
    pub store: Arc<MemoryDataService>,
    pub engine: SyncEngine,
    pub leases: Arc<LeaseManager>,
    pub kt: Kit,
    _lease_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let cloud = Arc::new(FakeCloud::new());
        Self::with_adaptors(cloud.clone(), Adaptors::uniform(cloud))
    }

    pub fn with_adaptors(cloud: Arc<FakeCloud>, adaptors: Adaptors) -> Self {
        let lease_dir = tempfile::tempdir().unwrap();
        let leases = Arc::new(LeaseManager::new(LeaseConfig {
            dir: lease_dir.path().to_path_buf(),
            ttl: Duration::from_secs(3600),
            wait: Duration::from_millis(300),
        }));
        let store = Arc::new(MemoryDataService::new());
        let registry = SyncerRegistry::build(store.clone(), &adaptors, leases.clone());

        Self {
            cloud,
            engine: SyncEngine::new(Arc::new(registry), store.clone()),
            store,
            leases,
            kt: Kit::new().with_rid("test-rid"),
            _lease_dir: lease_dir,
        }
    }
}

pub fn aws_vpc(cloud_id: &str, name: &str) -> Item<AwsVpcExtension> {
    CloudItem::new(cloud_id, VpcSpec::new(name, REGION), AwsVpcExtension::default())
}

pub fn aws_subnet(cloud_id: &str, name: &str, cloud_vpc_id: &str) -> Item<AwsSubnetExtension> {
    CloudItem::new(
        cloud_id,
        SubnetSpec {
            name: name.to_string(),
            region: REGION.to_string(),
            zone: format!("{}a", REGION),
            cloud_vpc_id: cloud_vpc_id.to_string(),
            ipv4_cidr: vec!["10.0.1.0/24".to_string()],
            ..Default::default()
        },
        AwsSubnetExtension::default(),
    )
}

/// Azure interface without a subnet, so no parent resolution kicks in
#[allow(dead_code)]
pub fn azure_ni(cloud_id: &str, ips: &[&str]) -> Item<AzureNIExtension> {
    CloudItem::new(
        cloud_id,
        NetworkInterfaceSpec {
            name: cloud_id.rsplit('/').next().unwrap_or(cloud_id).to_string(),
            region: "eastus".to_string(),
            private_ipv4: ips.iter().map(|ip| ip.to_string()).collect(),
            ..Default::default()
        },
        AzureNIExtension {
            resource_group_name: RG.to_string(),
            ..Default::default()
        },
    )
}

#[allow(dead_code)]
pub fn gcp_vpc(cloud_id: &str, self_link: &str) -> Item<GcpVpcExtension> {
    CloudItem::new(
        cloud_id,
        VpcSpec::new("default", ""),
        GcpVpcExtension {
            self_link: self_link.to_string(),
            ..Default::default()
        },
    )
}

#[allow(dead_code)]
pub fn gcp_subnet(cloud_id: &str, vpc_self_link: &str) -> Item<GcpSubnetExtension> {
    CloudItem::new(
        cloud_id,
        SubnetSpec {
            name: format!("sub-{}", cloud_id),
            region: "us-central1".to_string(),
            ipv4_cidr: vec!["10.128.0.0/20".to_string()],
            ..Default::default()
        },
        GcpSubnetExtension {
            self_link: format!("https://gcp.test/subnetworks/{}", cloud_id),
            vpc_self_link: vpc_self_link.to_string(),
            ..Default::default()
        },
    )
}

/// GCP interface with no parent links, attached to `instance_id`
#[allow(dead_code)]
pub fn gcp_ni(cloud_id: &str, instance_id: &str) -> Item<GcpNIExtension> {
    CloudItem::new(
        cloud_id,
        NetworkInterfaceSpec {
            name: "nic0".to_string(),
            region: "us-central1".to_string(),
            zone: "us-central1-a".to_string(),
            instance_id: instance_id.to_string(),
            private_ipv4: vec!["10.128.0.2".to_string()],
            ..Default::default()
        },
        GcpNIExtension {
            status: "IN_USE".to_string(),
            ..Default::default()
        },
    )
}

#[allow(dead_code)]
pub fn huawei_ni(cloud_id: &str, instance_id: &str) -> Item<HuaWeiNIExtension> {
    CloudItem::new(
        cloud_id,
        NetworkInterfaceSpec {
            name: cloud_id.to_string(),
            region: "cn-north-4".to_string(),
            instance_id: instance_id.to_string(),
            private_ipv4: vec!["192.168.0.10".to_string()],
            ..Default::default()
        },
        HuaWeiNIExtension {
            port_state: "ACTIVE".to_string(),
            cloud_security_group_ids: vec!["sg-1".to_string(), "sg-1".to_string()],
            ..Default::default()
        },
    )
}
