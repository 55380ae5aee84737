//! Vendor adaptor traits
//!
//! One trait per resource kind, generic over the vendor extension so a single
//! implementation (gateway client, fake cloud) can serve every vendor while the
//! returned items stay strongly typed.

use crate::error::{CloudError, Result};
use crate::extension::VendorExtension;
use crate::kit::Kit;
use crate::resource::{
    CloudNetworkInterface, CloudSubnet, CloudVpc, NetworkInterfaceSpec, SubnetSpec, VpcCategory,
    VpcSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;

/// Bound on `cloud_ids` for VPC and subnet listings
pub const MAX_CLOUD_ID_FILTER: usize = 500;

/// Bound on `cloud_ids` / `cloud_cvm_ids` for network interface listings
pub const MAX_NI_ID_FILTER: usize = 100;

/// Continuation of a paged listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PageCursor {
    Token(String),
    Offset(u64),
}

/// Scope and filters of one listing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOption {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cloud_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cloud_cvm_ids: Vec<String>,
    /// Self links of GCP networks; an alternative to `cloud_ids`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub self_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageCursor>,
}

impl ListOption {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_resource_group(mut self, name: impl Into<String>) -> Self {
        self.resource_group_name = Some(name.into());
        self
    }

    pub fn with_cloud_ids(mut self, ids: Vec<String>) -> Self {
        self.cloud_ids = ids;
        self
    }

    pub fn with_cloud_cvm_ids(mut self, ids: Vec<String>) -> Self {
        self.cloud_cvm_ids = ids;
        self
    }

    pub fn with_self_links(mut self, links: Vec<String>) -> Self {
        self.self_links = links;
        self
    }

    /// Reject id filters longer than `limit`
    pub fn check_bound(&self, limit: usize) -> Result<()> {
        if self.cloud_ids.len() > limit {
            return Err(CloudError::TooManyRequest(format!(
                "cloud_ids should <= {}, got {}",
                limit,
                self.cloud_ids.len()
            )));
        }
        if self.cloud_cvm_ids.len() > limit {
            return Err(CloudError::TooManyRequest(format!(
                "cloud_cvm_ids should <= {}, got {}",
                limit,
                self.cloud_cvm_ids.len()
            )));
        }
        if self.self_links.len() > limit {
            return Err(CloudError::TooManyRequest(format!(
                "self_links should <= {}, got {}",
                limit,
                self.self_links.len()
            )));
        }
        Ok(())
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub details: Vec<T>,
    #[serde(default)]
    pub next: Option<PageCursor>,
}

impl<T> ListPage<T> {
    /// A final page
    pub fn last(details: Vec<T>) -> Self {
        Self {
            details,
            next: None,
        }
    }
}

/// Drain every page of a listing
pub async fn collect_pages<T, F, Fut>(opt: &ListOption, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(ListOption) -> Fut,
    Fut: Future<Output = Result<ListPage<T>>>,
{
    let mut cursor = opt.clone();
    cursor.page = None;

    let mut items = Vec::new();
    loop {
        let page = fetch(cursor.clone()).await?;
        tracing::debug!(
            account_id = %opt.account_id,
            region = %opt.region,
            count = page.details.len(),
            "fetched listing page"
        );
        items.extend(page.details);

        match page.next {
            Some(next) if cursor.page.as_ref() != Some(&next) => cursor.page = Some(next),
            Some(_) => {
                return Err(CloudError::InvalidParameter(
                    "listing returned the same page cursor twice".to_string(),
                ));
            }
            None => break,
        }
    }
    Ok(items)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcCreateOption {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    pub name: String,
    #[serde(default)]
    pub category: VpcCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    /// Vendor-specific create parameters, passed through untouched
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extension: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetCreateOption {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    pub cloud_vpc_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extension: serde_json::Value,
}

/// Address of one cloud resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocator {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    pub cloud_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOption {
    #[serde(flatten)]
    pub target: ResourceLocator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountIpOption {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    pub cloud_ids: Vec<String>,
}

/// IP usage of one subnet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailIpResult {
    pub available_ip_count: u64,
    pub total_ip_count: u64,
    pub used_ip_count: u64,
}

#[async_trait]
pub trait VpcAdaptor<E>: Send + Sync
where
    E: VendorExtension<Spec = VpcSpec>,
{
    async fn list_vpc(&self, kt: &Kit, opt: &ListOption) -> Result<ListPage<CloudVpc<E>>>;

    /// Create a VPC and return its cloud id
    async fn create_vpc(&self, kt: &Kit, opt: &VpcCreateOption) -> Result<String>;

    async fn update_vpc(&self, kt: &Kit, opt: &UpdateOption) -> Result<()>;

    async fn delete_vpc(&self, kt: &Kit, target: &ResourceLocator) -> Result<()>;
}

#[async_trait]
pub trait SubnetAdaptor<E>: Send + Sync
where
    E: VendorExtension<Spec = SubnetSpec>,
{
    async fn list_subnet(&self, kt: &Kit, opt: &ListOption) -> Result<ListPage<CloudSubnet<E>>>;

    /// Create a subnet and return its cloud id
    async fn create_subnet(&self, kt: &Kit, opt: &SubnetCreateOption) -> Result<String>;

    async fn update_subnet(&self, kt: &Kit, opt: &UpdateOption) -> Result<()>;

    async fn delete_subnet(&self, kt: &Kit, target: &ResourceLocator) -> Result<()>;

    /// IP usage keyed by subnet cloud id
    async fn count_subnet_ips(
        &self,
        kt: &Kit,
        opt: &CountIpOption,
    ) -> Result<HashMap<String, AvailIpResult>>;
}

#[async_trait]
pub trait NetworkInterfaceAdaptor<E>: Send + Sync
where
    E: VendorExtension<Spec = NetworkInterfaceSpec>,
{
    async fn list_network_interface(
        &self,
        kt: &Kit,
        opt: &ListOption,
    ) -> Result<ListPage<CloudNetworkInterface<E>>>;

    /// Fetch one interface; `Err(ResourceNotFound)` when it cleanly does not exist
    async fn get_network_interface(
        &self,
        kt: &Kit,
        target: &ResourceLocator,
    ) -> Result<CloudNetworkInterface<E>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bound() {
        let ids: Vec<String> = (0..101).map(|i| format!("eni-{}", i)).collect();
        let opt = ListOption::new("acc-1", "cn-south-1").with_cloud_ids(ids);
        assert!(matches!(
            opt.check_bound(MAX_NI_ID_FILTER),
            Err(CloudError::TooManyRequest(_))
        ));
        assert!(opt.check_bound(MAX_CLOUD_ID_FILTER).is_ok());
    }

    #[tokio::test]
    async fn test_collect_pages_follows_cursor() {
        let opt = ListOption::new("acc-1", "us-central1");
        let items = collect_pages(&opt, |o| async move {
            Ok(match o.page {
                None => ListPage {
                    details: vec![1, 2],
                    next: Some(PageCursor::Token("p2".into())),
                },
                Some(PageCursor::Token(ref t)) if t == "p2" => ListPage {
                    details: vec![3],
                    next: Some(PageCursor::Offset(3)),
                },
                _ => ListPage::last(vec![4]),
            })
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_collect_pages_rejects_repeated_cursor() {
        let opt = ListOption::new("acc-1", "us-central1");
        let result = tokio_test::block_on(collect_pages(&opt, |_| async {
            Ok(ListPage {
                details: vec![1],
                next: Some(PageCursor::Token("same".into())),
            })
        }));
        assert!(result.is_err());
    }
}
