//! In-memory fake cloud
//!
//! Implements every adaptor trait for every vendor extension. Items are kept
//! as JSON per `(vendor, kind)` and listed back in small pages so paging code
//! is exercised. Lookups and listings can be made to fail on demand.

use crate::syncer::Item;
use async_trait::async_trait;
use hcm_cloud::{
    AvailIpResult, CloudError, CloudNetworkInterface, CloudSubnet, CloudVpc, CountIpOption, Kit,
    ListOption, ListPage, NetworkInterfaceAdaptor, NetworkInterfaceSpec, PageCursor,
    ResourceKind, ResourceLocator, ResourceSpec, Result, SubnetAdaptor, SubnetCreateOption,
    SubnetSpec, UpdateOption, Vendor, VendorExtension, VpcAdaptor, VpcCreateOption, VpcSpec,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

const DEFAULT_PAGE_SIZE: usize = 2;

/// Scripted answer of a direct lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupBehavior {
    Found,
    NotFound,
    Error,
}

#[derive(Debug, Clone)]
struct Entry {
    account_id: String,
    item: Value,
}

impl Entry {
    fn str_at(&self, path: &[&str]) -> &str {
        path.iter()
            .try_fold(&self.item, |v, seg| v.get(*seg))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn cloud_id(&self) -> &str {
        self.str_at(&["cloud_id"])
    }

    fn matches(&self, opt: &ListOption) -> bool {
        if self.account_id != opt.account_id {
            return false;
        }
        let region = self.str_at(&["region"]);
        if !opt.region.is_empty() && !region.is_empty() && region != opt.region {
            return false;
        }
        if let Some(zone) = opt.zone.as_deref() {
            if self.str_at(&["zone"]) != zone {
                return false;
            }
        }
        if let Some(rg) = opt.resource_group_name.as_deref() {
            if !self
                .str_at(&["extension", "resource_group_name"])
                .eq_ignore_ascii_case(rg)
            {
                return false;
            }
        }
        if !opt.cloud_ids.is_empty() && !opt.cloud_ids.iter().any(|id| id == self.cloud_id()) {
            return false;
        }
        if !opt.cloud_cvm_ids.is_empty()
            && !opt
                .cloud_cvm_ids
                .iter()
                .any(|id| id == self.str_at(&["instance_id"]))
        {
            return false;
        }
        if !opt.self_links.is_empty()
            && !opt
                .self_links
                .iter()
                .any(|link| link == self.str_at(&["extension", "self_link"]))
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<(Vendor, ResourceKind), Vec<Entry>>,
    failing_lists: HashSet<(Vendor, ResourceKind)>,
    lookups: HashMap<String, LookupBehavior>,
    ip_usage: HashMap<String, AvailIpResult>,
    next_id: u64,
}

/// Fake multi-vendor cloud
#[derive(Debug)]
pub struct FakeCloud {
    state: Mutex<State>,
    page_size: usize,
    list_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
            list_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    /// Add or replace an item
    pub async fn put<E: VendorExtension>(&self, account_id: &str, item: Item<E>) {
        let kind = <E::Spec as ResourceSpec>::KIND;
        let value = match serde_json::to_value(&item) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "fake cloud could not encode item");
                return;
            }
        };
        let entry = Entry {
            account_id: account_id.to_string(),
            item: value,
        };

        let mut state = self.state.lock().await;
        let entries = state.entries.entry((E::VENDOR, kind)).or_default();
        match entries
            .iter_mut()
            .find(|e| e.account_id == account_id && e.cloud_id() == item.cloud_id)
        {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    pub async fn remove(&self, vendor: Vendor, kind: ResourceKind, cloud_id: &str) {
        let mut state = self.state.lock().await;
        if let Some(entries) = state.entries.get_mut(&(vendor, kind)) {
            entries.retain(|e| e.cloud_id() != cloud_id);
        }
    }

    pub async fn fail_list(&self, vendor: Vendor, kind: ResourceKind) {
        self.state.lock().await.failing_lists.insert((vendor, kind));
    }

    pub async fn set_lookup(&self, cloud_id: &str, behavior: LookupBehavior) {
        self.state
            .lock()
            .await
            .lookups
            .insert(cloud_id.to_string(), behavior);
    }

    pub async fn set_ip_usage(&self, cloud_id: &str, usage: AvailIpResult) {
        self.state
            .lock()
            .await
            .ip_usage
            .insert(cloud_id.to_string(), usage);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    async fn list_page<T: DeserializeOwned>(
        &self,
        vendor: Vendor,
        kind: ResourceKind,
        opt: &ListOption,
    ) -> Result<ListPage<T>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if state.failing_lists.contains(&(vendor, kind)) {
            return Err(CloudError::api(vendor, format!("list {} failed", kind)));
        }

        let start = match &opt.page {
            None => 0,
            Some(PageCursor::Offset(n)) => *n as usize,
            Some(PageCursor::Token(token)) => token.parse().map_err(|_| {
                CloudError::InvalidParameter(format!("bad page token {}", token))
            })?,
        };

        let matched: Vec<&Entry> = state
            .entries
            .get(&(vendor, kind))
            .map(|entries| entries.iter().filter(|e| e.matches(opt)).collect())
            .unwrap_or_default();

        let end = (start + self.page_size).min(matched.len());
        let details = matched
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|e| serde_json::from_value(e.item.clone()).map_err(CloudError::from))
            .collect::<Result<Vec<T>>>()?;

        let next = (end < matched.len()).then(|| match vendor {
            Vendor::Gcp => PageCursor::Token(end.to_string()),
            _ => PageCursor::Offset(end as u64),
        });
        Ok(ListPage { details, next })
    }

    async fn insert_created(
        &self,
        vendor: Vendor,
        kind: ResourceKind,
        account_id: &str,
        prefix: &str,
        mut item: Value,
    ) -> String {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let cloud_id = format!("{}-{:06}", prefix, state.next_id);

        if let Value::Object(map) = &mut item {
            map.insert("cloud_id".to_string(), Value::String(cloud_id.clone()));
            if vendor == Vendor::Gcp {
                let name = map.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
                if let Some(Value::Object(ext)) = map.get_mut("extension") {
                    ext.insert(
                        "self_link".to_string(),
                        Value::String(format!("https://gcp.test/{}/{}", prefix, name)),
                    );
                }
            }
        }

        state.entries.entry((vendor, kind)).or_default().push(Entry {
            account_id: account_id.to_string(),
            item,
        });
        cloud_id
    }

    async fn set_memo(
        &self,
        vendor: Vendor,
        kind: ResourceKind,
        opt: &UpdateOption,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .entries
            .get_mut(&(vendor, kind))
            .and_then(|entries| {
                entries.iter_mut().find(|e| {
                    e.account_id == opt.target.account_id && e.cloud_id() == opt.target.cloud_id
                })
            })
            .ok_or_else(|| CloudError::ResourceNotFound(opt.target.cloud_id.clone()))?;

        if let Value::Object(map) = &mut entry.item {
            map.insert("memo".to_string(), json!(opt.memo));
        }
        Ok(())
    }

    async fn delete_entry(
        &self,
        vendor: Vendor,
        kind: ResourceKind,
        target: &ResourceLocator,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let entries = state.entries.entry((vendor, kind)).or_default();
        let before = entries.len();
        entries.retain(|e| !(e.account_id == target.account_id && e.cloud_id() == target.cloud_id));
        if entries.len() == before {
            return Err(CloudError::ResourceNotFound(target.cloud_id.clone()));
        }
        Ok(())
    }
}

fn merge_object(target: &mut serde_json::Map<String, Value>, extra: &Value) {
    if let Value::Object(extra) = extra {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn prefix_len(cidr: &str) -> Option<u32> {
    cidr.split_once('/')?.1.parse().ok()
}

#[async_trait]
impl<E> VpcAdaptor<E> for FakeCloud
where
    E: VendorExtension<Spec = VpcSpec>,
{
    async fn list_vpc(&self, _kt: &Kit, opt: &ListOption) -> Result<ListPage<CloudVpc<E>>> {
        self.list_page(E::VENDOR, ResourceKind::Vpc, opt).await
    }

    async fn create_vpc(&self, _kt: &Kit, opt: &VpcCreateOption) -> Result<String> {
        let mut extension = serde_json::to_value(E::default())?;
        if let Value::Object(ext) = &mut extension {
            if let Some(rg) = &opt.resource_group_name {
                ext.insert("resource_group_name".to_string(), json!(rg));
            }
            merge_object(ext, &opt.extension);
        }
        let item = json!({
            "name": opt.name,
            "region": opt.region,
            "memo": opt.memo,
            "extension": extension,
        });
        Ok(self
            .insert_created(E::VENDOR, ResourceKind::Vpc, &opt.account_id, "vpc", item)
            .await)
    }

    async fn update_vpc(&self, _kt: &Kit, opt: &UpdateOption) -> Result<()> {
        self.set_memo(E::VENDOR, ResourceKind::Vpc, opt).await
    }

    async fn delete_vpc(&self, _kt: &Kit, target: &ResourceLocator) -> Result<()> {
        self.delete_entry(E::VENDOR, ResourceKind::Vpc, target).await
    }
}

#[async_trait]
impl<E> SubnetAdaptor<E> for FakeCloud
where
    E: VendorExtension<Spec = SubnetSpec>,
{
    async fn list_subnet(&self, _kt: &Kit, opt: &ListOption) -> Result<ListPage<CloudSubnet<E>>> {
        self.list_page(E::VENDOR, ResourceKind::Subnet, opt).await
    }

    async fn create_subnet(&self, _kt: &Kit, opt: &SubnetCreateOption) -> Result<String> {
        let mut extension = serde_json::to_value(E::default())?;
        if let Value::Object(ext) = &mut extension {
            if let Some(rg) = &opt.resource_group_name {
                ext.insert("resource_group_name".to_string(), json!(rg));
            }
            merge_object(ext, &opt.extension);
        }
        let item = json!({
            "name": opt.name,
            "region": opt.region,
            "zone": opt.zone.clone().unwrap_or_default(),
            "cloud_vpc_id": opt.cloud_vpc_id,
            "ipv4_cidr": opt.ipv4_cidr.iter().collect::<Vec<_>>(),
            "ipv6_cidr": opt.ipv6_cidr.iter().collect::<Vec<_>>(),
            "memo": opt.memo,
            "extension": extension,
        });
        Ok(self
            .insert_created(E::VENDOR, ResourceKind::Subnet, &opt.account_id, "subnet", item)
            .await)
    }

    async fn update_subnet(&self, _kt: &Kit, opt: &UpdateOption) -> Result<()> {
        self.set_memo(E::VENDOR, ResourceKind::Subnet, opt).await
    }

    async fn delete_subnet(&self, _kt: &Kit, target: &ResourceLocator) -> Result<()> {
        self.delete_entry(E::VENDOR, ResourceKind::Subnet, target).await
    }

    async fn count_subnet_ips(
        &self,
        _kt: &Kit,
        opt: &CountIpOption,
    ) -> Result<HashMap<String, AvailIpResult>> {
        let state = self.state.lock().await;
        let entries = state
            .entries
            .get(&(E::VENDOR, ResourceKind::Subnet))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut result = HashMap::new();
        for cloud_id in &opt.cloud_ids {
            if let Some(usage) = state.ip_usage.get(cloud_id) {
                result.insert(cloud_id.clone(), *usage);
                continue;
            }
            let Some(entry) = entries
                .iter()
                .find(|e| e.account_id == opt.account_id && e.cloud_id() == cloud_id)
            else {
                continue;
            };
            let total = entry
                .item
                .get("ipv4_cidr")
                .and_then(|v| v.get(0))
                .and_then(Value::as_str)
                .and_then(prefix_len)
                .filter(|p| *p <= 32)
                .map(|p| 1u64 << (32 - p))
                .unwrap_or_default();
            result.insert(
                cloud_id.clone(),
                AvailIpResult {
                    available_ip_count: total,
                    total_ip_count: total,
                    used_ip_count: 0,
                },
            );
        }
        Ok(result)
    }
}

#[async_trait]
impl<E> NetworkInterfaceAdaptor<E> for FakeCloud
where
    E: VendorExtension<Spec = NetworkInterfaceSpec>,
{
    async fn list_network_interface(
        &self,
        _kt: &Kit,
        opt: &ListOption,
    ) -> Result<ListPage<CloudNetworkInterface<E>>> {
        self.list_page(E::VENDOR, ResourceKind::NetworkInterface, opt)
            .await
    }

    async fn get_network_interface(
        &self,
        _kt: &Kit,
        target: &ResourceLocator,
    ) -> Result<CloudNetworkInterface<E>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;

        let found = state
            .entries
            .get(&(E::VENDOR, ResourceKind::NetworkInterface))
            .and_then(|entries| {
                entries.iter().find(|e| {
                    e.account_id == target.account_id && e.cloud_id() == target.cloud_id
                })
            });

        match (state.lookups.get(&target.cloud_id), found) {
            (Some(LookupBehavior::Error), _) => Err(CloudError::api(
                E::VENDOR,
                format!("get {} throttled", target.cloud_id),
            )),
            (Some(LookupBehavior::NotFound), _) | (None, None) => {
                Err(CloudError::ResourceNotFound(target.cloud_id.clone()))
            }
            (_, Some(entry)) => Ok(serde_json::from_value(entry.item.clone())?),
            (Some(LookupBehavior::Found), None) => Ok(serde_json::from_value(json!({
                "cloud_id": target.cloud_id,
                "extension": E::default(),
            }))?),
        }
    }
}
