//! DB snapshot loading with offset paging

use crate::syncer::Row;
use hcm_cloud::{
    DEFAULT_MAX_PAGE_LIMIT, DataService, DataServiceExt, Expression, Kit, ListReq, Page,
    ResourceKind, ResourceRef, Result, Vendor, VendorExtension,
};
use serde_json::Value;
use std::collections::HashMap;

/// Load every row matching `filter`, keyed by `cloud_id`
pub async fn load_rows<E: VendorExtension>(
    data: &dyn DataService,
    kt: &Kit,
    filter: Expression,
) -> Result<HashMap<String, Row<E>>> {
    let mut rows = HashMap::new();
    let mut start = 0u32;

    loop {
        let req = ListReq::new(filter.clone(), Page::new(start, DEFAULT_MAX_PAGE_LIMIT));
        let page = data.list_ext::<E>(kt, &req).await?;
        let fetched = page.len();
        tracing::debug!(rid = %kt.rid, vendor = %E::VENDOR, start, fetched, "loaded db page");

        for row in page {
            rows.insert(row.cloud_id.clone(), row);
        }

        if fetched < DEFAULT_MAX_PAGE_LIMIT as usize {
            break;
        }
        start += DEFAULT_MAX_PAGE_LIMIT;
    }
    Ok(rows)
}

/// Load raw rows of every row matching `filter`
pub async fn load_values(
    data: &dyn DataService,
    kt: &Kit,
    kind: ResourceKind,
    vendor: Vendor,
    filter: Expression,
) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    let mut start = 0u32;

    loop {
        let req = ListReq::new(filter.clone(), Page::new(start, DEFAULT_MAX_PAGE_LIMIT));
        let page = data.list(kt, kind, Some(vendor), &req).await?;
        let fetched = page.details.len();
        rows.extend(page.details);

        if fetched < DEFAULT_MAX_PAGE_LIMIT as usize {
            break;
        }
        start += DEFAULT_MAX_PAGE_LIMIT;
    }
    Ok(rows)
}

/// Load identity projections of every row matching `filter`
pub async fn load_refs(
    data: &dyn DataService,
    kt: &Kit,
    kind: ResourceKind,
    vendor: Vendor,
    filter: Expression,
) -> Result<Vec<ResourceRef>> {
    load_values(data, kt, kind, vendor, filter)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcm_cloud::{AtomRule, TCloudVpcExtension};
    use hcm_dataservice::MemoryDataService;
    use serde_json::json;

    #[tokio::test]
    async fn test_pages_until_partial_page() {
        let store = MemoryDataService::new();
        let rows = (0..1001)
            .map(|i| json!({"account_id": "acc-1", "cloud_id": format!("vpc-{}", i), "name": "n"}))
            .collect();
        store.seed(ResourceKind::Vpc, Vendor::TCloud, rows).await.unwrap();

        let filter = Expression::and([AtomRule::eq("account_id", "acc-1")]);
        let loaded = load_rows::<TCloudVpcExtension>(&store, &Kit::new(), filter)
            .await
            .unwrap();

        assert_eq!(loaded.len(), 1001);
        assert!(loaded.contains_key("vpc-1000"));
        assert_eq!(store.stats().await.list_calls, 3);
    }

    #[tokio::test]
    async fn test_exact_page_multiple_needs_one_more_call() {
        let store = MemoryDataService::new();
        let rows = (0..500)
            .map(|i| json!({"account_id": "acc-1", "cloud_id": format!("s-{}", i), "name": "n"}))
            .collect();
        store.seed(ResourceKind::Subnet, Vendor::Aws, rows).await.unwrap();

        let filter = Expression::and([AtomRule::eq("account_id", "acc-1")]);
        let refs = load_refs(&store, &Kit::new(), ResourceKind::Subnet, Vendor::Aws, filter)
            .await
            .unwrap();
        assert_eq!(refs.len(), 500);
        assert_eq!(store.stats().await.list_calls, 2);
    }
}
