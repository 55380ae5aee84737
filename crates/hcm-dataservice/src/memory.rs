//! In-process data-service
//!
//! Keeps one table per resource kind as JSON rows. Enforces the
//! `(vendor, account_id, cloud_id)` uniqueness of the real store, evaluates
//! filter expressions locally and counts calls so tests can assert how many
//! writes a sync pass issued.

use async_trait::async_trait;
use chrono::Utc;
use hcm_cloud::{
    BaseInfoUpdateReq, BatchCreateResult, BatchDeleteReq, CloudError, DataService, Kit, ListReq,
    ListResult, ResourceKind, Result, Vendor,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// Data-service operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    UpdateBaseInfo,
    Delete,
}

/// Call and row counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    pub list_calls: usize,
    pub create_calls: usize,
    pub update_calls: usize,
    pub update_base_info_calls: usize,
    pub delete_calls: usize,
    pub created_rows: usize,
    pub updated_rows: usize,
    pub deleted_rows: usize,
}

impl CallStats {
    /// Number of calls that could have changed a row
    pub fn write_calls(&self) -> usize {
        self.create_calls + self.update_calls + self.update_base_info_calls + self.delete_calls
    }
}

#[derive(Debug)]
struct Failure {
    after: usize,
    seen: usize,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<ResourceKind, Vec<Value>>,
    next_id: u64,
    stats: CallStats,
    failures: HashMap<Operation, Failure>,
}

type RowKey = (String, String, String);

fn str_field<'a>(row: &'a Value, field: &str) -> &'a str {
    row.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn row_key(row: &Value) -> RowKey {
    (
        str_field(row, "vendor").to_string(),
        str_field(row, "account_id").to_string(),
        str_field(row, "cloud_id").to_string(),
    )
}

fn project(row: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return row.clone();
    }
    let mut out = Map::new();
    for field in fields {
        if let Some(value) = row.get(field) {
            out.insert(field.clone(), value.clone());
        }
    }
    Value::Object(out)
}

impl Inner {
    fn check_failure(&mut self, op: Operation) -> Result<()> {
        if let Some(failure) = self.failures.get_mut(&op) {
            failure.seen += 1;
            if failure.seen > failure.after {
                return Err(CloudError::DataService(format!(
                    "injected {:?} failure",
                    op
                )));
            }
        }
        Ok(())
    }

    fn insert(
        &mut self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<Vec<String>> {
        let existing: HashSet<RowKey> = self
            .tables
            .get(&kind)
            .map(|rows| rows.iter().map(row_key).collect())
            .unwrap_or_default();

        let mut batch_keys = HashSet::new();
        let mut prepared = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(mut row) = item else {
                return Err(CloudError::InvalidParameter(format!(
                    "{} create item must be an object",
                    kind
                )));
            };
            row.insert("vendor".to_string(), Value::String(vendor.to_string()));
            let row = Value::Object(row);

            let key = row_key(&row);
            if key.2.is_empty() {
                return Err(CloudError::InvalidParameter(format!(
                    "{} create item has no cloud_id",
                    kind
                )));
            }
            if existing.contains(&key) || !batch_keys.insert(key.clone()) {
                return Err(CloudError::ResourceAlreadyExists(format!(
                    "{} {}/{} already exists",
                    kind, key.1, key.2
                )));
            }
            prepared.push(row);
        }

        let now = Value::String(Utc::now().to_rfc3339());
        let mut ids = Vec::with_capacity(prepared.len());
        for mut row in prepared {
            self.next_id += 1;
            let id = format!("{:08}", self.next_id);
            if let Value::Object(map) = &mut row {
                map.insert("id".to_string(), Value::String(id.clone()));
                map.insert("creator".to_string(), Value::String(kt.user.clone()));
                map.insert("reviser".to_string(), Value::String(kt.user.clone()));
                map.insert("created_at".to_string(), now.clone());
                map.insert("updated_at".to_string(), now.clone());
            }
            self.tables.entry(kind).or_default().push(row);
            ids.push(id);
        }
        Ok(ids)
    }
}

/// Data-service backed by process memory
#[derive(Debug, Default)]
pub struct MemoryDataService {
    inner: Mutex<Inner>,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows without touching the call counters
    pub async fn seed(
        &self,
        kind: ResourceKind,
        vendor: Vendor,
        rows: Vec<Value>,
    ) -> Result<Vec<String>> {
        let kt = Kit::new().with_user("seed");
        self.inner.lock().await.insert(&kt, kind, vendor, rows)
    }

    /// Snapshot of one table
    pub async fn rows(&self, kind: ResourceKind) -> Vec<Value> {
        self.inner
            .lock()
            .await
            .tables
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Cloud ids of one table, optionally narrowed to a vendor and account
    pub async fn cloud_ids(
        &self,
        kind: ResourceKind,
        vendor: Vendor,
        account_id: &str,
    ) -> HashSet<String> {
        self.rows(kind)
            .await
            .iter()
            .filter(|row| {
                str_field(row, "vendor") == vendor.as_str()
                    && str_field(row, "account_id") == account_id
            })
            .map(|row| str_field(row, "cloud_id").to_string())
            .collect()
    }

    pub async fn stats(&self) -> CallStats {
        self.inner.lock().await.stats.clone()
    }

    pub async fn reset_stats(&self) {
        self.inner.lock().await.stats = CallStats::default();
    }

    /// Let the first `after` calls of `op` succeed, fail every later one
    pub async fn fail_after(&self, op: Operation, after: usize) {
        self.inner
            .lock()
            .await
            .failures
            .insert(op, Failure { after, seen: 0 });
    }

    pub async fn clear_failures(&self) {
        self.inner.lock().await.failures.clear();
    }
}

#[async_trait]
impl DataService for MemoryDataService {
    async fn list(
        &self,
        _kt: &Kit,
        kind: ResourceKind,
        vendor: Option<Vendor>,
        req: &ListReq,
    ) -> Result<ListResult<Value>> {
        req.validate()?;

        let mut inner = self.inner.lock().await;
        inner.stats.list_calls += 1;
        inner.check_failure(Operation::List)?;

        let rows = inner.tables.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        let matched = rows.iter().filter(|row| {
            vendor.is_none_or(|v| str_field(row, "vendor") == v.as_str())
                && req.filter.matches(row)
        });

        if req.page.count {
            return Ok(ListResult {
                count: matched.count() as u64,
                details: Vec::new(),
            });
        }

        let details = matched
            .skip(req.page.start as usize)
            .take(req.page.limit as usize)
            .map(|row| project(row, &req.fields))
            .collect();
        Ok(ListResult { count: 0, details })
    }

    async fn batch_create(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<BatchCreateResult> {
        let mut inner = self.inner.lock().await;
        inner.stats.create_calls += 1;
        inner.check_failure(Operation::Create)?;

        let ids = inner.insert(kt, kind, vendor, items)?;
        inner.stats.created_rows += ids.len();
        tracing::debug!(rid = %kt.rid, %kind, %vendor, count = ids.len(), "rows created");
        Ok(BatchCreateResult { ids })
    }

    async fn batch_update(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.stats.update_calls += 1;
        inner.check_failure(Operation::Update)?;

        let table = inner.tables.entry(kind).or_default();
        let mut targets = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(fields) = item else {
                return Err(CloudError::InvalidParameter(format!(
                    "{} update item must be an object",
                    kind
                )));
            };
            let id = fields
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| CloudError::InvalidParameter("update item has no id".to_string()))?;
            let index = table
                .iter()
                .position(|row| str_field(row, "id") == id && str_field(row, "vendor") == vendor.as_str())
                .ok_or_else(|| CloudError::ResourceNotFound(format!("{} {}", kind, id)))?;
            targets.push((index, fields));
        }

        let now = Value::String(Utc::now().to_rfc3339());
        let updated = targets.len();
        for (index, fields) in targets {
            if let Some(Value::Object(row)) = table.get_mut(index) {
                for (key, value) in fields {
                    if matches!(key.as_str(), "id" | "vendor" | "account_id" | "cloud_id") {
                        continue;
                    }
                    row.insert(key, value);
                }
                row.insert("reviser".to_string(), Value::String(kt.user.clone()));
                row.insert("updated_at".to_string(), now.clone());
            }
        }
        inner.stats.updated_rows += updated;
        Ok(())
    }

    async fn batch_update_base_info(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        req: &BaseInfoUpdateReq,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.stats.update_base_info_calls += 1;
        inner.check_failure(Operation::UpdateBaseInfo)?;

        if req.ids.is_empty() {
            return Err(CloudError::InvalidParameter("ids is required".to_string()));
        }

        let table = inner.tables.entry(kind).or_default();
        let wanted: HashSet<&str> = req.ids.iter().map(String::as_str).collect();
        let found = table
            .iter()
            .filter(|row| wanted.contains(str_field(row, "id")))
            .count();
        if found != wanted.len() {
            return Err(CloudError::ResourceNotFound(format!(
                "{} base info update matched {} of {} rows",
                kind,
                found,
                wanted.len()
            )));
        }

        let now = Value::String(Utc::now().to_rfc3339());
        for row in table.iter_mut() {
            if !wanted.contains(str_field(row, "id")) {
                continue;
            }
            if let Value::Object(map) = row {
                if let Some(name) = &req.data.name {
                    map.insert("name".to_string(), Value::String(name.clone()));
                }
                if let Some(memo) = &req.data.memo {
                    map.insert("memo".to_string(), Value::String(memo.clone()));
                }
                if let Some(bk_biz_id) = req.data.bk_biz_id {
                    map.insert("bk_biz_id".to_string(), Value::from(bk_biz_id));
                }
                map.insert("reviser".to_string(), Value::String(kt.user.clone()));
                map.insert("updated_at".to_string(), now.clone());
            }
        }
        inner.stats.updated_rows += found;
        Ok(())
    }

    async fn batch_delete(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        req: &BatchDeleteReq,
    ) -> Result<()> {
        req.filter.validate()?;

        let mut inner = self.inner.lock().await;
        inner.stats.delete_calls += 1;
        inner.check_failure(Operation::Delete)?;

        let table = inner.tables.entry(kind).or_default();
        let before = table.len();
        table.retain(|row| !req.filter.matches(row));
        let deleted = before - table.len();

        inner.stats.deleted_rows += deleted;
        tracing::debug!(rid = %kt.rid, %kind, deleted, "rows deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcm_cloud::{AtomRule, BaseInfo, Expression, Page};
    use serde_json::json;

    fn vpc(account: &str, cloud_id: &str) -> Value {
        json!({
            "account_id": account,
            "cloud_id": cloud_id,
            "bk_biz_id": -1,
            "name": cloud_id,
            "region": "ap-guangzhou",
        })
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_revision() {
        let store = MemoryDataService::new();
        let kt = Kit::new().with_user("alice");
        let result = store
            .batch_create(
                &kt,
                ResourceKind::Vpc,
                Vendor::TCloud,
                vec![vpc("acc-1", "vpc-1"), vpc("acc-1", "vpc-2")],
            )
            .await
            .unwrap();
        assert_eq!(result.ids, vec!["00000001", "00000002"]);

        let rows = store.rows(ResourceKind::Vpc).await;
        assert_eq!(rows[0]["vendor"], "tcloud");
        assert_eq!(rows[0]["creator"], "alice");
        assert!(rows[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_cloud_id_is_rejected() {
        let store = MemoryDataService::new();
        let kt = Kit::new();
        store
            .batch_create(&kt, ResourceKind::Vpc, Vendor::Aws, vec![vpc("acc-1", "vpc-1")])
            .await
            .unwrap();

        let err = store
            .batch_create(&kt, ResourceKind::Vpc, Vendor::Aws, vec![vpc("acc-1", "vpc-1")])
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ResourceAlreadyExists(_)));

        // Same cloud id under another account or vendor is a different row
        store
            .batch_create(&kt, ResourceKind::Vpc, Vendor::Aws, vec![vpc("acc-2", "vpc-1")])
            .await
            .unwrap();
        store
            .batch_create(&kt, ResourceKind::Vpc, Vendor::Gcp, vec![vpc("acc-1", "vpc-1")])
            .await
            .unwrap();
        assert_eq!(store.rows(ResourceKind::Vpc).await.len(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_pages_and_counts() {
        let store = MemoryDataService::new();
        let rows: Vec<Value> = (0..7).map(|i| vpc("acc-1", &format!("vpc-{}", i))).collect();
        store.seed(ResourceKind::Vpc, Vendor::Aws, rows).await.unwrap();
        store
            .seed(ResourceKind::Vpc, Vendor::Azure, vec![vpc("acc-1", "other")])
            .await
            .unwrap();

        let kt = Kit::new();
        let filter = Expression::and([AtomRule::eq("account_id", "acc-1")]);

        let page = ListReq::new(filter.clone(), Page::new(5, 5));
        let result = store
            .list(&kt, ResourceKind::Vpc, Some(Vendor::Aws), &page)
            .await
            .unwrap();
        assert_eq!(result.details.len(), 2);

        let count = ListReq::new(filter.clone(), Page::count());
        let all = store.list(&kt, ResourceKind::Vpc, None, &count).await.unwrap();
        assert_eq!(all.count, 8);

        let projected = ListReq::new(filter, Page::new(0, 1)).with_fields(["id", "cloud_id"]);
        let result = store
            .list(&kt, ResourceKind::Vpc, Some(Vendor::Aws), &projected)
            .await
            .unwrap();
        assert_eq!(result.details[0], json!({"id": "00000001", "cloud_id": "vpc-0"}));
    }

    #[tokio::test]
    async fn test_update_keeps_identity_fields() {
        let store = MemoryDataService::new();
        let ids = store
            .seed(ResourceKind::Subnet, Vendor::HuaWei, vec![vpc("acc-1", "subnet-1")])
            .await
            .unwrap();
        let kt = Kit::new();

        store
            .batch_update(
                &kt,
                ResourceKind::Subnet,
                Vendor::HuaWei,
                vec![json!({"id": ids[0], "name": "renamed", "cloud_id": "hijack"})],
            )
            .await
            .unwrap();

        let rows = store.rows(ResourceKind::Subnet).await;
        assert_eq!(rows[0]["name"], "renamed");
        assert_eq!(rows[0]["cloud_id"], "subnet-1");

        let missing = store
            .batch_update(
                &kt,
                ResourceKind::Subnet,
                Vendor::HuaWei,
                vec![json!({"id": "99999999", "name": "x"})],
            )
            .await;
        assert!(matches!(missing, Err(CloudError::ResourceNotFound(_))));
        assert_eq!(store.stats().await.updated_rows, 1);
    }

    #[tokio::test]
    async fn test_base_info_and_delete() {
        let store = MemoryDataService::new();
        let ids = store
            .seed(
                ResourceKind::Vpc,
                Vendor::Gcp,
                vec![vpc("acc-1", "a"), vpc("acc-1", "b")],
            )
            .await
            .unwrap();
        let kt = Kit::new();

        store
            .batch_update_base_info(
                &kt,
                ResourceKind::Vpc,
                &BaseInfoUpdateReq {
                    ids: vec![ids[0].clone()],
                    data: BaseInfo {
                        bk_biz_id: Some(42),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(store.rows(ResourceKind::Vpc).await[0]["bk_biz_id"], 42);

        store
            .batch_delete(
                &kt,
                ResourceKind::Vpc,
                &BatchDeleteReq {
                    filter: Expression::containers("id", &ids[1..]),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            store.cloud_ids(ResourceKind::Vpc, Vendor::Gcp, "acc-1").await,
            HashSet::from(["a".to_string()])
        );
        assert_eq!(store.stats().await.deleted_rows, 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryDataService::new();
        store.fail_after(Operation::Create, 1).await;
        let kt = Kit::new();

        assert!(
            store
                .batch_create(&kt, ResourceKind::Vpc, Vendor::Aws, vec![vpc("acc-1", "a")])
                .await
                .is_ok()
        );
        assert!(matches!(
            store
                .batch_create(&kt, ResourceKind::Vpc, Vendor::Aws, vec![vpc("acc-1", "b")])
                .await,
            Err(CloudError::DataService(_))
        ));
        assert_eq!(store.stats().await.create_calls, 2);
    }
}
