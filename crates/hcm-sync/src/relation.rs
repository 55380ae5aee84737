//! Parent resolution
//!
//! Subnets point at their VPC, interfaces at their subnet and VPC. The cloud
//! reports those parents by cloud id (or GCP self link); the DB wants the
//! internal id. A [`ParentResolver`] looks the parents up and, when some are
//! missing, runs a sync of the parent kind before looking again.

use crate::loader;
use crate::request::{ScopeFilter, SyncRequest};
use crate::syncer::Syncer;
use hcm_cloud::{
    CloudError, DEFAULT_MAX_IN_LIMIT, DataService, Kit, ResourceKind, Result, Vendor,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// How the child refers to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKey {
    CloudId,
    /// GCP resource URL kept in `extension.self_link`
    SelfLink,
}

impl ParentKey {
    fn field(&self) -> &'static str {
        match self {
            ParentKey::CloudId => "cloud_id",
            ParentKey::SelfLink => "extension.self_link",
        }
    }
}

/// Internal identity of a resolved parent
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParentRef {
    pub id: String,
    pub cloud_id: String,
    /// Set when the parent is a subnet
    #[serde(default)]
    pub vpc_id: String,
    #[serde(default)]
    pub cloud_vpc_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub zone: String,
}

/// Resolves parents of one kind for one vendor
pub struct ParentResolver {
    data: Arc<dyn DataService>,
    vendor: Vendor,
    kind: ResourceKind,
    syncer: Arc<dyn Syncer>,
}

impl ParentResolver {
    /// `syncer` must sync the parent kind of the same vendor
    pub fn new(data: Arc<dyn DataService>, syncer: Arc<dyn Syncer>) -> Self {
        Self {
            data,
            vendor: syncer.vendor(),
            kind: syncer.kind(),
            syncer,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Look parents up in the DB, keyed by cloud id or self link
    pub async fn query(
        &self,
        kt: &Kit,
        account_id: &str,
        by: ParentKey,
        keys: &[String],
    ) -> Result<HashMap<String, ParentRef>> {
        let mut found = HashMap::new();
        for chunk in keys.chunks(DEFAULT_MAX_IN_LIMIT) {
            let filter = match by {
                ParentKey::CloudId => {
                    ScopeFilter::account(self.vendor, account_id).in_list(by.field(), chunk)
                }
                ParentKey::SelfLink => ScopeFilter::account(self.vendor, account_id)
                    .json_in(by.field(), chunk),
            }
            .build();

            let rows = loader::load_values(self.data.as_ref(), kt, self.kind, self.vendor, filter)
                .await?;
            for row in rows {
                let key = match by {
                    ParentKey::CloudId => str_at(&row, &["cloud_id"]),
                    ParentKey::SelfLink => str_at(&row, &["extension", "self_link"]),
                }
                .to_string();
                let parent: ParentRef = serde_json::from_value(row)?;
                found.insert(key, parent);
            }
        }
        Ok(found)
    }

    /// Resolve every key, syncing the parent kind for the ones not in the DB yet
    ///
    /// Cloud-id misses sync just the missing parents. Self-link misses cannot
    /// be narrowed, so the whole scope is synced.
    pub async fn query_ids_and_sync(
        &self,
        kt: &Kit,
        scope: &SyncRequest,
        by: ParentKey,
        keys: &[String],
    ) -> Result<HashMap<String, ParentRef>> {
        let mut keys: Vec<String> = keys.iter().filter(|k| !k.is_empty()).cloned().collect();
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut found = self.query(kt, &scope.account_id, by, &keys).await?;
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !found.contains_key(*k))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(found);
        }

        tracing::info!(
            rid = %kt.rid, vendor = %self.vendor, kind = %self.kind,
            account_id = %scope.account_id, missing = missing.len(),
            "parents not in db, syncing them first"
        );
        let sync_req = match by {
            ParentKey::CloudId => scope.narrowed(missing.clone()),
            ParentKey::SelfLink => scope.narrowed(Vec::new()),
        };
        for chunk in sync_req.cloud_ids.chunks(DEFAULT_MAX_IN_LIMIT) {
            self.syncer.sync(kt, &scope.narrowed(chunk.to_vec())).await?;
        }
        if sync_req.cloud_ids.is_empty() {
            self.syncer.sync(kt, &sync_req).await?;
        }

        let synced = self.query(kt, &scope.account_id, by, &missing).await?;
        let still_missing: Vec<&String> =
            missing.iter().filter(|k| !synced.contains_key(*k)).collect();
        if !still_missing.is_empty() {
            return Err(CloudError::ResourceNotFound(format!(
                "{} {} {:?} not found after sync",
                self.vendor, self.kind, still_missing
            )));
        }

        found.extend(synced);
        Ok(found)
    }
}

fn str_at<'a>(row: &'a Value, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(row, |v, seg| v.get(*seg))
        .and_then(Value::as_str)
        .unwrap_or_default()
}
