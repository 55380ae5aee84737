//! Sync request and its scope

use hcm_cloud::{AtomRule, CloudError, Expression, ListOption, Result, Rule, Vendor};
use serde::{Deserialize, Serialize};

/// One reconciliation request: an account scope plus optional id filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
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
}

impl SyncRequest {
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

    /// Same scope, narrowed to the given cloud ids
    pub fn narrowed(&self, cloud_ids: Vec<String>) -> Self {
        Self {
            cloud_ids,
            cloud_cvm_ids: Vec::new(),
            ..self.clone()
        }
    }

    /// True when the request targets selected resources instead of the whole scope
    pub fn is_partial(&self) -> bool {
        !self.cloud_ids.is_empty() || !self.cloud_cvm_ids.is_empty()
    }

    /// Check required fields and id filter bounds
    pub fn validate(&self, limit: usize) -> Result<()> {
        if self.account_id.is_empty() {
            return Err(CloudError::InvalidParameter(
                "account_id is required".to_string(),
            ));
        }
        self.list_option().check_bound(limit)
    }

    pub fn require_region(&self) -> Result<()> {
        if self.region.is_empty() {
            return Err(CloudError::InvalidParameter("region is required".to_string()));
        }
        Ok(())
    }

    pub fn require_resource_group(&self) -> Result<&str> {
        match self.resource_group_name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(CloudError::InvalidParameter(
                "resource_group_name is required".to_string(),
            )),
        }
    }

    pub fn list_option(&self) -> ListOption {
        ListOption {
            account_id: self.account_id.clone(),
            region: self.region.clone(),
            zone: self.zone.clone(),
            resource_group_name: self.resource_group_name.clone(),
            cloud_ids: self.cloud_ids.clone(),
            cloud_cvm_ids: self.cloud_cvm_ids.clone(),
            ..Default::default()
        }
    }

    /// Lease scope: region, else resource group, else the whole account
    pub fn scope_name(&self) -> &str {
        if !self.region.is_empty() {
            &self.region
        } else if let Some(rg) = self.resource_group_name.as_deref().filter(|rg| !rg.is_empty()) {
            rg
        } else {
            "global"
        }
    }
}

/// Azure resource group names are case-insensitive; rows keep them lowercased
pub fn lowercase_resource_group(rg: &mut String) {
    *rg = rg.to_lowercase();
}

/// Builder of DB scope filters
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    rules: Vec<Rule>,
}

impl ScopeFilter {
    /// `vendor = ? AND account_id = ?`
    pub fn account(vendor: Vendor, account_id: &str) -> Self {
        Self {
            rules: vec![
                AtomRule::eq("vendor", vendor.as_str()).into(),
                AtomRule::eq("account_id", account_id).into(),
            ],
        }
    }

    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.rules.push(AtomRule::eq(field, value).into());
        self
    }

    /// Match on a column stored lowercased, see [`lowercase_resource_group`]
    pub fn eq_lowercase(mut self, field: &str, value: &str) -> Self {
        self.rules.push(AtomRule::eq(field, value.to_lowercase()).into());
        self
    }

    /// `field IN values` on a path inside the extension column
    pub fn json_in(mut self, field: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.rules.push(AtomRule::json_in(field, values).into());
        }
        self
    }

    /// `field IN values`, skipped when `values` is empty
    pub fn in_list(mut self, field: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.rules.push(AtomRule::in_list(field, values).into());
        }
        self
    }

    pub fn build(self) -> Expression {
        Expression::and(self.rules)
    }
}
