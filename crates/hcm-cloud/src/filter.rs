//! Filter expressions and paging for data-service queries
//!
//! An [`Expression`] is an AND/OR tree whose leaves are [`AtomRule`]s
//! (`field op value`). It serializes to the wire format the data-service
//! accepts and can also be evaluated locally against a JSON row.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum page size of one list call
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 500;

/// Maximum number of values in one `in` rule
pub const DEFAULT_MAX_IN_LIMIT: usize = 500;

/// Maximum number of rules in one expression layer
pub const DEFAULT_MAX_RULE_LIMIT: usize = 10;

const MAX_EXPRESSION_DEPTH: usize = 2;

/// Logical operator joining the rules of one expression layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOp {
    And,
    Or,
}

/// Comparison operator of an atom rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "neq")]
    NotEqual,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterThanEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    LessThanEqual,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "nin")]
    NotIn,
    #[serde(rename = "cs")]
    ContainsSensitive,
    #[serde(rename = "cis")]
    ContainsInsensitive,
    #[serde(rename = "json_eq")]
    JsonEqual,
    #[serde(rename = "json_neq")]
    JsonNotEqual,
    #[serde(rename = "json_in")]
    JsonIn,
}

impl Op {
    fn takes_list(&self) -> bool {
        matches!(self, Op::In | Op::NotIn | Op::JsonIn)
    }

    fn is_json(&self) -> bool {
        matches!(self, Op::JsonEqual | Op::JsonNotEqual | Op::JsonIn)
    }
}

/// `field op value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRule {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl AtomRule {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Equal, value)
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::NotEqual, value)
    }

    pub fn in_list<S: AsRef<str>>(field: impl Into<String>, values: &[S]) -> Self {
        let values: Vec<Value> = values
            .iter()
            .map(|v| Value::String(v.as_ref().to_string()))
            .collect();
        Self::new(field, Op::In, Value::Array(values))
    }

    pub fn json_in<S: AsRef<str>>(field: impl Into<String>, values: &[S]) -> Self {
        let values: Vec<Value> = values
            .iter()
            .map(|v| Value::String(v.as_ref().to_string()))
            .collect();
        Self::new(field, Op::JsonIn, Value::Array(values))
    }

    fn validate(&self) -> Result<()> {
        if self.field.is_empty() {
            return Err(CloudError::InvalidParameter(
                "filter rule field is empty".to_string(),
            ));
        }

        if self.op.is_json() && !self.field.contains('.') {
            return Err(CloudError::InvalidParameter(format!(
                "json operator requires a nested field, got {}",
                self.field
            )));
        }

        if self.op.takes_list() {
            let values = self.value.as_array().ok_or_else(|| {
                CloudError::InvalidParameter(format!("{} rule value must be an array", self.field))
            })?;
            if values.is_empty() {
                return Err(CloudError::InvalidParameter(format!(
                    "{} rule value is empty",
                    self.field
                )));
            }
            if values.len() > DEFAULT_MAX_IN_LIMIT {
                return Err(CloudError::InvalidParameter(format!(
                    "{} rule value exceeds {} items",
                    self.field, DEFAULT_MAX_IN_LIMIT
                )));
            }
        }

        if matches!(self.op, Op::ContainsSensitive | Op::ContainsInsensitive)
            && !self.value.is_string()
        {
            return Err(CloudError::InvalidParameter(format!(
                "{} contains rule value must be a string",
                self.field
            )));
        }

        Ok(())
    }

    /// Evaluate against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        let field = lookup(row, &self.field);

        match self.op {
            Op::Equal | Op::JsonEqual => field.is_some_and(|v| loose_eq(v, &self.value)),
            Op::NotEqual | Op::JsonNotEqual => !field.is_some_and(|v| loose_eq(v, &self.value)),
            Op::GreaterThan => compare(field, &self.value).is_some_and(|o| o.is_gt()),
            Op::GreaterThanEqual => compare(field, &self.value).is_some_and(|o| o.is_ge()),
            Op::LessThan => compare(field, &self.value).is_some_and(|o| o.is_lt()),
            Op::LessThanEqual => compare(field, &self.value).is_some_and(|o| o.is_le()),
            Op::In | Op::JsonIn => field.is_some_and(|v| in_values(v, &self.value)),
            Op::NotIn => !field.is_some_and(|v| in_values(v, &self.value)),
            Op::ContainsSensitive => match (field.and_then(Value::as_str), self.value.as_str()) {
                (Some(f), Some(needle)) => f.contains(needle),
                _ => false,
            },
            Op::ContainsInsensitive => match (field.and_then(Value::as_str), self.value.as_str()) {
                (Some(f), Some(needle)) => f.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
        }
    }
}

fn lookup<'a>(row: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(row, |current, segment| current.get(segment))
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(field: Option<&Value>, value: &Value) -> Option<std::cmp::Ordering> {
    let field = field?;
    if let (Some(a), Some(b)) = (field.as_f64(), value.as_f64()) {
        return a.partial_cmp(&b);
    }
    match (field.as_str(), value.as_str()) {
        (Some(a), Some(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn in_values(field: &Value, values: &Value) -> bool {
    values
        .as_array()
        .is_some_and(|list| list.iter().any(|v| loose_eq(field, v)))
}

/// Either a leaf rule or a nested expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
    Atom(AtomRule),
    Expression(Expression),
}

impl From<AtomRule> for Rule {
    fn from(rule: AtomRule) -> Self {
        Rule::Atom(rule)
    }
}

impl From<Expression> for Rule {
    fn from(expr: Expression) -> Self {
        Rule::Expression(expr)
    }
}

/// AND/OR tree of rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub op: LogicOp,
    pub rules: Vec<Rule>,
}

impl Expression {
    pub fn and<R: Into<Rule>>(rules: impl IntoIterator<Item = R>) -> Self {
        Self {
            op: LogicOp::And,
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn or<R: Into<Rule>>(rules: impl IntoIterator<Item = R>) -> Self {
        Self {
            op: LogicOp::Or,
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// `field IN values` as a one-rule expression
    pub fn containers<S: AsRef<str>>(field: &str, values: &[S]) -> Self {
        Self::and([AtomRule::in_list(field, values)])
    }

    /// Append a rule to this layer
    pub fn push(&mut self, rule: impl Into<Rule>) {
        self.rules.push(rule.into());
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_layer(1)
    }

    fn validate_layer(&self, depth: usize) -> Result<()> {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(CloudError::InvalidParameter(format!(
                "filter expression nests deeper than {} layers",
                MAX_EXPRESSION_DEPTH
            )));
        }
        if self.rules.is_empty() {
            return Err(CloudError::InvalidParameter(
                "filter expression has no rules".to_string(),
            ));
        }
        if self.rules.len() > DEFAULT_MAX_RULE_LIMIT {
            return Err(CloudError::InvalidParameter(format!(
                "filter expression has {} rules, limit is {}",
                self.rules.len(),
                DEFAULT_MAX_RULE_LIMIT
            )));
        }

        for rule in &self.rules {
            match rule {
                Rule::Atom(atom) => atom.validate()?,
                Rule::Expression(expr) => expr.validate_layer(depth + 1)?,
            }
        }
        Ok(())
    }

    /// Evaluate against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        let mut results = self.rules.iter().map(|rule| match rule {
            Rule::Atom(atom) => atom.matches(row),
            Rule::Expression(expr) => expr.matches(row),
        });

        match self.op {
            LogicOp::And => results.all(|m| m),
            LogicOp::Or => results.any(|m| m),
        }
    }
}

/// Page specification; `count` asks for the total only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub count: bool,
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub limit: u32,
}

impl Page {
    pub fn new(start: u32, limit: u32) -> Self {
        Self {
            count: false,
            start,
            limit,
        }
    }

    /// Count-only page
    pub fn count() -> Self {
        Self {
            count: true,
            start: 0,
            limit: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.count {
            if self.start != 0 || self.limit != 0 {
                return Err(CloudError::InvalidParameter(
                    "count page must not set start or limit".to_string(),
                ));
            }
            return Ok(());
        }

        if self.limit == 0 {
            return Err(CloudError::InvalidParameter(
                "page limit is required".to_string(),
            ));
        }
        if self.limit > DEFAULT_MAX_PAGE_LIMIT {
            return Err(CloudError::InvalidParameter(format!(
                "page limit {} exceeds {}",
                self.limit, DEFAULT_MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_MAX_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "vendor": "gcp",
            "account_id": "acc-1",
            "cloud_id": "1234",
            "name": "Prod-Network",
            "bk_biz_id": -1,
            "extension": { "self_link": "https://compute/projects/p/global/networks/prod" },
        })
    }

    #[test]
    fn test_and_or_evaluation() {
        let expr = Expression::and([
            Rule::from(AtomRule::eq("vendor", "gcp")),
            Rule::from(Expression::or([
                AtomRule::eq("account_id", "acc-2"),
                AtomRule::in_list("cloud_id", &["1234", "5678"]),
            ])),
        ]);
        assert!(expr.validate().is_ok());
        assert!(expr.matches(&row()));

        let miss = Expression::and([AtomRule::eq("vendor", "aws")]);
        assert!(!miss.matches(&row()));
    }

    #[test]
    fn test_json_and_contains_ops() {
        let expr = Expression::and([
            AtomRule::json_in(
                "extension.self_link",
                &["https://compute/projects/p/global/networks/prod"],
            ),
            AtomRule::new("name", Op::ContainsInsensitive, "prod"),
            AtomRule::new("bk_biz_id", Op::LessThan, 0),
        ]);
        assert!(expr.validate().is_ok());
        assert!(expr.matches(&row()));
    }

    #[test]
    fn test_validate_limits() {
        let too_many: Vec<AtomRule> = (0..11).map(|i| AtomRule::eq("name", i)).collect();
        assert!(Expression::and(too_many).validate().is_err());

        let ids: Vec<String> = (0..501).map(|i| format!("id-{}", i)).collect();
        assert!(Expression::containers("id", &ids).validate().is_err());

        let empty: Vec<String> = Vec::new();
        assert!(Expression::containers("id", &empty).validate().is_err());

        let bad_json = Expression::and([AtomRule::new("self_link", Op::JsonEqual, "x")]);
        assert!(bad_json.validate().is_err());
    }

    #[test]
    fn test_wire_format() {
        let expr = Expression::and([AtomRule::eq("vendor", "aws")]);
        let wire = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            wire,
            json!({"op": "and", "rules": [{"field": "vendor", "op": "eq", "value": "aws"}]})
        );

        let nested: Expression = serde_json::from_value(json!({
            "op": "or",
            "rules": [
                {"field": "region", "op": "eq", "value": "eu-west-1"},
                {"op": "and", "rules": [{"field": "zone", "op": "neq", "value": "a"}]}
            ]
        }))
        .unwrap();
        assert!(matches!(nested.rules[1], Rule::Expression(_)));
    }

    #[test]
    fn test_page_validation() {
        assert!(Page::default().validate().is_ok());
        assert!(Page::count().validate().is_ok());
        assert!(Page::new(0, 0).validate().is_err());
        assert!(Page::new(0, 501).validate().is_err());
    }
}
