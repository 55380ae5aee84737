//! Cloud vs DB classification

use crate::syncer::{Item, Row};
use hcm_cloud::VendorExtension;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A cloud item whose DB row differs in a tracked field
#[derive(Debug, Clone)]
pub struct Changed<E: VendorExtension> {
    pub cloud: Item<E>,
    pub db: Row<E>,
}

/// Outcome of classifying one listing against the DB snapshot
#[derive(Debug)]
pub struct DiffPlan<E: VendorExtension> {
    pub creates: Vec<Item<E>>,
    pub updates: Vec<Changed<E>>,
    pub unchanged: usize,
}

/// Classify each cloud item as create, update or skip by `cloud_id`
pub fn diff<E, F>(items: Vec<Item<E>>, db: &HashMap<String, Row<E>>, is_changed: F) -> DiffPlan<E>
where
    E: VendorExtension,
    F: Fn(&Item<E>, &Row<E>) -> bool,
{
    let mut plan = DiffPlan {
        creates: Vec::new(),
        updates: Vec::new(),
        unchanged: 0,
    };
    let mut seen = HashSet::new();

    for item in items {
        if !seen.insert(item.cloud_id.clone()) {
            tracing::warn!(cloud_id = %item.cloud_id, "duplicate cloud id in listing, skipped");
            continue;
        }

        match db.get(&item.cloud_id) {
            None => plan.creates.push(item),
            Some(row) if is_changed(&item, row) => plan.updates.push(Changed {
                cloud: item,
                db: row.clone(),
            }),
            Some(_) => plan.unchanged += 1,
        }
    }
    plan
}

/// Order-independent equality of two lists
pub fn same_set<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut counts: HashMap<&T, isize> = HashMap::with_capacity(a.len());
    for x in a {
        *counts.entry(x).or_default() += 1;
    }
    for x in b {
        *counts.entry(x).or_default() -= 1;
    }
    counts.values().all(|n| *n == 0)
}

/// Extension comparison; a DB row without extension never counts as changed
pub fn extension_changed<E, F>(cloud: &E, db: Option<&E>, changed: F) -> bool
where
    F: FnOnce(&E, &E) -> bool,
{
    match db {
        Some(db) => changed(cloud, db),
        None => false,
    }
}

/// `Option<String>` comparison treating `None` and `""` alike
pub fn opt_str_changed(a: &Option<String>, b: &Option<String>) -> bool {
    a.as_deref().unwrap_or_default() != b.as_deref().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcm_cloud::{AwsVpcExtension, CloudItem, Revision, UNASSIGNED_BIZ, Vendor, VpcSpec};

    fn item(cloud_id: &str, name: &str) -> Item<AwsVpcExtension> {
        CloudItem::new(
            cloud_id,
            VpcSpec::new(name, "us-east-1"),
            AwsVpcExtension::default(),
        )
    }

    fn row(id: &str, cloud_id: &str, name: &str) -> Row<AwsVpcExtension> {
        Row::<AwsVpcExtension> {
            id: id.to_string(),
            vendor: Vendor::Aws,
            account_id: "acc-1".to_string(),
            cloud_id: cloud_id.to_string(),
            bk_biz_id: UNASSIGNED_BIZ,
            spec: VpcSpec::new(name, "us-east-1"),
            extension: Some(AwsVpcExtension::default()),
            revision: Revision::default(),
        }
    }

    #[test]
    fn test_classification() {
        let db = HashMap::from([
            ("vpc-a".to_string(), row("1", "vpc-a", "a")),
            ("vpc-b".to_string(), row("2", "vpc-b", "b")),
        ]);
        let items = vec![item("vpc-a", "a"), item("vpc-b", "b2"), item("vpc-c", "c")];

        let plan = diff(items, &db, |c, d| c.spec.name != d.spec.name);
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].cloud_id, "vpc-c");
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].db.id, "2");
        assert_eq!(plan.updates[0].cloud.spec.name, "b2");
        assert_eq!(plan.unchanged, 1);
    }

    #[test]
    fn test_duplicate_listing_creates_once() {
        let plan = diff(
            vec![item("vpc-x", "x"), item("vpc-x", "x")],
            &HashMap::new(),
            |_, _| false,
        );
        assert_eq!(plan.creates.len(), 1);
    }

    #[test]
    fn test_same_set() {
        let a = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];
        let b = vec!["10.0.0.2".to_string(), "10.0.0.1".to_string()];
        assert!(same_set(&a, &b));
        assert!(!same_set(&a, &b[..1]));
        assert!(!same_set(&["a", "a"], &["a", "b"]));
        assert!(!same_set(&["a", "b", "b"], &["a", "a", "b"]));
    }

    #[test]
    fn test_missing_db_extension_is_unchanged() {
        let ext = AwsVpcExtension {
            state: "available".into(),
            ..Default::default()
        };
        assert!(!extension_changed(&ext, None, |a, b| a != b));
        assert!(extension_changed(
            &ext,
            Some(&AwsVpcExtension::default()),
            |a, b| a != b
        ));
    }

    #[test]
    fn test_opt_str_changed() {
        assert!(!opt_str_changed(&None, &Some(String::new())));
        assert!(opt_str_changed(&Some("a".into()), &None));
    }
}
