//! HCM Sync
//!
//! Reconciles the DB copy of VPCs, subnets and network interfaces with what
//! each cloud vendor reports. One pass:
//!
//! 1. list the scope from the vendor adaptor (all pages)
//! 2. load the DB rows of the same scope
//! 3. diff by `cloud_id` into creates and updates
//! 4. write updates, then creates
//! 5. confirm the rows the cloud no longer reports and delete them
//!
//! The pass is written once in the blanket [`Syncer`] impl; each vendor and
//! kind supplies the steps through [`ResourceSyncer`].

pub mod adaptors;
pub mod diff;
pub mod engine;
pub mod lease;
pub mod loader;
pub mod network_interface;
pub mod registry;
pub mod relation;
pub mod request;
pub mod subnet;
pub mod sweep;
pub mod syncer;
pub mod vpc;
pub mod writer;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use adaptors::{Adaptors, CloudAdaptor};
pub use diff::{Changed, DiffPlan, same_set};
pub use engine::SyncEngine;
pub use lease::{LeaseConfig, LeaseGuard, LeaseKey, LeaseManager, LeasedSyncer};
pub use network_interface::{AzureNISyncer, GcpNISyncer, HuaWeiNISyncer};
pub use registry::SyncerRegistry;
pub use relation::{ParentKey, ParentRef, ParentResolver};
pub use request::{ScopeFilter, SyncRequest};
pub use subnet::{SubnetRules, SubnetSyncer};
pub use syncer::{ConfirmStrategy, ResourceSyncer, Syncer};
pub use vpc::{TCLOUD_QUERY_LIMIT, VpcRules, VpcSyncer};
