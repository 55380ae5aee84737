//! HCM Cloud Core
//!
//! Vendor-neutral model of the network resources hc-service keeps in sync
//! with the cloud vendors (AWS, Azure, GCP, HuaWei, TCloud).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   hc-service                     │
//! │         (sync / create / count-ip routes)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                   hcm-sync                       │
//! │   list → load db → diff → write → sweep stale    │
//! └───────┬─────────────────────────┬───────────────┘
//!         │                         │
//! ┌───────▼─────────────────────────▼───────────────┐
//! │                   hcm-cloud                      │
//! │  ┌────────────────────┐  ┌──────────────────┐   │
//! │  │ trait VpcAdaptor<E>│  │ trait DataService│   │
//! │  │ SubnetAdaptor<E>   │  │ Expression/Page  │   │
//! │  │ NetworkInterface.. │  │                  │   │
//! │  └────────────────────┘  └──────────────────┘   │
//! │  CloudResource<Spec, Ext>  VendorExtension       │
//! └───────┬─────────────────────────┬───────────────┘
//!         │                         │
//! ┌───────▼───────┐         ┌───────▼────────┐
//! │ cloud-gateway │         │  dataservice   │
//! │ cloud-aws     │         │ (memory/http)  │
//! └───────────────┘         └────────────────┘
//! ```

pub mod action;
pub mod adaptor;
pub mod data_service;
pub mod error;
pub mod extension;
pub mod filter;
pub mod kit;
pub mod resource;
pub mod retry;
pub mod vendor;

// Re-exports
pub use action::{ActionType, SyncResult, SyncSummary};
pub use adaptor::{
    AvailIpResult, CountIpOption, ListOption, ListPage, MAX_CLOUD_ID_FILTER, MAX_NI_ID_FILTER,
    NetworkInterfaceAdaptor, PageCursor, ResourceLocator, SubnetAdaptor, SubnetCreateOption,
    UpdateOption, VpcAdaptor, VpcCreateOption, collect_pages,
};
pub use data_service::{
    BaseInfo, BaseInfoUpdateReq, BatchCreateResult, BatchDeleteReq, DataService, DataServiceExt,
    ListReq, ListResult,
};
pub use error::{CloudError, Result};
pub use extension::*;
pub use filter::{
    AtomRule, DEFAULT_MAX_IN_LIMIT, DEFAULT_MAX_PAGE_LIMIT, DEFAULT_MAX_RULE_LIMIT, Expression,
    LogicOp, Op, Page, Rule,
};
pub use kit::Kit;
pub use resource::{
    CloudItem, CloudNetworkInterface, CloudResource, CloudSubnet, CloudVpc, CreateReq,
    NetworkInterface, NetworkInterfaceSpec, ResourceRef, ResourceSpec, Revision, Subnet,
    SubnetSpec, UNASSIGNED_BIZ, UNBIND_BK_CLOUD_ID, UpdateReq, Vpc, VpcCategory, VpcSpec,
};
pub use retry::{RetryConfig, RetryOutcome};
pub use vendor::{ResourceKind, Vendor};
