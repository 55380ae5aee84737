//! Vendor gateway adaptor for HCM
//!
//! Implements `VpcAdaptor`, `SubnetAdaptor` and `NetworkInterfaceAdaptor` for
//! every vendor by forwarding each call to the vendor gateway's JSON API.
//!
//! # Example
//!
//! ```ignore
//! use hcm_cloud::{AwsVpcExtension, Kit, ListOption, VpcAdaptor, collect_pages};
//! use hcm_cloud_gateway::{GatewayClient, GatewayConfig};
//!
//! let gateway = GatewayClient::new(GatewayConfig::new("http://127.0.0.1:9601"))?;
//! let opt = ListOption::new("acc-1", "us-east-1");
//! let vpcs = collect_pages(&opt, |o| async move {
//!     VpcAdaptor::<AwsVpcExtension>::list_vpc(&gateway, &Kit::new(), &o).await
//! })
//! .await?;
//! ```

pub mod client;
pub mod error;

pub use client::{GatewayClient, GatewayConfig};
pub use error::{GatewayError, Result};
