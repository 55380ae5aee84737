//! Native AWS adaptor for HCM
//!
//! Talks to EC2 directly through `aws-sdk-ec2` instead of the vendor gateway.
//! Covers AWS VPCs and subnets; everything else stays on the gateway.
//!
//! # Example
//!
//! ```ignore
//! use hcm_cloud_aws::AwsAdaptor;
//! use hcm_cloud::{AwsVpcExtension, Kit, ListOption, VpcAdaptor};
//!
//! let aws = AwsAdaptor::from_env().await;
//! let page = VpcAdaptor::<AwsVpcExtension>::list_vpc(
//!     &aws,
//!     &Kit::new(),
//!     &ListOption::new("acc-1", "us-east-1"),
//! )
//! .await?;
//! ```

pub mod adaptor;
mod convert;
pub mod error;

pub use adaptor::AwsAdaptor;
pub use error::{AwsError, Result};
