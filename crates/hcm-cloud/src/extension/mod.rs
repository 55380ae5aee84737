//! Vendor-specific extension payloads
//!
//! Every extension struct is bound to exactly one vendor and one resource
//! spec. The binding is sealed, so a `Vpc<AwsVpcExtension>` can only ever be
//! an AWS VPC.

mod network_interface;
mod subnet;
mod vpc;

pub use network_interface::*;
pub use subnet::*;
pub use vpc::*;

use crate::resource::{NetworkInterfaceSpec, ResourceSpec, SubnetSpec, VpcSpec};
use crate::vendor::Vendor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// Extension payload of one vendor for one resource kind
pub trait VendorExtension:
    sealed::Sealed
    + Serialize
    + DeserializeOwned
    + Clone
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
{
    const VENDOR: Vendor;

    type Spec: ResourceSpec;
}

macro_rules! bind_extension {
    ($($ext:ty => ($vendor:expr, $spec:ty)),* $(,)?) => {
        $(
            impl sealed::Sealed for $ext {}

            impl VendorExtension for $ext {
                const VENDOR: Vendor = $vendor;
                type Spec = $spec;
            }
        )*
    };
}

bind_extension! {
    AwsVpcExtension => (Vendor::Aws, VpcSpec),
    AzureVpcExtension => (Vendor::Azure, VpcSpec),
    GcpVpcExtension => (Vendor::Gcp, VpcSpec),
    HuaWeiVpcExtension => (Vendor::HuaWei, VpcSpec),
    TCloudVpcExtension => (Vendor::TCloud, VpcSpec),
    AwsSubnetExtension => (Vendor::Aws, SubnetSpec),
    AzureSubnetExtension => (Vendor::Azure, SubnetSpec),
    GcpSubnetExtension => (Vendor::Gcp, SubnetSpec),
    HuaWeiSubnetExtension => (Vendor::HuaWei, SubnetSpec),
    TCloudSubnetExtension => (Vendor::TCloud, SubnetSpec),
    AzureNIExtension => (Vendor::Azure, NetworkInterfaceSpec),
    GcpNIExtension => (Vendor::Gcp, NetworkInterfaceSpec),
    HuaWeiNIExtension => (Vendor::HuaWei, NetworkInterfaceSpec),
}
