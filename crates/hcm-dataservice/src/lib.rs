//! Data-service backends
//!
//! - [`MemoryDataService`]: in-process store used by tests and by hc-service
//!   when no remote endpoint is configured
//! - [`HttpDataService`]: client of the remote data-service

pub mod client;
pub mod memory;

pub use client::{HttpDataService, HttpDataServiceConfig};
pub use memory::{CallStats, MemoryDataService, Operation};
