//! Gateway adaptor error types

use hcm_cloud::{CloudError, Vendor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Gateway response has no result: {0}")]
    EmptyResult(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Worth another attempt: timeouts, refused connections, 429 and 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Request(e) => e.is_timeout() || e.is_connect(),
            GatewayError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Attribute the failure to the vendor the call was made for
    pub fn into_cloud(self, vendor: Vendor) -> CloudError {
        match self {
            GatewayError::NotFound(what) => CloudError::ResourceNotFound(what),
            GatewayError::InvalidConfig(msg) => CloudError::InvalidParameter(msg),
            GatewayError::Request(e) if e.is_timeout() => CloudError::Timeout(e.to_string()),
            GatewayError::Request(e) => CloudError::Http(e.to_string()),
            GatewayError::Json(e) => CloudError::Json(e),
            GatewayError::Api { status: 400, message } => CloudError::InvalidParameter(message),
            other => CloudError::api(vendor, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
