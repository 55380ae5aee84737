//! Cloud sync error types

use crate::vendor::Vendor;
use thiserror::Error;

/// Errors raised by adaptors, the data-service layer and the sync engine
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Too many requests: {0}")]
    TooManyRequest(String),

    #[error("Vendor not supported: {0}")]
    VendorNotSupported(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Resource is not assigned to a business: {0}")]
    BizUnassigned(String),

    #[error("Cloud listing is empty: {0}")]
    EmptyListing(String),

    #[error("Validate resource not exist failed before delete: {0}")]
    StaleStillExists(String),

    #[error("{vendor} API error: {message}")]
    ApiError { vendor: Vendor, message: String },

    #[error("Data service error: {0}")]
    DataService(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Shorthand for a vendor API failure
    pub fn api(vendor: Vendor, message: impl Into<String>) -> Self {
        CloudError::ApiError {
            vendor,
            message: message.into(),
        }
    }

    /// True when the error is a clean "resource does not exist" answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }

    /// Input errors are rejected before any cloud or data-service call
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CloudError::InvalidParameter(_)
                | CloudError::TooManyRequest(_)
                | CloudError::VendorNotSupported(_)
                | CloudError::BizUnassigned(_)
        )
    }

    /// HTTP status the error maps to at the service boundary
    pub fn status_code(&self) -> u16 {
        match self {
            CloudError::InvalidParameter(_)
            | CloudError::TooManyRequest(_)
            | CloudError::VendorNotSupported(_)
            | CloudError::BizUnassigned(_) => 400,
            CloudError::ResourceNotFound(_) => 404,
            CloudError::ResourceAlreadyExists(_) | CloudError::LockError(_) => 409,
            CloudError::Timeout(_) => 504,
            _ => 500,
        }
    }

    /// Numeric error code carried in the response envelope
    pub fn code(&self) -> i32 {
        match self {
            CloudError::InvalidParameter(_) => 2000006,
            CloudError::TooManyRequest(_) => 2000015,
            CloudError::VendorNotSupported(_) => 2000007,
            CloudError::ResourceNotFound(_) => 2000010,
            CloudError::ResourceAlreadyExists(_) => 2000011,
            CloudError::BizUnassigned(_) => 2000016,
            CloudError::LockError(_) => 2000017,
            CloudError::Timeout(_) => 2000018,
            _ => 2000000,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
