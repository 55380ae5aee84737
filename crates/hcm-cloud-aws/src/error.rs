//! AWS adaptor error types

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use hcm_cloud::{CloudError, Vendor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AWS {action} failed ({code}): {message}")]
    Api {
        action: &'static str,
        code: String,
        message: String,
    },

    #[error("AWS resource not found: {0}")]
    NotFound(String),

    #[error("AWS throttled {0}")]
    Throttled(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("AWS response is missing {0}")]
    MissingField(&'static str),
}

impl AwsError {
    /// Classify an SDK error by its service error code
    pub fn from_sdk<E, R>(action: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let code = err.code().unwrap_or_default().to_string();
        if code.ends_with(".NotFound") {
            return AwsError::NotFound(err.message().unwrap_or(code.as_str()).to_string());
        }
        if code == "RequestLimitExceeded" || code == "Throttling" {
            return AwsError::Throttled(action);
        }
        AwsError::Api {
            action,
            code,
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::NotFound(what) => CloudError::ResourceNotFound(what),
            AwsError::InvalidRequest(msg) => CloudError::InvalidParameter(msg),
            other => CloudError::api(Vendor::Aws, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_converts_cleanly() {
        let err: CloudError = AwsError::NotFound("vpc-1".to_string()).into();
        assert!(err.is_not_found());

        let err: CloudError = AwsError::Throttled("DescribeVpcs").into();
        assert!(matches!(err, CloudError::ApiError { vendor: Vendor::Aws, .. }));
    }
}
