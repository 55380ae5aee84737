//! Per-request context threaded through adaptor and data-service calls

use serde::{Deserialize, Serialize};

pub const RID_HEADER: &str = "X-Bkapi-Request-Id";
pub const USER_HEADER: &str = "X-Bkapi-User-Name";
pub const APP_CODE_HEADER: &str = "X-Bkapi-App-Code";

const SYSTEM_USER: &str = "hcm-sync";

/// Request kit: request id for log correlation plus the acting user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kit {
    pub rid: String,
    pub user: String,
    pub app_code: String,
}

impl Kit {
    /// New kit with a generated request id, acting as the sync system user
    pub fn new() -> Self {
        Self {
            rid: uuid::Uuid::new_v4().simple().to_string(),
            user: SYSTEM_USER.to_string(),
            app_code: String::new(),
        }
    }

    pub fn with_rid(mut self, rid: impl Into<String>) -> Self {
        self.rid = rid.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_app_code(mut self, app_code: impl Into<String>) -> Self {
        self.app_code = app_code.into();
        self
    }

    /// Header pairs forwarded to downstream services
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (RID_HEADER, self.rid.as_str()),
            (USER_HEADER, self.user.as_str()),
            (APP_CODE_HEADER, self.app_code.as_str()),
        ]
    }
}

impl Default for Kit {
    fn default() -> Self {
        Self::new()
    }
}
