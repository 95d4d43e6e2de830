// handlers/protected/mod.rs - Protected handlers (valid token and active tenant required)
//
// Handlers take the gate's RequestContext and pass its tenant scope into
// commands and queries; they never resolve the tenant themselves.
pub mod auth;
pub mod products;
pub mod users;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::Page;
use crate::error::ApiError;

/// Query string accepted by list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// Products only
    pub is_active: Option<bool>,
}

impl ListParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Validation failed (uuid is expected)"))
}
