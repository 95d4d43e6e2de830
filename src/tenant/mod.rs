pub mod directory;
pub mod resolver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use directory::{PgTenantDirectory, StaticTenantDirectory, TenantDirectory, TenantLookupError};
pub use resolver::{resolve_tenant_id, ResolveTenant, TenantResolver};

/// Customer partition. Provisioned elsewhere; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub subdomain: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, subdomain: impl Into<String>, is_active: bool) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            subdomain: subdomain.into(),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }
}
