use serde::Serialize;

use crate::error::{ApiError, GateRejection};
use crate::middleware::{ApiResponse, ApiResult, RequestContext};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub user_id: String,
    pub email: String,
    /// Tenant resolved for this request
    pub tenant_id: String,
    /// Tenant named in the token, which may differ
    pub token_tenant_id: String,
    pub roles: Vec<String>,
}

/// GET /api/auth/whoami - identity and tenant the gate attached to this request
pub async fn whoami(ctx: RequestContext) -> ApiResult<WhoAmI> {
    let scope = ctx.scope()?;
    let identity = ctx
        .identity()
        .ok_or_else(|| ApiError::from(GateRejection::MissingCredential))?;

    Ok(ApiResponse::success(WhoAmI {
        user_id: scope.user_id,
        email: identity.email.clone(),
        tenant_id: scope.tenant_id,
        token_tenant_id: identity.tenant_id.clone(),
        roles: scope.roles,
    }))
}
