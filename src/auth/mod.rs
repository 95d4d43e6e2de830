pub mod authenticator;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

pub use authenticator::RequestAuthenticator;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// User id
    pub sub: String,
    pub email: String,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
}

impl IdentityClaims {
    pub fn new(
        sub: impl Into<String>,
        email: impl Into<String>,
        tenant_id: impl Into<String>,
        roles: Vec<String>,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            email: email.into(),
            tenant_id: tenant_id.into(),
            roles,
            iat: Some(now.timestamp()),
            exp,
        }
    }

    pub fn has_any_role(&self, required: &[String]) -> bool {
        required.iter().any(|role| self.roles.contains(role))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Signs claims with HS256. Used by the dev CLI and the tests.
pub fn issue_token(claims: &IdentityClaims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}
