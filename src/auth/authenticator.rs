use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sha2::{Digest, Sha256};

use super::IdentityClaims;
use crate::error::GateRejection;

/// Verifies `Authorization: Bearer <token>` headers against the shared secret
#[derive(Clone)]
pub struct RequestAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl RequestAuthenticator {
    pub fn with_hs256(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Tolerated clock skew on `exp`, in seconds
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.validation.leeway = leeway_secs;
        self
    }

    /// One verification attempt. The embedded tenant id is returned as-is.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<IdentityClaims, GateRejection> {
        let token = authorization
            .and_then(extract_bearer)
            .ok_or(GateRejection::MissingCredential)?;

        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    token_fp = %fingerprint(token),
                    "Invalid JWT token"
                );
                GateRejection::InvalidCredential
            })
    }
}

/// Accepts exactly two space-separated parts with the `Bearer` scheme
fn extract_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Short digest of a credential for log correlation
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)[..12].to_string()
}
