use axum::http::{header::HOST, HeaderMap, HeaderName};

use crate::config::TenantConfig;

/// Source of the candidate tenant id for a request
pub trait ResolveTenant: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<String>;
}

/// Header → sub-domain → configured default, first match wins
#[derive(Debug, Clone)]
pub struct TenantResolver {
    header_name: HeaderName,
    reserved_subdomains: Vec<String>,
    default_tenant_id: String,
}

impl TenantResolver {
    pub fn new(header_name: HeaderName, reserved_subdomains: Vec<String>, default_tenant_id: impl Into<String>) -> Self {
        Self {
            header_name,
            reserved_subdomains,
            default_tenant_id: default_tenant_id.into(),
        }
    }

    pub fn from_config(config: &TenantConfig) -> Self {
        let header_name = HeaderName::try_from(config.header_name.as_str()).unwrap_or_else(|_| {
            tracing::warn!(header = %config.header_name, "Invalid tenant header name, using x-tenant-id");
            HeaderName::from_static("x-tenant-id")
        });

        Self::new(header_name, config.reserved_subdomains.clone(), config.default_tenant_id.clone())
    }
}

impl ResolveTenant for TenantResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<String> {
        let tenant_header = headers.get(&self.header_name).and_then(|v| v.to_str().ok());
        let host = headers.get(HOST).and_then(|v| v.to_str().ok());

        resolve_tenant_id(tenant_header, host, &self.default_tenant_id, &self.reserved_subdomains)
    }
}

/// Pure resolution over the three inputs. An empty default yields `None`.
pub fn resolve_tenant_id(
    tenant_header: Option<&str>,
    host: Option<&str>,
    default_tenant_id: &str,
    reserved_subdomains: &[String],
) -> Option<String> {
    if let Some(tenant) = tenant_header.filter(|v| !v.is_empty()) {
        return Some(tenant.to_string());
    }

    if let Some(label) = host.and_then(subdomain_label) {
        let reserved = reserved_subdomains.iter().any(|r| r.eq_ignore_ascii_case(label));
        if !reserved {
            return Some(label.to_string());
        }
    }

    Some(default_tenant_id.to_string()).filter(|d| !d.is_empty())
}

/// Label before the first `.`, or the whole host when it has no dot
fn subdomain_label(host: &str) -> Option<&str> {
    host.split('.').next().filter(|l| !l.is_empty())
}
