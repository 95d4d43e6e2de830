use axum::http::Method;
use std::collections::HashMap;

/// Access policy declared for one route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub public: bool,
    /// Any one of these roles is enough; empty means no role check
    pub required_roles: Vec<String>,
}

impl RoutePolicy {
    pub fn public() -> Self {
        Self {
            public: true,
            required_roles: Vec::new(),
        }
    }

    pub fn protected() -> Self {
        Self::default()
    }

    pub fn with_roles(roles: &[&str]) -> Self {
        Self {
            public: false,
            required_roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Route pattern → policy, fixed when the router is built.
/// Routes missing from the table are protected.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<(Method, String), RoutePolicy>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, method: Method, path: &str, policy: RoutePolicy) -> Self {
        self.routes.insert((method, path.to_string()), policy);
        self
    }

    pub fn public(self, method: Method, path: &str) -> Self {
        self.insert(method, path, RoutePolicy::public())
    }

    pub fn protected(self, method: Method, path: &str) -> Self {
        self.insert(method, path, RoutePolicy::protected())
    }

    pub fn restricted(self, method: Method, path: &str, roles: &[&str]) -> Self {
        self.insert(method, path, RoutePolicy::with_roles(roles))
    }

    pub fn policy(&self, method: &Method, route: Option<&str>) -> RoutePolicy {
        route
            .and_then(|r| self.routes.get(&(method.clone(), r.to_string())))
            .cloned()
            .unwrap_or_else(RoutePolicy::protected)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
