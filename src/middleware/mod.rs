pub mod access_gate;
pub mod context;
pub mod response;
pub mod routes;

pub use access_gate::{access_gate_middleware, AccessGate, GateRequest};
pub use context::{RequestContext, TenantScope};
pub use response::{ApiResponse, ApiResult};
pub use routes::{RoutePolicy, RouteTable};
