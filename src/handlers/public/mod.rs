// handlers/public/mod.rs - Public handlers (access gate bypassed)
//
// Route table entries: GET / and GET /health
pub mod system;

pub use system::{health, root};
