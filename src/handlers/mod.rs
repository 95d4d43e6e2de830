// handlers/mod.rs - handlers grouped by access tier
//
// Public (no gate checks) → Protected (token + active tenant, optional roles)
pub mod protected;
pub mod public;
