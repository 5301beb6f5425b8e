// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no auth) → Protected (caller resolved by the authenticator)
pub mod public;
pub mod protected;
