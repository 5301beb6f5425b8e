// handlers/public/mod.rs - Endpoints that need no authentication
pub mod health; // GET /health
pub mod root;   // GET /

pub use health::health;
pub use root::root;
