// handlers/protected/key/mod.rs - Key procedures
pub mod update_deleted_at; // POST /trpc/key.updateDeletedAt

pub use update_deleted_at::update_deleted_at;
