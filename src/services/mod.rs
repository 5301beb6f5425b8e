pub mod key_service;

pub use key_service::{KeyError, KeyService, UpdateDeletedAtInput};
