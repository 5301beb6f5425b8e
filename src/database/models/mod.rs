pub mod key;
pub mod workspace;

pub use key::{Key, KeyWithWorkspace};
pub use workspace::Workspace;
