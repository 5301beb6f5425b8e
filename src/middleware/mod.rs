pub mod caller;
pub mod response;

pub use caller::require_caller;
pub use response::{ApiResponse, ApiResult};
