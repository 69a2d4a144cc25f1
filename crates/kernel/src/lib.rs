pub mod runtime;

pub use protocol::models;
pub use protocol::{AppError, AppResult, ResultExt};
pub use runtime::{ScanCancel, fan_out_blocking, run_blocking};
