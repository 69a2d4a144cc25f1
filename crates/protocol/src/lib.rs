mod errors;
pub mod models;

pub use errors::{AppError, AppResult, ErrorReport, ResultExt};
