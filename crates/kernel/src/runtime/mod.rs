mod blocking;
mod cancel;

pub use blocking::{fan_out_blocking, run_blocking};
pub use cancel::ScanCancel;
