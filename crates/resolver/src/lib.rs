pub mod assemble;
pub mod container;
pub mod forward;
pub mod identity;
pub mod normalize;
pub mod plist;
pub mod reverse;
pub mod roots;
pub mod rules;
pub mod scan;
pub mod size;

pub use forward::resolve_app_files;
pub use identity::AppIdentity;
pub use kernel::ScanCancel;
pub use normalize::normalize;
pub use reverse::{BatchSink, OrphanMode, resolve_orphans};
pub use roots::ResolverRoots;
pub use rules::{RuleOverlay, RuleStore, RuleTable};
pub use size::{FsSizeProbe, PathMetrics, SizeProbe};

#[cfg(test)]
#[path = "../tests/support/mod.rs"]
pub(crate) mod test_support;
