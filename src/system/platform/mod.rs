use std::path::Path;
use std::sync::Arc;

use super::error::SampleError;
use super::snapshot::{InterfaceSnapshot, TickSnapshot};

mod procstat;
mod unsupported;

pub use procstat::parse_proc_stat;
pub use unsupported::Unsupported;

/// Host counter sources. One implementation per platform family.
pub trait Sampler: Send + Sync {
    /// One snapshot per logical core, in the host's core order.
    fn sample_cpu(&self) -> Result<Vec<TickSnapshot>, SampleError>;

    /// One snapshot per real interface. The synthetic total is not included.
    fn sample_network(&self) -> Result<Vec<InterfaceSnapshot>, SampleError>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
pub use linux::Platform as Host;
#[cfg(target_os = "macos")]
pub use macos::Platform as Host;

/// Sampler for the running host.
///
/// `stat_path` is the cumulative counter pseudo-file; platforms with an
/// aggregate CPU query ignore it.
#[cfg(target_os = "linux")]
pub fn host(stat_path: &Path) -> Arc<dyn Sampler> {
    Arc::new(Host::new(stat_path))
}

#[cfg(target_os = "macos")]
pub fn host(_stat_path: &Path) -> Arc<dyn Sampler> {
    Arc::new(Host)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn host(_stat_path: &Path) -> Arc<dyn Sampler> {
    Arc::new(Unsupported)
}
