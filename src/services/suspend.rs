use crate::services::error::Result;
use crate::services::platform::{ProcessGuard, ProcessPlatform};
use log::info;

/// Freezes every thread of a process with the native suspend call.
///
/// There is deliberately no resume: a suspended target stays frozen until it
/// is terminated.
pub struct SuspendController<'a, P: ProcessPlatform> {
    platform: &'a P,
}

impl<'a, P: ProcessPlatform> SuspendController<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Suspends the first process named `name` and returns its pid.
    pub fn suspend_by_name(&self, name: &str) -> Result<u32> {
        let pid = self.platform.locate_by_name(name)?;
        self.suspend(pid)?;
        info!("suspended {} (pid {})", name, pid);
        Ok(pid)
    }

    pub fn suspend(&self, pid: u32) -> Result<()> {
        self.platform.elevate()?;
        let process = ProcessGuard::open(self.platform, pid)?;
        self.platform.suspend(process.handle(), process.pid())
    }
}
