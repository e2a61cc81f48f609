use crate::services::error::{ControlError, Result};
use crate::services::platform::{ProcessGuard, ProcessPlatform};
use log::{debug, info};

/// CPU affinity bitmask, one bit per logical core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinityMask(usize);

impl AffinityMask {
    /// Number of cores a mask can address.
    pub const WIDTH: usize = usize::BITS as usize;

    /// Mask allowing only `core`. `None` if the index does not fit.
    pub fn single(core: usize) -> Option<Self> {
        (core < Self::WIDTH).then(|| Self(1 << core))
    }

    #[inline]
    pub fn bits(self) -> usize {
        self.0
    }
}

/// Picks the second-to-last logical core.
///
/// Core 0 is usually the busiest and the last core is often reserved, so the
/// anti-cheat gets `cpu_count - 2`. Fewer than two cores has no such choice.
pub fn select_core(cpu_count: usize) -> Result<usize> {
    if cpu_count < 2 {
        return Err(ControlError::InvalidTopology { cpu_count });
    }
    let core = cpu_count - 2;
    if core >= AffinityMask::WIDTH {
        return Err(ControlError::InvalidTopology { cpu_count });
    }
    Ok(core)
}

/// Restricts a process to a single logical core.
pub struct AffinityController<'a, P: ProcessPlatform> {
    platform: &'a P,
}

impl<'a, P: ProcessPlatform> AffinityController<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Pins the first process named `name` to the selected core.
    /// Returns the core index that was applied.
    pub fn pin_by_name(&self, name: &str) -> Result<usize> {
        let pid = self.platform.locate_by_name(name)?;
        let core = select_core(self.platform.logical_cpu_count())?;
        self.pin(pid, core)?;
        info!("pinned {} (pid {}) to cpu {}", name, pid, core);
        Ok(core)
    }

    pub fn pin(&self, pid: u32, core: usize) -> Result<()> {
        let cpu_count = self.platform.logical_cpu_count();
        if core >= cpu_count {
            return Err(ControlError::InvalidTopology { cpu_count });
        }
        let mask = AffinityMask::single(core).ok_or(ControlError::InvalidTopology { cpu_count })?;

        self.platform.elevate()?;
        let process = ProcessGuard::open(self.platform, pid)?;
        debug!("setting affinity of pid {} to {:#x}", pid, mask.bits());
        self.platform.set_affinity(process.handle(), process.pid(), mask)
    }
}
