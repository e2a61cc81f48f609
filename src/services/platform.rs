//! The OS seam of the process-control core.
//!
//! Everything that touches Win32 lives behind [`ProcessPlatform`]; the
//! controllers only sequence calls on it.

use crate::services::affinity::AffinityMask;
use crate::services::error::Result;

pub trait ProcessPlatform {
    /// Raw OS handle to an opened process.
    type Handle;

    /// First process whose executable name equals `name`, ignoring case.
    fn locate_by_name(&self, name: &str) -> Result<u32>;

    /// Enables the debug privilege on our own token.
    fn elevate(&self) -> Result<()>;

    /// Opens `pid` with full access rights.
    fn open_full(&self, pid: u32) -> Result<Self::Handle>;

    fn set_affinity(&self, handle: &Self::Handle, pid: u32, mask: AffinityMask) -> Result<()>;

    /// Suspends every thread of the process through the native API.
    fn suspend(&self, handle: &Self::Handle, pid: u32) -> Result<()>;

    fn close(&self, handle: Self::Handle);

    /// Logical processors usable by an affinity mask.
    fn logical_cpu_count(&self) -> usize;
}

/// An open process handle that is closed when dropped.
pub struct ProcessGuard<'a, P: ProcessPlatform> {
    platform: &'a P,
    pid: u32,
    handle: Option<P::Handle>,
}

impl<'a, P: ProcessPlatform> ProcessGuard<'a, P> {
    pub fn open(platform: &'a P, pid: u32) -> Result<Self> {
        let handle = platform.open_full(pid)?;
        Ok(Self { platform, pid, handle: Some(handle) })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn handle(&self) -> &P::Handle {
        // Only `drop` takes the handle out
        self.handle.as_ref().unwrap_or_else(|| unreachable!("process handle already released"))
    }
}

impl<P: ProcessPlatform> Drop for ProcessGuard<'_, P> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("closing handle of process {}", self.pid);
            self.platform.close(handle);
        }
    }
}

/// Recording platform used by the unit tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::services::error::ControlError;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Locate(String),
        Elevate,
        Open(u32),
        SetAffinity(u32, usize),
        Suspend(u32),
        Close(u64),
    }

    pub struct MockPlatform {
        pub processes: RefCell<Vec<(String, u32)>>,
        pub cpu_count: usize,
        pub locate_error: Option<ControlError>,
        pub elevate_error: Option<ControlError>,
        pub open_error: Option<ControlError>,
        pub affinity_error: Option<ControlError>,
        pub suspend_error: Option<ControlError>,
        pub calls: RefCell<Vec<Call>>,
        next_handle: Cell<u64>,
    }

    impl MockPlatform {
        pub fn new(cpu_count: usize) -> Self {
            Self {
                processes: RefCell::new(Vec::new()),
                cpu_count,
                locate_error: None,
                elevate_error: None,
                open_error: None,
                affinity_error: None,
                suspend_error: None,
                calls: RefCell::new(Vec::new()),
                next_handle: Cell::new(100),
            }
        }

        pub fn with_process(self, name: &str, pid: u32) -> Self {
            self.spawn(name, pid);
            self
        }

        pub fn spawn(&self, name: &str, pid: u32) {
            self.processes.borrow_mut().push((name.to_string(), pid));
        }

        pub fn kill(&self, name: &str) {
            self.processes.borrow_mut().retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn opened(&self) -> usize {
            self.calls().iter().filter(|c| matches!(c, Call::Open(_))).count()
        }

        pub fn closed(&self) -> usize {
            self.calls().iter().filter(|c| matches!(c, Call::Close(_))).count()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl ProcessPlatform for MockPlatform {
        type Handle = u64;

        fn locate_by_name(&self, name: &str) -> Result<u32> {
            self.record(Call::Locate(name.to_string()));
            if let Some(e) = &self.locate_error {
                return Err(e.clone());
            }
            self.processes
                .borrow()
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|&(_, pid)| pid)
                .ok_or_else(|| ControlError::not_found(name))
        }

        fn elevate(&self) -> Result<()> {
            self.record(Call::Elevate);
            match &self.elevate_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        fn open_full(&self, pid: u32) -> Result<u64> {
            self.record(Call::Open(pid));
            if let Some(e) = &self.open_error {
                return Err(e.clone());
            }
            let handle = self.next_handle.get();
            self.next_handle.set(handle + 1);
            Ok(handle)
        }

        fn set_affinity(&self, _handle: &u64, pid: u32, mask: AffinityMask) -> Result<()> {
            self.record(Call::SetAffinity(pid, mask.bits()));
            match &self.affinity_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        fn suspend(&self, _handle: &u64, pid: u32) -> Result<()> {
            self.record(Call::Suspend(pid));
            match &self.suspend_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        fn close(&self, handle: u64) {
            self.record(Call::Close(handle));
        }

        fn logical_cpu_count(&self) -> usize {
            self.cpu_count
        }
    }
}
