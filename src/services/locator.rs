use crate::services::error::{ControlError, Result};
use crate::services::platform::ProcessPlatform;
use log::debug;
use std::thread;
use std::time::Duration;

/// Something that can wait between polls.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<F: Fn(Duration)> Sleeper for F {
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

/// Blocks the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    #[inline]
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Bounded polling: `attempts` checks, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    /// One check per second for `timeout` seconds.
    pub fn seconds(timeout: u32) -> Self {
        Self { attempts: timeout, interval: Duration::from_secs(1) }
    }
}

/// Finds processes by executable name. Every call takes a fresh snapshot.
pub struct ProcessLocator<'a, P: ProcessPlatform> {
    platform: &'a P,
}

impl<'a, P: ProcessPlatform> ProcessLocator<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    #[inline]
    pub fn locate(&self, name: &str) -> Result<u32> {
        self.platform.locate_by_name(name)
    }

    /// Snapshot failures count as "not running".
    pub fn is_running(&self, name: &str) -> bool {
        self.locate(name).is_ok()
    }

    /// Polls until `name` shows up.
    ///
    /// `progress` is told about every miss as `(attempt, attempts)`. Gives up
    /// with `NotFound` once the policy is exhausted; other errors end the
    /// wait immediately. The process is always checked at least once.
    pub fn wait_for<S, F>(&self, name: &str, policy: PollPolicy, sleeper: &S, mut progress: F) -> Result<u32>
    where
        S: Sleeper + ?Sized,
        F: FnMut(u32, u32),
    {
        let attempts = policy.attempts.max(1);
        for attempt in 1..=attempts {
            match self.locate(name) {
                Ok(pid) => return Ok(pid),
                Err(ControlError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
            progress(attempt, attempts);
            if attempt < attempts {
                sleeper.sleep(policy.interval);
            }
        }
        debug!("gave up waiting for {} after {} attempts", name, attempts);
        Err(ControlError::not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::platform::mock::MockPlatform;
    use std::cell::Cell;

    #[test]
    fn locate_returns_live_pid() {
        let platform = MockPlatform::new(4).with_process("DeltaForceClient-Win64-Shipping.exe", 77);
        let locator = ProcessLocator::new(&platform);

        assert_eq!(locator.locate("deltaforceclient-win64-shipping.exe"), Ok(77));
        assert!(locator.is_running("DeltaForceClient-Win64-Shipping.exe"));
        assert!(!locator.is_running("SGuard64.exe"));
        assert!(locator.locate("SGuard64").unwrap_err().is_not_found());
    }

    #[test]
    fn wait_succeeds_when_process_appears() {
        let platform = MockPlatform::new(4);
        let sleeps = Cell::new(0);
        let sleeper = |d: Duration| {
            assert_eq!(d, Duration::from_secs(1));
            sleeps.set(sleeps.get() + 1);
            if sleeps.get() == 3 {
                platform.spawn("SGuard64.exe", 555);
            }
        };
        let mut misses = Vec::new();

        let pid = ProcessLocator::new(&platform)
            .wait_for("SGuard64.exe", PollPolicy::seconds(30), &sleeper, |a, n| misses.push((a, n)))
            .unwrap();

        assert_eq!(pid, 555);
        assert_eq!(sleeps.get(), 3);
        assert_eq!(misses, vec![(1, 30), (2, 30), (3, 30)]);
    }

    #[test]
    fn wait_is_bounded() {
        let platform = MockPlatform::new(4);
        let sleeps = Cell::new(0);
        let sleeper = |_: Duration| sleeps.set(sleeps.get() + 1);

        let policy = PollPolicy { attempts: 5, interval: Duration::from_millis(250) };
        let err = ProcessLocator::new(&platform).wait_for("SGuard64.exe", policy, &sleeper, |_, _| {}).unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(sleeps.get(), 4);
        assert_eq!(platform.calls().len(), 5);
    }

    #[test]
    fn zero_timeout_still_checks_once() {
        let platform = MockPlatform::new(4).with_process("SGuard64.exe", 1);
        let pid = ProcessLocator::new(&platform)
            .wait_for("SGuard64.exe", PollPolicy::seconds(0), &ThreadSleeper, |_, _| {})
            .unwrap();
        assert_eq!(pid, 1);

        let platform = MockPlatform::new(4);
        let mut misses = Vec::new();
        let err = ProcessLocator::new(&platform)
            .wait_for("SGuard64.exe", PollPolicy::seconds(0), &ThreadSleeper, |a, n| misses.push((a, n)))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(misses, vec![(1, 1)]);
        assert_eq!(platform.calls().len(), 1);
    }

    #[test]
    fn snapshot_failure_ends_wait() {
        let mut platform = MockPlatform::new(4).with_process("SGuard64.exe", 1);
        platform.locate_error = Some(ControlError::Snapshot { code: 5 });
        let sleeps = Cell::new(0);
        let sleeper = |_: Duration| sleeps.set(sleeps.get() + 1);

        let locator = ProcessLocator::new(&platform);
        let err = locator.wait_for("SGuard64.exe", PollPolicy::seconds(30), &sleeper, |_, _| {}).unwrap_err();

        assert_eq!(err, ControlError::Snapshot { code: 5 });
        assert!(!err.is_not_found());
        assert_eq!(sleeps.get(), 0);
        assert_eq!(platform.calls().len(), 1);
        assert!(!locator.is_running("SGuard64.exe"));
    }
}
