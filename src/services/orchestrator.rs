use crate::services::affinity::AffinityController;
use crate::services::launcher;
use crate::services::locator::{PollPolicy, ProcessLocator, Sleeper};
use crate::services::platform::ProcessPlatform;
use crate::services::service_control::ServiceControl;
use crate::services::settings::Config;
use crate::services::suspend::SuspendController;
use crate::services::targets::{ANTI_CHEAT_PROCESS, ANTI_CHEAT_SERVICE, GAME_PROCESS};
use anyhow::Result;
use log::{info, warn};
use std::time::Duration;
use thiserror::Error;

/// Why a mode refused to run or did not reach its goal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("start the game before using this mode")]
    GameNotRunning,

    #[error("anti-cheat is not running")]
    AntiCheatNotRunning,

    #[error("anti-cheat process could not be closed")]
    AntiCheatSurvived,

    #[error("game did not start within {0} seconds")]
    LaunchTimedOut(u32),
}

/// Progress notifications for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Waiting { name: &'static str, attempt: u32, attempts: u32 },
    Suspended { pid: u32 },
    StoppingService,
    TerminatingProcess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    pub game_running: bool,
    pub anti_cheat_running: bool,
}

/// Sequences the core controllers for each launch mode.
pub struct Orchestrator<'a, P: ProcessPlatform, C: ServiceControl, S: Sleeper> {
    platform: &'a P,
    services: &'a C,
    sleeper: &'a S,
    settle: Duration,
}

impl<'a, P: ProcessPlatform, C: ServiceControl, S: Sleeper> Orchestrator<'a, P, C, S> {
    pub fn new(platform: &'a P, services: &'a C, sleeper: &'a S) -> Self {
        Self { platform, services, sleeper, settle: Duration::from_secs(2) }
    }

    fn locator(&self) -> ProcessLocator<'a, P> {
        ProcessLocator::new(self.platform)
    }

    pub fn status(&self) -> ProcessStatus {
        let locator = self.locator();
        ProcessStatus {
            game_running: locator.is_running(GAME_PROCESS),
            anti_cheat_running: locator.is_running(ANTI_CHEAT_PROCESS),
        }
    }

    pub fn require_game(&self) -> Result<()> {
        if !self.locator().is_running(GAME_PROCESS) {
            return Err(ModeError::GameNotRunning.into());
        }
        Ok(())
    }

    /// Starts the launcher and waits for the game client.
    pub fn launch_game(&self, config: &Config, on_step: impl FnMut(Step)) -> Result<u32> {
        launcher::launch(&config.game_path)?;
        self.wait_for_game(config, on_step)
    }

    pub fn wait_for_game(&self, config: &Config, mut on_step: impl FnMut(Step)) -> Result<u32> {
        let policy = PollPolicy::seconds(config.launch_timeout);
        self.locator()
            .wait_for(GAME_PROCESS, policy, self.sleeper, |attempt, attempts| {
                on_step(Step::Waiting { name: GAME_PROCESS, attempt, attempts })
            })
            .map_err(|e| -> anyhow::Error {
                match e {
                    e if e.is_not_found() => ModeError::LaunchTimedOut(config.launch_timeout).into(),
                    e => e.into(),
                }
            })
    }

    /// Pins the anti-cheat to one core, waiting for it to start if needed.
    /// Returns the core index.
    pub fn pin_anti_cheat(&self, config: &Config, mut on_step: impl FnMut(Step)) -> Result<usize> {
        self.require_game()?;

        let policy = PollPolicy::seconds(config.launch_timeout);
        self.locator()
            .wait_for(ANTI_CHEAT_PROCESS, policy, self.sleeper, |attempt, attempts| {
                on_step(Step::Waiting { name: ANTI_CHEAT_PROCESS, attempt, attempts })
            })
            .map_err(|e| -> anyhow::Error {
                match e {
                    e if e.is_not_found() => ModeError::AntiCheatNotRunning.into(),
                    e => e.into(),
                }
            })?;

        let core = AffinityController::new(self.platform).pin_by_name(ANTI_CHEAT_PROCESS)?;
        Ok(core)
    }

    /// Freezes the anti-cheat, then stops its service and terminates it.
    /// Returns the pid that was suspended.
    pub fn suspend_anti_cheat(&self, mut on_step: impl FnMut(Step)) -> Result<u32> {
        self.require_game()?;
        if !self.locator().is_running(ANTI_CHEAT_PROCESS) {
            return Err(ModeError::AntiCheatNotRunning.into());
        }

        let pid = SuspendController::new(self.platform).suspend_by_name(ANTI_CHEAT_PROCESS)?;
        on_step(Step::Suspended { pid });

        on_step(Step::StoppingService);
        match self.services.stop_service(ANTI_CHEAT_SERVICE) {
            Ok(true) => info!("stopped {}", ANTI_CHEAT_SERVICE),
            Ok(false) => info!("{} was not running", ANTI_CHEAT_SERVICE),
            Err(e) => warn!("could not stop {}: {:#}", ANTI_CHEAT_SERVICE, e),
        }
        self.sleeper.sleep(self.settle);

        on_step(Step::TerminatingProcess);
        if let Err(e) = self.services.kill_process(ANTI_CHEAT_PROCESS) {
            warn!("could not terminate {}: {:#}", ANTI_CHEAT_PROCESS, e);
        }
        self.sleeper.sleep(self.settle);

        if self.locator().is_running(ANTI_CHEAT_PROCESS) {
            return Err(ModeError::AntiCheatSurvived.into());
        }
        Ok(pid)
    }
}
