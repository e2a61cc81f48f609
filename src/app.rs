use crate::services::{
    detector::GameDetector,
    launcher,
    locator::Sleeper,
    orchestrator::{Orchestrator, Step},
    platform::ProcessPlatform,
    service_control::ServiceControl,
    settings::{Config, LaunchMode, SettingsService},
    targets::{ANTI_CHEAT_PROCESS, LAUNCHER_FILE},
};
use crate::ui::{self, MenuItem};
use colored::Color;
use log::{error, warn};
use std::path::Path;
use std::time::Duration;

static MODE_NOTES: &[(&str, &str, &[&str])] = &[
    ("1", "Normal launch", &["Starts the game without touching anything"]),
    (
        "2",
        "Affinity mode",
        &[
            "Restricts the anti-cheat to a single CPU core",
            "Uses the second-to-last core so the game keeps the rest",
            "Only available while the game is running",
        ],
    ),
    (
        "3",
        "Suspend mode",
        &[
            "Freezes the anti-cheat, stops its service and closes it",
            "Only available while the game is running",
            "Succeeded when the panel shows the game running and the anti-cheat not running",
            "WARNING: may crash the game on some machines and carries a small ban risk",
        ],
    ),
];

static NOTICES: &[&str] = &[
    "Run this program as administrator",
    "Set the game path before the first launch",
    "Affinity and suspend modes need the game to be running",
    "Suspend mode can be detected, use it with care",
];

/// Interactive menu driving the orchestrator.
pub struct App<'a, P: ProcessPlatform, C: ServiceControl, S: Sleeper> {
    orchestrator: Orchestrator<'a, P, C, S>,
    sleeper: &'a S,
    settings: SettingsService,
    config: Config,
}

impl<'a, P: ProcessPlatform, C: ServiceControl, S: Sleeper> App<'a, P, C, S> {
    pub fn new(platform: &'a P, services: &'a C, sleeper: &'a S, settings: SettingsService, config: Config) -> Self {
        Self { orchestrator: Orchestrator::new(platform, services, sleeper), sleeper, settings, config }
    }

    fn save(&self) {
        if let Err(e) = self.settings.save(&self.config) {
            error!("{:#}", e);
            ui::status(&format!("Failed to save settings: {:#}", e), Color::Red);
        }
    }

    fn screen(&self, heading: &str) {
        ui::clear_screen();
        ui::draw_title();
        ui::heading(heading);
    }

    fn show_status(&self) {
        let status = self.orchestrator.status();
        ui::draw_process_status(status.game_running, status.anti_cheat_running);
    }

    fn report_step(step: Step) {
        match step {
            Step::Waiting { name, attempt, attempts } => {
                ui::progress(&format!("Waiting for {} [{}/{}]", name, attempt, attempts));
            }
            Step::Suspended { pid } => ui::info(&format!("Suspended {} (pid {})", ANTI_CHEAT_PROCESS, pid)),
            Step::StoppingService => ui::info("Stopping the anti-cheat service..."),
            Step::TerminatingProcess => ui::info("Closing the anti-cheat process..."),
        }
    }

    fn record_mode(&mut self, mode: LaunchMode) {
        if self.config.last_mode != mode {
            log::debug!("last mode is now {}", mode);
            self.config.last_mode = mode;
            self.save();
        }
    }

    /// First run: find the launcher before showing the menu.
    pub fn ensure_game_path(&mut self) {
        if !self.config.game_path.is_empty() {
            return;
        }
        self.screen("First run setup");
        ui::info("\nSearching for the game launcher...");

        let path = match Self::auto_detect() {
            Some(path) => Some(path),
            None => {
                ui::info("\nThe game was not found, please set the path manually");
                ui::info("\nChoose how to set it:");
                ui::draw_menu(&[
                    MenuItem::new("1", "Browse", "Pick the launcher with a file dialog"),
                    MenuItem::new("2", "Type", "Type or paste the launcher path"),
                ]);
                match ui::read_input().as_str() {
                    "1" => ui::open_file_dialog(&format!("Select the game launcher ({})", LAUNCHER_FILE)),
                    "2" => Some(ui::input_path("Launcher path (you can drop the file here)")),
                    _ => None,
                }
            }
        };

        if let Some(path) = path {
            match launcher::validate_launcher_path(&path) {
                Ok(valid) => {
                    self.config.game_path = valid.display().to_string();
                    self.save();
                }
                Err(e) => warn!("ignoring launcher path: {:#}", e),
            }
        }
    }

    fn auto_detect() -> Option<String> {
        let found = GameDetector::auto_detect(|path: &Path| {
            ui::status(&format!("Found game launcher: {}", path.display()), Color::Green);
            ui::confirm("Use this path?")
        });
        if found.is_none() {
            ui::info("Game launcher not found");
        }
        found.map(|p| p.display().to_string())
    }

    pub fn run(&mut self) {
        loop {
            ui::clear_screen();
            ui::draw_title();
            ui::draw_menu(&[
                MenuItem::new("1", "Normal launch", "Start the game without changes"),
                MenuItem::new("2", "Affinity mode", "Pin the anti-cheat to one CPU core"),
                MenuItem::new("3", "Suspend mode", "Freeze the anti-cheat (risky)"),
                MenuItem::new("4", "Settings", "Game path and program options"),
                MenuItem::new("5", "About / Help", "Usage notes and program info"),
                MenuItem::new("0", "Exit", "Quit the program"),
            ]);
            self.show_status();

            match ui::read_input().as_str() {
                "1" => self.normal_launch(),
                "2" => self.affinity_mode(),
                "3" => self.suspend_mode(),
                "4" => self.settings_menu(),
                "5" => {
                    self.screen("About");
                    Self::draw_about();
                    ui::pause("\nPress Enter to return to the main menu...");
                }
                "0" => {
                    self.screen("Thanks for using it!");
                    self.sleeper.sleep(Duration::from_secs(1));
                    return;
                }
                _ => {}
            }

            if self.config.auto_close {
                return;
            }
            self.sleeper.sleep(Duration::from_secs(2));
        }
    }

    fn normal_launch(&mut self) {
        self.record_mode(LaunchMode::Normal);
        ui::status("Starting the game...", Color::Yellow);
        match self.orchestrator.launch_game(&self.config, Self::report_step) {
            Ok(pid) => ui::status(&format!("\nGame started (pid {})", pid), Color::Green),
            Err(e) => ui::status(&format!("\nLaunch failed: {:#}", e), Color::Red),
        }
    }

    fn affinity_mode(&mut self) {
        self.screen("Affinity mode");
        self.show_status();
        self.record_mode(LaunchMode::Affinity);

        match self.orchestrator.pin_anti_cheat(&self.config, Self::report_step) {
            Ok(core) => {
                ui::status(&format!("\n✓ Anti-cheat restricted to CPU {}", core), Color::Green);
                self.show_status();
            }
            Err(e) => ui::status(&format!("\nFailed to set CPU affinity: {:#}", e), Color::Red),
        }
    }

    fn suspend_mode(&mut self) {
        self.screen("Suspend mode");
        self.show_status();
        self.suspend_after(|| ui::confirm("\nWarning: suspending the anti-cheat may crash the game. Continue?"));
    }

    /// Runs the suspend mode once the game is up and `confirm` accepts the risk.
    fn suspend_after(&mut self, confirm: impl FnOnce() -> bool) {
        if let Err(e) = self.orchestrator.require_game() {
            ui::status(&format!("\nError: {}", e), Color::Red);
            return;
        }
        if !confirm() {
            return;
        }
        self.record_mode(LaunchMode::Suspend);

        ui::info("\nSuspending...");
        match self.orchestrator.suspend_anti_cheat(Self::report_step) {
            Ok(_) => {
                ui::status("✓ Anti-cheat closed", Color::Green);
                self.show_status();
            }
            Err(e) => ui::status(&format!("Error: {:#}", e), Color::Red),
        }
    }

    fn settings_menu(&mut self) {
        loop {
            self.screen("Settings");
            ui::draw_menu(&[
                MenuItem::new("1", format!("Game path: {}", self.config.game_path), "Set the launcher path"),
                MenuItem::new("2", format!("Close after run: {}", self.config.auto_close), "Exit once an action is done"),
                MenuItem::new("0", "Back", ""),
            ]);

            match ui::read_input().as_str() {
                "1" => self.set_game_path(),
                "2" => {
                    self.config.auto_close = !self.config.auto_close;
                    self.save();
                    ui::status(&format!("Close after run set to: {}", self.config.auto_close), Color::Green);
                }
                "0" => return,
                _ => {}
            }
            self.sleeper.sleep(Duration::from_secs(1));
        }
    }

    fn set_game_path(&mut self) {
        self.screen("Set game path");
        ui::info("\nChoose how to set it:");
        ui::draw_menu(&[
            MenuItem::new("1", "Auto search", "Search common install locations"),
            MenuItem::new("2", "Browse", "Pick the launcher with a file dialog"),
            MenuItem::new("3", "Type", "Type or paste the launcher path"),
            MenuItem::new("0", "Back", ""),
        ]);

        let path = match ui::read_input().as_str() {
            "1" => Self::auto_detect(),
            "2" => ui::open_file_dialog(&format!("Select the game launcher ({})", LAUNCHER_FILE)),
            "3" => Some(ui::input_path("Launcher path (you can drop the file here)")),
            _ => None,
        };
        let Some(path) = path.filter(|p| !p.is_empty()) else { return };

        match launcher::validate_launcher_path(&path) {
            Ok(valid) => {
                self.config.game_path = valid.display().to_string();
                self.save();
                ui::status("Game path saved", Color::Green);
            }
            Err(e) => ui::status(&format!("Error: {}", e), Color::Red),
        }
    }

    fn draw_about() {
        println!();
        println!("Name:    {}", ui::APP_NAME);
        println!("Version: {}", ui::VERSION);
        println!("Source:  {}", ui::WEBSITE);
        println!("License: MIT");

        ui::info("\nLaunch modes:");
        for (key, name, details) in MODE_NOTES {
            println!("\n{}. {}", key, name);
            for detail in details.iter() {
                println!("   • {}", detail);
            }
        }

        ui::status("Notes:", Color::Red);
        for notice in NOTICES {
            println!("• {}", notice);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::platform::mock::MockPlatform;
    use crate::services::targets::GAME_PROCESS;
    use anyhow::Result;

    struct NoServices;

    impl ServiceControl for NoServices {
        fn stop_service(&self, _name: &str) -> Result<bool> {
            Ok(false)
        }

        fn kill_process(&self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    fn no_sleep(_: Duration) {}

    fn saved_mode(dir: &tempfile::TempDir) -> LaunchMode {
        SettingsService::with_path(dir.path().join("config.json")).load().unwrap().last_mode
    }

    #[test]
    fn refused_suspend_keeps_last_mode() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsService::with_path(dir.path().join("config.json"));
        let platform = MockPlatform::new(8);
        let services = NoServices;
        let mut app = App::new(&platform, &services, &no_sleep, settings, Config::default());

        // game not running
        app.suspend_after(|| unreachable!("confirmation asked without a running game"));
        assert_eq!(app.config.last_mode, LaunchMode::Normal);

        platform.spawn(GAME_PROCESS, 10);
        app.suspend_after(|| false);
        assert_eq!(app.config.last_mode, LaunchMode::Normal);
        assert_eq!(saved_mode(&dir), LaunchMode::Normal);
        assert_eq!(platform.opened(), 0);
    }

    #[test]
    fn confirmed_suspend_records_mode() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsService::with_path(dir.path().join("config.json"));
        let platform = MockPlatform::new(8).with_process(GAME_PROCESS, 10).with_process(ANTI_CHEAT_PROCESS, 20);
        let services = NoServices;
        let mut app = App::new(&platform, &services, &no_sleep, settings, Config::default());

        app.suspend_after(|| true);
        assert_eq!(app.config.last_mode, LaunchMode::Suspend);
        assert_eq!(saved_mode(&dir), LaunchMode::Suspend);
        assert_eq!(platform.opened(), 1);
    }
}
