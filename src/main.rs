// The console front-end only exists on Windows; elsewhere the core is built for its tests
#![cfg_attr(not(windows), allow(dead_code))]

mod app;
mod services;
mod ui;

#[cfg(windows)]
fn main() {
    use app::App;
    use colored::Color;
    use services::{
        locator::ThreadSleeper,
        service_control::WindowsServiceManager,
        settings::{Config, SettingsService},
        win32::Win32Platform,
    };

    init_logging();

    // Enable ANSI escape sequences on the console
    if colored::control::set_virtual_terminal(true).is_err() {
        log::warn!("could not enable ANSI colours on this console");
    }

    if !is_elevated() {
        ui::clear_screen();
        ui::draw_title();
        ui::status("Error: please run this program as administrator!", Color::Red);
        ui::info("Right-click the program and choose 'Run as administrator'");
        ui::pause("\nPress Enter to exit...");
        return;
    }

    let settings = SettingsService::new();
    log::debug!("settings file: {}", settings.path().display());
    let config = match settings.load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{:#}", e);
            ui::status(&format!("Failed to load settings: {:#}\nUsing defaults", e), Color::Red);
            Config::default()
        }
    };

    let platform = Win32Platform;
    let services = WindowsServiceManager;
    let sleeper = ThreadSleeper;
    let mut app = App::new(&platform, &services, &sleeper, settings, config);
    app.ensure_game_path();
    app.run();
}

#[cfg(not(windows))]
fn main() {
    init_logging();
    log::error!("{} only runs on Windows", ui::APP_NAME);
    std::process::exit(1);
}

fn init_logging() {
    // Quiet by default so log lines do not break up the menu
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

/// Opening the raw physical drive only succeeds with an elevated token.
#[cfg(windows)]
fn is_elevated() -> bool {
    std::fs::File::open(r"\\.\PHYSICALDRIVE0").is_ok()
}
