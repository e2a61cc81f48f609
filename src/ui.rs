//! Console rendering and input.

use colored::{Color, Colorize};
use std::io::{self, BufRead, Write};
use std::process::Command;

pub const APP_NAME: &str = "ACE Optimizer";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WEBSITE: &str = "https://github.com/numakkiyu/ace-optimizer";

const WIDTH: usize = 60;

pub struct MenuItem<'a> {
    pub key: &'a str,
    pub description: String,
    pub help: &'a str,
}

impl<'a> MenuItem<'a> {
    pub fn new(key: &'a str, description: impl Into<String>, help: &'a str) -> Self {
        Self { key, description: description.into(), help }
    }
}

pub fn clear_screen() {
    if cfg!(windows) {
        let _ = Command::new("cmd").args(["/c", "cls"]).status();
    } else {
        print!("\x1B[2J\x1B[H");
        let _ = io::stdout().flush();
    }
}

pub fn draw_title() {
    let title = format!("{} v{}", APP_NAME, VERSION);
    let inner = WIDTH - 2;
    let padding = inner.saturating_sub(title.len()) / 2;
    let rest = inner.saturating_sub(padding + title.len());

    println!("{}", "═".repeat(WIDTH).cyan());
    println!("{}", format!("║{}{}{}║", " ".repeat(padding), title, " ".repeat(rest)).cyan());
    println!("{}", "═".repeat(WIDTH).cyan());
    println!();
}

pub fn draw_menu(items: &[MenuItem<'_>]) {
    let width = items.iter().map(|i| i.description.chars().count()).max().unwrap_or(0);

    for item in items {
        let key = format!("[{}]", item.key).yellow();
        print!("{} {:<width$}", key, item.description, width = width + 4);
        if !item.help.is_empty() {
            print!(" - {}", item.help.cyan());
        }
        println!();
    }
    println!();
}

pub fn draw_process_status(game_running: bool, anti_cheat_running: bool) {
    fn badge(running: bool) -> colored::ColoredString {
        if running {
            "✓ running".green()
        } else {
            "✗ not running".red()
        }
    }
    println!();
    println!("{} {}", "Game:      ".white(), badge(game_running));
    println!("{} {}", "Anti-cheat:".white(), badge(anti_cheat_running));
}

pub fn heading(text: &str) {
    println!("{}", text.cyan().bold());
}

pub fn status(text: &str, color: Color) {
    println!("\n{}\n", text.color(color));
}

pub fn info(text: &str) {
    println!("{}", text.yellow());
}

/// Overwrites the current line, for countdowns.
pub fn progress(text: &str) {
    print!("\r{}", text.yellow());
    let _ = io::stdout().flush();
}

fn read_line() -> String {
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
    line.trim().to_string()
}

pub fn read_input() -> String {
    print!("{}", "Select an option: ".green());
    read_line()
}

pub fn confirm(message: &str) -> bool {
    print!("{}", format!("{} (Y/N): ", message).yellow());
    is_yes(&read_line())
}

pub fn is_yes(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

/// Reads a path; quotes added by drag-and-drop are removed.
pub fn input_path(prompt: &str) -> String {
    print!("{}", format!("{}: ", prompt).green());
    clean_path(&read_line())
}

pub fn clean_path(input: &str) -> String {
    input.trim().trim_matches('"').trim().to_string()
}

pub fn pause(message: &str) {
    print!("{}", message.green());
    let _ = read_line();
}

/// Shows a WinForms open-file dialog through PowerShell.
pub fn open_file_dialog(title: &str) -> Option<String> {
    let script = format!(
        "Add-Type -AssemblyName System.Windows.Forms;\
         $f=New-Object System.Windows.Forms.OpenFileDialog;\
         $f.Filter='Game launcher (*.exe)|*.exe';\
         $f.Title='{}';\
         [void]$f.ShowDialog();\
         $f.FileName",
        title.replace('\'', "''")
    );

    let output = Command::new("powershell").args(["-NoProfile", "-Command", &script]).output().ok()?;
    if !output.status.success() {
        log::warn!("file dialog exited with {}", output.status);
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then_some(path)
}
