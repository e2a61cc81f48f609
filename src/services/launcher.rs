use crate::services::targets::LAUNCHER_FILE;
use anyhow::{bail, Context, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Checks that `path` names an existing launcher executable.
pub fn validate_launcher_path(path: &str) -> Result<PathBuf> {
    let path = Path::new(path.trim());
    if !path.is_file() {
        bail!("invalid file path: {}", path.display());
    }
    let is_launcher = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(LAUNCHER_FILE));
    if !is_launcher {
        bail!("please select {}", LAUNCHER_FILE);
    }
    Ok(path.to_path_buf())
}

/// Starts the launcher from its own directory without waiting for it.
pub fn launch(game_path: &str) -> Result<u32> {
    if game_path.is_empty() {
        bail!("game path is not set");
    }
    let path = Path::new(game_path);
    let mut command = Command::new(path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        command.current_dir(dir);
    }
    let child = command.spawn().with_context(|| format!("failed to start {}", path.display()))?;
    info!("started {} (pid {})", path.display(), child.id());
    Ok(child.id())
}
