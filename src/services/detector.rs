use crate::services::targets::LAUNCHER_FILE;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

// Directories under each drive root where games usually get installed
static DRIVE_SUBDIRS: &[&str] = &["Program Files (x86)", "Program Files", "Games", "ACE", "Delta Force"];

// Directory names containing any of these are never descended into
static PRUNED_DIRS: &[&str] = &["windows", "system", "$recycle.bin"];

/// Searches the usual install locations for the game launcher.
pub struct GameDetector;

impl GameDetector {
    /// Roots searched by [`GameDetector::auto_detect`], in order.
    pub fn candidate_dirs() -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(24 * DRIVE_SUBDIRS.len() + 3);

        for drive in 'C'..='Z' {
            let root = PathBuf::from(format!("{}:\\", drive));
            if root.exists() {
                roots.extend(DRIVE_SUBDIRS.iter().map(|sub| root.join(sub)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            roots.push(home.join("Documents").join("Games"));
            roots.push(home.join("Documents").join("My Games"));
            roots.push(home.join("Games"));
        }
        roots
    }

    /// Walks every candidate root and returns the first launcher `accept` approves.
    pub fn auto_detect<F>(accept: F) -> Option<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        Self::find_launcher(&Self::candidate_dirs(), accept)
    }

    pub fn find_launcher<F>(roots: &[PathBuf], mut accept: F) -> Option<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        roots.iter().find_map(|root| {
            debug!("searching {}", root.display());
            Self::walk(root, &mut accept)
        })
    }

    fn walk<F>(dir: &Path, accept: &mut F) -> Option<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        // Unreadable directories are skipped
        let Ok(read_dir) = fs::read_dir(dir) else { return None };

        let mut entries: Vec<_> = read_dir.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let Ok(file_type) = entry.file_type() else { continue };
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if file_type.is_dir() {
                if Self::is_pruned(&name) {
                    continue;
                }
                if let Some(found) = Self::walk(&path, accept) {
                    return Some(found);
                }
            } else if name.eq_ignore_ascii_case(LAUNCHER_FILE) && accept(&path) {
                return Some(path);
            }
        }
        None
    }

    #[inline]
    fn is_pruned(name: &str) -> bool {
        let lower = name.to_lowercase();
        PRUNED_DIRS.iter().any(|p| lower.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn finds_nested_launcher() {
        let dir = TempDir::new().unwrap();
        let launcher = dir.path().join("Delta Force").join("launcher").join(LAUNCHER_FILE);
        touch(&launcher);

        let found = GameDetector::find_launcher(&[dir.path().to_path_buf()], |_| true);
        assert_eq!(found, Some(launcher));
    }

    #[test]
    fn skips_pruned_directories() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("WindowsApps").join(LAUNCHER_FILE));
        touch(&dir.path().join("System Volume").join(LAUNCHER_FILE));
        touch(&dir.path().join("$RECYCLE.BIN").join(LAUNCHER_FILE));

        assert_eq!(GameDetector::find_launcher(&[dir.path().to_path_buf()], |_| true), None);
    }

    #[test]
    fn declined_match_keeps_searching() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(&first.path().join("a").join(LAUNCHER_FILE));
        let wanted = second.path().join("b").join(LAUNCHER_FILE);
        touch(&wanted);

        let mut offered = Vec::new();
        let found = GameDetector::find_launcher(&[first.path().to_path_buf(), second.path().to_path_buf()], |p| {
            offered.push(p.to_path_buf());
            offered.len() == 2
        });

        assert_eq!(found, Some(wanted));
        assert_eq!(offered.len(), 2);
    }

    #[test]
    fn missing_roots_are_ignored() {
        let dir = TempDir::new().unwrap();
        let roots = [dir.path().join("does-not-exist")];
        assert_eq!(GameDetector::find_launcher(&roots, |_| true), None);
    }
}
