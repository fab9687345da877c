//! Installed game discovery
//!
//! Finds Steam games by reading the library manifests on disk. Discovery only feeds the
//! presentation layer's game list; the monitoring core works from a [`Target`] and never
//! calls into this module.
//!
//! # Sources
//!
//! - Steam roots: the `SteamPath` registry value on Windows, then common install
//!   locations; `~/.steam/steam` and `~/.local/share/Steam` elsewhere
//! - Libraries: every root's `steamapps` plus the `path` entries of its
//!   `libraryfolders.vdf`
//! - Games: one per `appmanifest_<id>.acf`, executable guessed as the first top-level
//!   `.exe` of the install directory
//!
//! [`Target`]: crate::monitor::Target

pub mod steam;
pub mod vdf;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// A game found in a Steam library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledGame {
    /// Steam app id from the manifest file name
    pub app_id: Option<String>,
    /// Display name, or the install directory when the manifest has no name
    pub name: String,
    /// Directory name under `steamapps/common`
    pub install_dir: Option<String>,
    /// Full path of the install directory
    pub game_dir: PathBuf,
    /// Detected executable, if any
    pub executable: Option<PathBuf>,
}

/// Games installed in every Steam library on this machine
pub fn list_installed_games() -> Vec<InstalledGame> {
    discover_in(&steam::steam_roots())
}

/// Games installed in the libraries reachable from `roots`
///
/// Entries are de-duplicated on app id, install directory and name, keeping the first.
pub fn discover_in(roots: &[PathBuf]) -> Vec<InstalledGame> {
    let libraries = steam::library_dirs(roots);
    let mut seen = HashSet::new();

    let games: Vec<InstalledGame> = libraries
        .iter()
        .flat_map(|library| steam::scan_library(library))
        .filter(|game| {
            seen.insert((
                game.app_id.clone(),
                game.install_dir.clone(),
                game.name.clone(),
            ))
        })
        .collect();

    info!(
        "Discovered {} games in {} Steam libraries",
        games.len(),
        libraries.len()
    );
    games
}

/// Find a discovered game by name, case-insensitively
pub fn find_by_name<'a>(games: &'a [InstalledGame], name: &str) -> Option<&'a InstalledGame> {
    games
        .iter()
        .find(|game| game.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_dir;
    use std::fs;

    fn game(name: &str) -> InstalledGame {
        InstalledGame {
            app_id: None,
            name: name.to_string(),
            install_dir: None,
            game_dir: PathBuf::new(),
            executable: None,
        }
    }

    #[test]
    fn test_discover_in_dedupes_shared_library() {
        let dir = create_test_dir();
        let root = dir.path().join("Steam");
        let steamapps = root.join("steamapps");
        fs::create_dir_all(&steamapps).unwrap();
        fs::write(
            steamapps.join("appmanifest_620.acf"),
            r#""AppState" { "name" "Portal 2" "installdir" "Portal 2" }"#,
        )
        .unwrap();
        // libraryfolders.vdf lists the root itself, as Steam does
        fs::write(
            steamapps.join("libraryfolders.vdf"),
            format!(
                "\"libraryfolders\" {{ \"0\" {{ \"path\" \"{}\" }} }}",
                root.to_string_lossy().replace('\\', "\\\\")
            ),
        )
        .unwrap();

        let games = discover_in(&[root.clone(), root]);

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Portal 2");
    }

    #[test]
    fn test_discover_in_no_roots() {
        assert!(discover_in(&[]).is_empty());
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let games = vec![game("Portal 2"), game("Half-Life")];
        assert_eq!(find_by_name(&games, "portal 2").map(|g| g.name.as_str()), Some("Portal 2"));
        assert!(find_by_name(&games, "Portal").is_none());
    }
}
