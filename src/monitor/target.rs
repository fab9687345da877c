//! Monitoring targets and process handles

use crate::discovery::InstalledGame;
use crate::error::{GameWatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The game selected for monitoring
///
/// Matched against live processes by executable basename, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Name shown in log lines
    pub display_name: String,
    /// Path to the executable as configured or discovered
    pub exe_path: PathBuf,
    /// Lowercase executable basename (e.g. "portal2.exe")
    pub process_name: String,
}

impl Target {
    /// Create a target from a display name and an executable path or bare name
    ///
    /// Returns `NoExecutable` when the path has no usable basename.
    pub fn new(display_name: impl Into<String>, exe_path: impl Into<PathBuf>) -> Result<Self> {
        let display_name = display_name.into();
        let exe_path = exe_path.into();
        let process_name = process_match_key(&exe_path.to_string_lossy());
        if process_name.trim().is_empty() {
            return Err(GameWatchError::NoExecutable(display_name));
        }
        Ok(Self {
            display_name,
            exe_path,
            process_name,
        })
    }

    /// Create a target from a discovered game
    pub fn from_game(game: &InstalledGame) -> Result<Self> {
        match &game.executable {
            Some(exe) => Self::new(game.name.clone(), exe.clone()),
            None => Err(GameWatchError::NoExecutable(game.name.clone())),
        }
    }

    /// Whether a process executable name or path refers to this target
    pub fn matches(&self, candidate: &str) -> bool {
        process_match_key(candidate) == self.process_name
    }
}

/// Identifier of the live process resolved at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessHandle(u32);

impl ProcessHandle {
    /// Wrap a raw process id
    pub const fn from_pid(pid: u32) -> Self {
        Self(pid)
    }

    /// The raw process id
    pub const fn pid(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the executable basename and convert to lowercase
///
/// Handles both separators, since Steam manifests and user input may carry Windows paths
/// on any host.
///
/// Examples:
/// - "C:\\Games\\Portal 2\\portal2.exe" -> "portal2.exe"
/// - "/usr/games/Factorio" -> "factorio"
pub fn process_match_key(path: &str) -> String {
    let filename = path.rsplit(['\\', '/']).next().unwrap_or(path);
    filename.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_match_key() {
        assert_eq!(
            process_match_key("C:\\Games\\Portal 2\\portal2.exe"),
            "portal2.exe"
        );
        assert_eq!(process_match_key("Cyberpunk2077.EXE"), "cyberpunk2077.exe");
        assert_eq!(process_match_key("/usr/games/Factorio"), "factorio");
        assert_eq!(process_match_key("..\\..\\game.exe"), "game.exe");
        assert_eq!(process_match_key("\\\\server\\share\\app.exe"), "app.exe");
        assert_eq!(process_match_key("my.app.exe"), "my.app.exe");
    }

    #[test]
    fn test_target_matches_case_insensitively() {
        let target = Target::new("Portal 2", "C:\\Steam\\common\\Portal 2\\portal2.exe").unwrap();
        assert_eq!(target.process_name, "portal2.exe");
        assert!(target.matches("PORTAL2.EXE"));
        assert!(target.matches("D:\\Other\\Portal2.exe"));
        assert!(!target.matches("portal2"));
        assert!(!target.matches("hl2.exe"));
    }

    #[test]
    fn test_target_without_basename_is_rejected() {
        let err = Target::new("Broken", "C:\\Games\\").unwrap_err();
        assert!(matches!(err, GameWatchError::NoExecutable(name) if name == "Broken"));
    }

    #[test]
    fn test_target_from_game_without_executable() {
        let game = InstalledGame {
            app_id: Some("620".to_string()),
            name: "Portal 2".to_string(),
            install_dir: Some("Portal 2".to_string()),
            game_dir: PathBuf::from("/steam/steamapps/common/Portal 2"),
            executable: None,
        };
        assert!(matches!(
            Target::from_game(&game),
            Err(GameWatchError::NoExecutable(_))
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: match keys are always lowercase
            #[test]
            fn match_key_is_always_lowercase(s in "[a-zA-Z0-9_-]+\\.exe") {
                let key = process_match_key(&s);
                prop_assert_eq!(key.clone(), key.to_lowercase());
            }

            /// Property: directory components never leak into the key
            #[test]
            fn match_key_drops_directories(
                dirs in prop::collection::vec("[a-zA-Z0-9_ -]+", 1..5),
                filename in "[a-zA-Z0-9_-]+\\.exe"
            ) {
                let path = format!("C:\\{}\\{}", dirs.join("\\"), filename);
                prop_assert_eq!(process_match_key(&path), filename.to_lowercase());
            }
        }
    }
}
