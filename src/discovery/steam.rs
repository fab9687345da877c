//! Steam library scanning

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::InstalledGame;
use super::vdf::{manifest_app_id, parse_app_manifest, parse_library_folders};

/// Well-known install locations checked after the registry
#[cfg(windows)]
const FALLBACK_ROOTS: &[&str] = &[
    "C:\\Program Files (x86)\\Steam",
    "C:\\Program Files\\Steam",
    "D:\\Steam",
    "D:\\SteamLibrary",
    "E:\\Steam",
    "E:\\SteamLibrary",
    "F:\\Steam",
    "F:\\SteamLibrary",
];

/// Existing Steam installation roots, registry location first
#[cfg(windows)]
pub fn steam_roots() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    match registry_steam_path() {
        Ok(path) => candidates.push(PathBuf::from(path)),
        Err(e) => debug!("SteamPath not found in registry: {}", e),
    }
    candidates.extend(FALLBACK_ROOTS.iter().map(PathBuf::from));
    existing_unique(candidates)
}

#[cfg(windows)]
fn registry_steam_path() -> std::io::Result<String> {
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    let steam = RegKey::predef(HKEY_CURRENT_USER).open_subkey("Software\\Valve\\Steam")?;
    steam.get_value("SteamPath")
}

/// Existing Steam installation roots under the user's home directory
#[cfg(not(windows))]
pub fn steam_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        warn!("Home directory unknown; no Steam roots to scan");
        return Vec::new();
    };
    existing_unique(vec![
        home.join(".steam").join("steam"),
        home.join(".local").join("share").join("Steam"),
    ])
}

fn existing_unique(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|path| path.is_dir())
        .filter(|path| seen.insert(fs::canonicalize(path).unwrap_or_else(|_| path.clone())))
        .collect()
}

/// `steamapps` directories of every root and every library it lists
pub fn library_dirs(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut libraries: Vec<PathBuf> = Vec::new();
    let mut push = |dir: PathBuf| {
        if dir.is_dir() && !libraries.contains(&dir) {
            libraries.push(dir);
        }
    };

    for root in roots {
        let steamapps = root.join("steamapps");
        let folders_file = steamapps.join("libraryfolders.vdf");
        push(steamapps);

        match fs::read_to_string(&folders_file) {
            Ok(text) => {
                for library in parse_library_folders(&text) {
                    push(PathBuf::from(library).join("steamapps"));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to read {}: {}", folders_file.display(), e),
        }
    }
    libraries
}

/// Games described by the app manifests of one `steamapps` directory
pub fn scan_library(steamapps: &Path) -> Vec<InstalledGame> {
    let entries = match fs::read_dir(steamapps) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {}: {}", steamapps.display(), e);
            return Vec::new();
        }
    };

    let mut manifests: Vec<(String, PathBuf)> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            manifest_app_id(&file_name).map(|id| (id, entry.path()))
        })
        .collect();
    manifests.sort();

    let mut games = Vec::with_capacity(manifests.len());
    for (app_id, path) in manifests {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping unreadable manifest {}: {}", path.display(), e);
                continue;
            }
        };
        let Some(manifest) = parse_app_manifest(&text) else {
            debug!("Skipping manifest without name or installdir: {}", path.display());
            continue;
        };

        let game_dir = steamapps
            .join("common")
            .join(manifest.install_dir.as_deref().unwrap_or_default());
        let executable = find_executable(&game_dir);
        let Some(name) = manifest.name.or_else(|| manifest.install_dir.clone()) else {
            continue;
        };

        games.push(InstalledGame {
            app_id: Some(app_id),
            name,
            install_dir: manifest.install_dir,
            game_dir,
            executable,
        });
    }
    games
}

/// First top-level `.exe` in `game_dir` by file name, case-insensitive
pub fn find_executable(game_dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(game_dir).ok()?;
    let mut executables: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
        })
        .collect();
    executables.sort();
    executables.into_iter().next()
}
