//! Minimal readers for Steam's text manifests
//!
//! Only the keys discovery needs are extracted. The files are not parsed as full
//! KeyValues trees.

use regex::Regex;
use std::sync::LazyLock;

#[expect(
    clippy::unwrap_used,
    reason = "Pattern is a compile-time constant covered by tests"
)]
static LIBRARY_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"path"\s*"([^"]+)""#).unwrap());

#[expect(
    clippy::unwrap_used,
    reason = "Pattern is a compile-time constant covered by tests"
)]
static MANIFEST_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"name"\s*"([^"]*)""#).unwrap());

#[expect(
    clippy::unwrap_used,
    reason = "Pattern is a compile-time constant covered by tests"
)]
static MANIFEST_INSTALLDIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"installdir"\s*"([^"]*)""#).unwrap());

#[expect(
    clippy::unwrap_used,
    reason = "Pattern is a compile-time constant covered by tests"
)]
static MANIFEST_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^appmanifest_(\d+)\.acf$").unwrap());

/// Name and install directory read from an `appmanifest_<id>.acf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    /// Display name
    pub name: Option<String>,
    /// Directory under `steamapps/common`
    pub install_dir: Option<String>,
}

/// Library roots listed in `libraryfolders.vdf`, with escaped backslashes unescaped
pub fn parse_library_folders(text: &str) -> Vec<String> {
    LIBRARY_PATH
        .captures_iter(text)
        .map(|caps| caps[1].replace("\\\\", "\\"))
        .collect()
}

/// Read the first `name` and `installdir` values of an app manifest
///
/// Returns `None` when neither key is present.
pub fn parse_app_manifest(text: &str) -> Option<AppManifest> {
    let name = MANIFEST_NAME
        .captures(text)
        .map(|caps| caps[1].to_string());
    let install_dir = MANIFEST_INSTALLDIR
        .captures(text)
        .map(|caps| caps[1].to_string());

    if name.is_none() && install_dir.is_none() {
        return None;
    }
    Some(AppManifest { name, install_dir })
}

/// App id encoded in a manifest file name, if it is one
pub fn manifest_app_id(file_name: &str) -> Option<String> {
    MANIFEST_FILE
        .captures(file_name)
        .map(|caps| caps[1].to_string())
}
