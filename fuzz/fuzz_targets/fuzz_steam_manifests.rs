#![no_main]

use gamewatch::discovery::vdf::{manifest_app_id, parse_app_manifest, parse_library_folders};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Manifests come from disk and may be truncated or corrupt
    let text = String::from_utf8_lossy(data);
    let _ = parse_library_folders(&text);
    let _ = parse_app_manifest(&text);
    let _ = manifest_app_id(&text);
});
