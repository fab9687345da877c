#![no_main]

use gamewatch::config::AppConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing and validating arbitrary JSON must never panic
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = serde_json::from_str::<AppConfig>(s) {
            let _ = config.monitor.validate();
            let _ = config.monitor.sample_interval();
        }
    }
});
