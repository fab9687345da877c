#![no_main]

use gamewatch::monitor::Target;
use gamewatch::monitor::target::process_match_key;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let key = process_match_key(s);
        assert!(!key.contains('\\') && !key.contains('/'));

        // A target built from any path matches its own basename
        if let Ok(target) = Target::new("fuzz", s) {
            assert!(target.matches(s));
        }
    }
});
