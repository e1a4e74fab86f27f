#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz store path parsing.
///
/// Parsing is total, so any input must yield a path whose display parts
/// reassemble the input.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let path = closure_diff::model::StorePath::parse(s);
        let (hash, name, suffix) = path.display_parts();
        assert_eq!(format!("{hash}{name}{suffix}"), s);
        let _ = path.short_version();
    }
});
