#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz scraping of dry-run rebuild output for the pending system recipe.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Some(path) = closure_diff::pipeline::scrape_system_drv(&text) {
        assert!(path.is_drv());
    }
});
