#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str)| {
    let (a, b) = input;
    let forward = closure_diff::utils::compare_versions(a, b);
    let backward = closure_diff::utils::compare_versions(b, a);
    assert_eq!(forward, backward.reverse());
});
