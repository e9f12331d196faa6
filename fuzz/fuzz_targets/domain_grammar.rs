#![no_main]

use devcert_pki::{invalid_domains, is_valid_domain};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let accepted = is_valid_domain(text);
    if accepted {
        assert!(text.contains('.'));
        assert!(text.is_ascii());
    }

    let batch: Vec<String> = text.split(',').take(16).map(str::to_string).collect();
    let rejected = invalid_domains(&batch);
    assert!(rejected.len() <= batch.len());
    assert!(rejected.iter().all(|domain| !is_valid_domain(domain)));
});
