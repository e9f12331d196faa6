#![no_main]

use devcert_pki::{parse_ca, CertificateSummary};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = CertificateSummary::from_pem(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let middle = text
        .char_indices()
        .nth(text.chars().count() / 2)
        .map_or(text.len(), |(index, _)| index);
    let (cert_pem, key_pem) = text.split_at(middle);
    let _ = parse_ca(cert_pem, key_pem);
});
