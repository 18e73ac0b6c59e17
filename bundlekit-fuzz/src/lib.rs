//! Fuzz entry points for bundlekit-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_decode

use bundlekit_core::FormatVersion;
use bytes::Bytes;

/// Decode arbitrary input as a whole bundle
pub fn fuzz_decode(data: &[u8]) {
    use bundlekit_core::{decode_bundle, decode_bundle_zero_copy};

    // Both readers must agree and neither may panic
    let copied = decode_bundle(data);
    let sliced = decode_bundle_zero_copy(Bytes::copy_from_slice(data));
    assert_eq!(copied, sliced);
}

/// Treat arbitrary input as the body of a valid container
///
/// The first byte picks the framing, so the frame scanners and the
/// resynchronizer see random data without the header check rejecting it.
pub fn fuzz_scan(data: &[u8]) {
    use bundlekit_core::{decode_bundle, encoder::BundleBuilder};

    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let version = if selector & 1 == 0 {
        FormatVersion::V1
    } else {
        FormatVersion::V2
    };

    let mut buf = match BundleBuilder::new(version).build() {
        Ok(header) => header.to_vec(),
        Err(_) => return,
    };
    buf.extend_from_slice(body);

    if let Ok(bundle) = decode_bundle(&buf) {
        let stats = &bundle.stats;
        assert!(stats.bytes_recovered + stats.bytes_discarded <= body.len());
    }
}
