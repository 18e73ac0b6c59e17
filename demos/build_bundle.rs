//! Build a small bundle the way a device would write it

use bundlekit_core::{encoder::BundleBuilder, FormatVersion};

fn firmware_payload() -> Vec<u8> {
    let mut payload = Vec::with_capacity(108);
    payload.extend_from_slice(&0x1234_abcdu32.to_le_bytes()); // app id
    for part in [1u16, 4, 2] {
        payload.extend_from_slice(&part.to_le_bytes());
    }
    payload.extend_from_slice(&[0, 0]); // reserved

    let mut git = [0u8; 64];
    let describe = b"v1.4.2-3-gdeadbee";
    git[..describe.len()].copy_from_slice(describe);
    payload.extend_from_slice(&git);

    payload.extend_from_slice(&[0xAB; 32]); // image checksum
    payload
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Bundlekit Build Example\n");

    let bundle = BundleBuilder::new(FormatVersion::V2)
        .section(0, 3, b"cpu=cortex-m4 ram=256k reset=watchdog".to_vec())
        .section(1, 1, firmware_payload())
        .section(7, 1, vec![0u8; 4 * 8])
        .section(2, 1, vec![0xC0u8; 2048])
        .build()?;

    for (name, start) in [("header", 0usize), ("first section", 8)] {
        println!("{:>14}: {}", name, hex_preview(&bundle[start..start + 8]));
    }

    std::fs::write("example_bundle.bin", &bundle)?;

    println!("\nWrote {} bytes to example_bundle.bin", bundle.len());
    println!("Use 'bundlekit scan --input example_bundle.bin' to read it back");

    Ok(())
}

fn hex_preview(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
