//! Example demonstrating recovery from a damaged bundle

use bundlekit_core::{decode_bundle, encoder::BundleBuilder, FaultClass, FormatVersion};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Bundlekit Damaged Bundle Recovery Example\n");

    // Step 1: Create a clean bundle with 10 sections
    println!("Step 1: Creating 10 sections...");
    let mut builder = BundleBuilder::new(FormatVersion::V2);
    for i in 0..10u8 {
        let payload = format!("Diagnostics from module {} with a few extra bytes", i);
        builder = builder.section(6, i, payload.into_bytes());
    }
    let mut stream = builder.build()?.to_vec();

    let original_size = stream.len();
    println!("Created clean bundle: {} bytes\n", original_size);

    // Step 2: Simulate damage
    println!("Step 2: Simulating damage...");

    // Erased flash page
    if stream.len() > 200 {
        stream[150..200].fill(0xFF);
        println!("Erased bytes 150-200");
    }

    // Single bit flip inside a payload
    if stream.len() > 400 {
        stream[400] ^= 0x04;
        println!("Flipped one bit at byte 400");
    }

    // Torn write at the end
    stream.truncate(stream.len() - 20);
    println!("Dropped the last 20 bytes");

    println!("Damaged bundle: {} bytes\n", stream.len());

    // Step 3: Decode and recover
    println!("Step 3: Decoding damaged bundle...");
    let bundle = decode_bundle(&stream)?;
    let stats = &bundle.stats;

    println!("Decode Results:");
    println!("  Bytes scanned:     {}", stats.bytes_scanned);
    println!("  Sections found:    {}", stats.sections_found);
    println!("  Framing faults:    {}", stats.framing_faults);
    println!("  Integrity faults:  {}", stats.integrity_faults);
    println!("  Bytes discarded:   {}", stats.bytes_discarded);
    println!("  Recovery rate:     {:.1}%\n", stats.recovery_rate());

    println!("Warnings:");
    for warning in &bundle.warnings {
        println!("  [{:?}] {}", warning.class(), warning);
    }

    println!("\nRecovered sections:");
    for located in &bundle.sections {
        let section = &located.section;
        let flagged = bundle
            .warnings_of(FaultClass::Integrity)
            .any(|w| w.offset == located.offset);
        println!(
            "  @{:>4} {}-{}{}: {}",
            located.offset,
            section.kind(),
            section.version,
            if flagged { " (suspect)" } else { "" },
            String::from_utf8_lossy(&section.payload)
        );
    }

    println!(
        "\nRecovered {}/{} sections despite damage",
        bundle.len(),
        10
    );

    Ok(())
}
