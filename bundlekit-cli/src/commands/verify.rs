use anyhow::{bail, Result};
use bundlekit_core::FaultClass;
use colored::*;
use tracing::info;

use super::load_bundle;

/// Check a bundle and print a verdict
///
/// With `strict`, any warning makes the command fail.
pub fn execute(input: &str, strict: bool) -> Result<()> {
    info!("Verifying bundle: {}", input);

    let bundle = load_bundle(input)?;

    if bundle.is_empty() {
        println!("{} No sections found", "✗".red());
    }

    println!("\n=== Verification Results ===");
    println!("Format version:     {}", bundle.version.as_u32());
    println!("Sections found:     {}", bundle.len());

    let framing = bundle.framing_faults();
    let integrity = bundle.integrity_faults();
    let truncated = bundle.warnings_of(FaultClass::Truncation).count();

    let show = |n: usize| {
        if n > 0 {
            n.to_string().red()
        } else {
            n.to_string().normal()
        }
    };
    println!("Framing faults:     {}", show(framing));
    println!("Integrity faults:   {}", show(integrity));
    println!("Truncated tail:     {}", if truncated > 0 { "yes".red() } else { "no".normal() });

    // Overall status
    println!("\n=== Summary ===");
    if bundle.is_clean() {
        println!("{} Bundle is fully valid", "✓".green());
    } else if integrity > 0 {
        println!("{} Bundle contains sections that failed verification", "✗".red());
    } else {
        println!(
            "{} All recovered sections verified, but the stream was damaged",
            "!".yellow()
        );
    }

    if strict && !bundle.is_clean() {
        bail!(
            "Bundle has {} warning(s) ({} framing, {} integrity)",
            bundle.warnings.len(),
            framing,
            integrity
        );
    }

    Ok(())
}
