use anyhow::{Context, Result};
use bundlekit_core::{
    types::DecodeStats, Bundle, DecodeWarning, FormatVersion, LocatedSection,
};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

use super::load_bundle;

/// One section as listed in a scan report
#[derive(Debug, Serialize, Deserialize)]
pub struct SectionRecord {
    pub offset: usize,
    pub size: usize,
    pub type_code: u8,
    pub name: String,
    pub version: u8,
    pub payload_len: usize,
}

impl From<&LocatedSection> for SectionRecord {
    fn from(located: &LocatedSection) -> Self {
        let section = &located.section;
        Self {
            offset: located.offset,
            size: located.size,
            type_code: section.type_code,
            name: section.kind().name(),
            version: section.version,
            payload_len: section.len(),
        }
    }
}

/// JSON report written by `scan --output`
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanReport {
    pub version: FormatVersion,
    pub stats: DecodeStats,
    /// Sections in display order
    pub sections: Vec<SectionRecord>,
    pub warnings: Vec<DecodeWarning>,
}

impl From<&Bundle> for ScanReport {
    fn from(bundle: &Bundle) -> Self {
        Self {
            version: bundle.version,
            stats: bundle.stats.clone(),
            sections: bundle
                .display_order()
                .into_iter()
                .map(SectionRecord::from)
                .collect(),
            warnings: bundle.warnings.clone(),
        }
    }
}

pub fn execute(input: &str, output: Option<&str>, stats_only: bool) -> Result<()> {
    info!("Scanning bundle: {}", input);

    let bundle = load_bundle(input)?;
    let stats = &bundle.stats;

    // Print statistics
    println!("\n=== Scan Results ===");
    println!("Format version:    {}", bundle.version.as_u32());
    println!("Bytes scanned:     {} bytes", stats.bytes_scanned);
    println!("Sections found:    {}", stats.sections_found);
    println!("Framing faults:    {}", stats.framing_faults);
    println!("Integrity faults:  {}", stats.integrity_faults);
    println!("Resyncs:           {}", stats.resyncs);
    println!("Bytes discarded:   {} bytes", stats.bytes_discarded);
    println!("Recovery rate:     {:.2}%", stats.recovery_rate());
    println!();

    if stats_only {
        return Ok(());
    }

    let report = ScanReport::from(&bundle);

    if let Some(output_path) = output {
        // Write to JSON file
        let json = serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize scan report")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Scan report written to: {}", output_path);
    } else {
        // Print to stdout
        println!("=== Sections ===");
        for section in &report.sections {
            println!(
                "{}-{} @ offset {}: {} bytes",
                section.name, section.version, section.offset, section.payload_len
            );
        }

        if !report.warnings.is_empty() {
            println!("\n=== Warnings ===");
            for warning in &report.warnings {
                println!("{}", warning);
            }
        }
    }

    Ok(())
}
