use anyhow::{bail, Context, Result};
use bundlekit_core::{encoder::BundleBuilder, FormatVersion, Section};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// One manifest entry
///
/// Exactly one of `hex`, `text` or `file` supplies the payload. Relative
/// `file` paths resolve against the manifest's directory.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub type_code: u8,
    pub version: u8,
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

impl ManifestEntry {
    fn into_section(self, base: &Path, index: usize) -> Result<Section> {
        let payload = match (self.hex, self.text, self.file) {
            (Some(hex), None, None) => hex::decode(hex.trim())
                .with_context(|| format!("Entry {}: invalid hex payload", index))?,
            (None, Some(text), None) => text.into_bytes(),
            (None, None, Some(file)) => {
                let path = base.join(&file);
                fs::read(&path)
                    .with_context(|| format!("Entry {}: failed to read {}", index, path.display()))?
            }
            _ => bail!("Entry {}: exactly one of hex, text or file is required", index),
        };

        Ok(Section::new(self.type_code, self.version, payload))
    }
}

/// Parse the `--format-version` argument
pub fn parse_format_version(raw: u32) -> Result<FormatVersion> {
    match FormatVersion::from_raw(raw) {
        Some(version) => Ok(version),
        None => bail!("Unsupported format version {} (expected 1 or 2)", raw),
    }
}

pub fn execute(input: &str, output: &str, format_version: u32) -> Result<()> {
    info!("Packing sections from {} to {}", input, output);

    let version = parse_format_version(format_version)?;

    // Read input JSON
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;

    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON manifest")?;

    info!("Found {} sections to pack", entries.len());

    let base = Path::new(input).parent().unwrap_or_else(|| Path::new("."));
    let mut builder = BundleBuilder::new(version);
    for (i, entry) in entries.into_iter().enumerate() {
        let section = entry.into_section(base, i)?;
        info!(
            "Packed section {}-{} ({} bytes)",
            section.kind(),
            section.version,
            section.len()
        );
        builder = builder.push(section);
    }

    let encoded = builder
        .build()
        .with_context(|| "Failed to encode bundle")?;

    // Write output file
    fs::write(output, &encoded)
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!(
        "Successfully packed v{} bundle ({} bytes total)",
        version.as_u32(),
        encoded.len()
    );

    Ok(())
}
