//! Subcommands of the `bundlekit` binary

pub mod extract;
pub mod firmware;
pub mod pack;
pub mod scan;
pub mod verify;

use anyhow::{Context, Result};
use bundlekit_core::{decode_bundle, Bundle};
use std::fs;
use std::io::{self, Read};
use tracing::info;

/// Read a bundle from a file, or from stdin when `input` is `-`
pub fn read_input(input: &str) -> Result<Vec<u8>> {
    let data = if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read bundle from stdin")?;
        buf
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?
    };

    info!("Read {} bytes from {}", data.len(), input);
    Ok(data)
}

/// Read and decode a bundle
pub fn load_bundle(input: &str) -> Result<Bundle> {
    let data = read_input(input)?;
    decode_bundle(&data).with_context(|| format!("Failed to decode bundle: {}", input))
}
