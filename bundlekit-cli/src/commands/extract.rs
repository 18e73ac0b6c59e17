use anyhow::{Context, Result};
use bundlekit_core::{Bundle, Section, SectionKind};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Hex digits of the BLAKE3 digest kept in core dump file names
const DIGEST_PREFIX_LEN: usize = 16;

/// File name a section is extracted to, before de-duplication
///
/// Core dumps are named after their content so that dumps from separate
/// bundles can share a directory.
pub fn file_name_for(section: &Section) -> String {
    match section.kind() {
        SectionKind::CoreDump => {
            let digest = blake3::hash(&section.payload).to_hex();
            format!("coredump-{}.bin", &digest.as_str()[..DIGEST_PREFIX_LEN])
        }
        kind => kind.file_name(section.version),
    }
}

/// Pick a unique name, appending `_2`, `_3`, ... to repeated names
fn unique_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }

    let (stem, ext) = name.rsplit_once('.').unwrap_or((name.as_str(), ""));
    let mut n = 2;
    loop {
        let candidate = if ext.is_empty() {
            format!("{}_{}", stem, n)
        } else {
            format!("{}_{}.{}", stem, n, ext)
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Write every section payload of `bundle` into `dir`
///
/// Returns the written paths in stream order.
pub fn extract_to(bundle: &Bundle, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut taken = HashSet::new();
    let mut written = Vec::with_capacity(bundle.len());

    for section in bundle.sections() {
        let name = unique_name(file_name_for(section), &mut taken);
        let path = dir.join(&name);

        fs::write(&path, &section.payload)
            .with_context(|| format!("Failed to write section file: {}", path.display()))?;

        info!("Extracted {} ({} bytes)", name, section.len());
        written.push(path);
    }

    Ok(written)
}

pub fn execute(input: &str, output: &str) -> Result<()> {
    info!("Extracting sections from {} to {}", input, output);

    let bundle = super::load_bundle(input)?;

    let written = extract_to(&bundle, Path::new(output))?;

    println!("Extracted {} sections to {}", written.len(), output);
    for path in &written {
        if let Some(name) = path.file_name() {
            println!("  {}", name.to_string_lossy());
        }
    }

    Ok(())
}
