use anyhow::{Context, Result};
use bundlekit_core::firmware::{FirmwareInfo, ReleaseArchive};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Decode the firmware identity and pick the image for symbol resolution
pub fn resolve(
    input: &str,
    releases: Option<&str>,
    elf: Option<&str>,
) -> Result<(Option<FirmwareInfo>, Option<PathBuf>)> {
    let bundle = super::load_bundle(input)?;

    let firmware = match bundle.firmware() {
        Some(Ok(info)) => Some(info),
        Some(Err(e)) => {
            warn!("Firmware section unreadable: {}", e);
            None
        }
        None => {
            warn!("Bundle has no firmware section");
            None
        }
    };

    let archive = match releases {
        Some(dir) => ReleaseArchive::scan_dir(dir)
            .with_context(|| format!("Failed to index release directory: {}", dir))?,
        None => ReleaseArchive::default(),
    };
    info!("{} release images indexed", archive.len());

    let image = archive.select_image(firmware.as_ref(), elf.map(Path::new), None);
    Ok((firmware, image))
}

pub fn execute(input: &str, releases: Option<&str>, elf: Option<&str>) -> Result<()> {
    let (firmware, image) = resolve(input, releases, elf)?;

    println!("\n=== Firmware ===");
    match &firmware {
        Some(info) => {
            println!("App id:            {:08x}", info.app_id);
            println!("Version:           {}", info.version_string());
            if let Some(git) = &info.git_version {
                println!("Git version:       {}", git);
            }
            if let Some(checksum) = &info.image_checksum {
                println!("Image checksum:    {}", hex::encode(checksum));
            }
        }
        None => println!("No firmware identity available"),
    }

    match image {
        Some(path) => println!("Image:             {}", path.display()),
        None => println!("Image:             not found"),
    }

    Ok(())
}
