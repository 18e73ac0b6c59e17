//! Firmware identity and release image selection
//!
//! The firmware section tells which application build produced a bundle.
//! Symbol resolution needs the matching ELF image; [`ReleaseArchive`]
//! indexes a directory of released images so the right one can be picked.

use crate::error::BundleError;
use crate::registry::SectionKind;
use crate::types::{Bundle, Section};
use alloc::format;
use alloc::string::String;

#[cfg(feature = "std")]
use crate::checksum::adler32;
#[cfg(feature = "std")]
use std::path::{Path, PathBuf};

#[cfg(all(feature = "std", feature = "logging"))]
use tracing::debug;

/// Application version triple
pub type AppVersion = (u16, u16, u16);

const APP_ID_RANGE: core::ops::Range<usize> = 0..4;
const VERSION_END: usize = 10;
const GIT_VERSION_RANGE: core::ops::Range<usize> = 12..76;
const IMAGE_CHECKSUM_RANGE: core::ops::Range<usize> = 76..108;

/// Identity of the application that wrote a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfo {
    /// Adler-32 of the application name
    pub app_id: u32,

    /// Release version
    pub version: AppVersion,

    /// `git describe` output baked into the build, if present
    pub git_version: Option<String>,

    /// SHA-256 of the running image, if present
    pub image_checksum: Option<[u8; 32]>,
}

impl FirmwareInfo {
    /// Decode the firmware section payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, BundleError> {
        if payload.len() < VERSION_END {
            return Err(BundleError::InvalidStructure(format!(
                "firmware section needs at least {} bytes, got {}",
                VERSION_END,
                payload.len()
            )));
        }

        let app_id = u32::from_le_bytes([
            payload[APP_ID_RANGE.start],
            payload[APP_ID_RANGE.start + 1],
            payload[APP_ID_RANGE.start + 2],
            payload[APP_ID_RANGE.start + 3],
        ]);
        let version = (
            u16::from_le_bytes([payload[4], payload[5]]),
            u16::from_le_bytes([payload[6], payload[7]]),
            u16::from_le_bytes([payload[8], payload[9]]),
        );

        let git_version = payload
            .get(GIT_VERSION_RANGE.start..)
            .map(|tail| &tail[..tail.len().min(GIT_VERSION_RANGE.len())])
            .map(read_c_str)
            .filter(|s| !s.is_empty());

        let image_checksum = payload.get(IMAGE_CHECKSUM_RANGE).map(|bytes| {
            let mut checksum = [0u8; 32];
            checksum.copy_from_slice(bytes);
            checksum
        });

        Ok(Self {
            app_id,
            version,
            git_version,
            image_checksum,
        })
    }

    /// Decode a firmware section
    pub fn from_section(section: &Section) -> Result<Self, BundleError> {
        if section.kind() != SectionKind::Firmware {
            return Err(BundleError::InvalidStructure(format!(
                "expected a firmware section, got {}",
                section.kind()
            )));
        }
        Self::from_payload(&section.payload)
    }

    /// Version formatted as `major.minor.patch`
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.version.0, self.version.1, self.version.2)
    }
}

/// Read a NUL-terminated string, lossily
fn read_c_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl Bundle {
    /// Decode the firmware section, if the bundle carries one
    ///
    /// When several were written, the last one wins.
    pub fn firmware(&self) -> Option<Result<FirmwareInfo, BundleError>> {
        self.sections()
            .filter(|section| section.kind() == SectionKind::Firmware)
            .last()
            .map(|section| FirmwareInfo::from_payload(&section.payload))
    }
}

/// A released firmware image
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseImage {
    /// Path to the ELF image
    pub path: PathBuf,

    /// Application name from the file name
    pub name: String,

    /// Target CPU from the file name
    pub cpu: String,

    /// Adler-32 of `name`, as stored in the firmware section
    pub app_id: u32,

    /// Release version from the file name
    pub version: AppVersion,
}

#[cfg(feature = "std")]
impl ReleaseImage {
    /// Parse `<name>-<cpu>-v<X>.<Y>.<Z>.elf`
    ///
    /// The name may itself contain dashes; the cpu is a single word and the
    /// leading `v` is optional.
    pub fn parse(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let stem = file_name.strip_suffix(".elf")?;

        let (rest, version) = stem.rsplit_once('-')?;
        let version = parse_version(version.strip_prefix('v').unwrap_or(version))?;

        let (name, cpu) = rest.rsplit_once('-')?;
        if !is_word(cpu) || name.is_empty() || !name.chars().all(|c| c == '-' || is_word_char(c)) {
            return None;
        }

        Some(Self {
            path: path.to_path_buf(),
            name: name.to_string(),
            cpu: cpu.to_string(),
            app_id: adler32(name.as_bytes()),
            version,
        })
    }
}

#[cfg(feature = "std")]
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(feature = "std")]
fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

#[cfg(feature = "std")]
fn parse_version(s: &str) -> Option<AppVersion> {
    let mut parts = s.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// Index of released firmware images
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct ReleaseArchive {
    images: Vec<ReleaseImage>,
}

#[cfg(feature = "std")]
impl ReleaseArchive {
    /// Build an archive from candidate paths, keeping those that parse
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let images = paths
            .into_iter()
            .filter_map(|p| ReleaseImage::parse(p.as_ref()))
            .collect();
        Self { images }
    }

    /// Index every release image in `dir`
    ///
    /// Entries are sorted by path so lookups are deterministic.
    pub fn scan_dir(dir: impl AsRef<Path>) -> Result<Self, BundleError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let archive = Self::from_paths(paths);

        #[cfg(feature = "logging")]
        debug!(
            "Indexed {} release images in {}",
            archive.images.len(),
            dir.as_ref().display()
        );

        Ok(archive)
    }

    /// All indexed images
    pub fn images(&self) -> &[ReleaseImage] {
        &self.images
    }

    /// Number of indexed images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image was indexed
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Find the image built for the given application and version
    pub fn find(&self, app_id: u32, version: AppVersion) -> Option<&Path> {
        self.images
            .iter()
            .find(|image| image.app_id == app_id && image.version == version)
            .map(|image| image.path.as_path())
    }

    /// Pick the image to resolve symbols against
    ///
    /// An explicit image always wins; otherwise the archive entry matching
    /// the bundle's firmware identity, and finally the fallback image.
    pub fn select_image(
        &self,
        firmware: Option<&FirmwareInfo>,
        explicit: Option<&Path>,
        fallback: Option<&Path>,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        firmware
            .and_then(|info| self.find(info.app_id, info.version))
            .or(fallback)
            .map(Path::to_path_buf)
    }
}
