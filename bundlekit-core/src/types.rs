//! Core types for decoded bundles

use crate::constants::FormatVersion;
use crate::registry::SectionKind;
use alloc::vec::Vec;
use bytes::Bytes;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Container header, read once at the start of a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Global magic (always `CONTAINER_MAGIC` once validated)
    pub magic: u32,

    /// Negotiated framing version
    pub version: FormatVersion,
}

/// Frame header as read from the wire
///
/// Only lives for the duration of one section decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Section start magic
    pub magic: u32,

    /// Declared payload length
    pub payload_len: u32,

    /// Section type code
    pub type_code: u8,

    /// Section format version
    pub version: u8,
}

/// One typed, versioned chunk of diagnostic payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section type code
    pub type_code: u8,

    /// Section format version
    pub version: u8,

    /// Raw payload bytes
    pub payload: Bytes,
}

impl Section {
    /// Create a new section
    pub fn new(type_code: u8, version: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            type_code,
            version,
            payload: payload.into(),
        }
    }

    /// Registry classification of this section
    pub fn kind(&self) -> SectionKind {
        SectionKind::from_code(self.type_code)
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// A section found at a specific offset in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSection {
    /// Byte offset of the frame's start magic
    pub offset: usize,

    /// Total bytes consumed by the frame
    pub size: usize,

    /// The decoded section
    pub section: Section,
}

/// Broad category of a decode fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultClass {
    /// The frame could not be read as declared; resynchronization followed
    Framing,
    /// The frame was read but its footer failed verification
    Integrity,
    /// No further frame could be located; the tail was dropped
    Truncation,
}

/// What went wrong at a given offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum FaultKind {
    /// Fewer bytes remain than a frame header needs
    TruncatedHeader {
        /// Bytes left in the stream
        available: usize,
    },

    /// The section start magic does not match
    BadMarker,

    /// The declared payload (plus footer) runs past the end of the stream
    TruncatedPayload {
        /// Declared payload length
        declared: u32,
        /// Bytes left after the frame header
        available: usize,
    },

    /// The declared span swallows the start of a following frame
    Overlap {
        /// Declared payload length
        declared: u32,
        /// Offset of the next start magic inside the span
        next_frame: usize,
    },

    /// The footer was found at a different position than declared and verified there
    LengthRepaired {
        /// Declared payload length
        declared: u32,
        /// Payload length implied by the verified footer
        recovered: u32,
    },

    /// Footer CRC does not match the payload
    CrcMismatch {
        /// CRC stored in the footer
        expected: u32,
        /// CRC computed over the payload
        actual: u32,
    },

    /// Footer end magic does not match; payload may be junk
    BadEndMarker {
        /// Value found where the end magic should be
        found: u32,
    },

    /// No further frame start exists; the remaining bytes were dropped
    Unrecoverable {
        /// Bytes discarded at the end of the stream
        discarded: usize,
    },
}

impl FaultKind {
    /// Category of this fault
    pub const fn class(&self) -> FaultClass {
        match self {
            FaultKind::TruncatedHeader { .. }
            | FaultKind::BadMarker
            | FaultKind::TruncatedPayload { .. }
            | FaultKind::Overlap { .. }
            | FaultKind::LengthRepaired { .. } => FaultClass::Framing,
            FaultKind::CrcMismatch { .. } | FaultKind::BadEndMarker { .. } => {
                FaultClass::Integrity
            }
            FaultKind::Unrecoverable { .. } => FaultClass::Truncation,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::TruncatedHeader { available } => {
                write!(f, "truncated frame header ({} bytes left)", available)
            }
            FaultKind::BadMarker => write!(f, "unexpected section magic"),
            FaultKind::TruncatedPayload {
                declared,
                available,
            } => write!(
                f,
                "section range out of bounds (declared {} bytes, {} available)",
                declared, available
            ),
            FaultKind::Overlap {
                declared,
                next_frame,
            } => write!(
                f,
                "declared length {} overlaps next section at offset {}",
                declared, next_frame
            ),
            FaultKind::LengthRepaired {
                declared,
                recovered,
            } => write!(
                f,
                "premature section ending, length repaired from {} to {} bytes",
                declared, recovered
            ),
            FaultKind::CrcMismatch { expected, actual } => write!(
                f,
                "CRC mismatch (footer {:08x}, computed {:08x})",
                expected, actual
            ),
            FaultKind::BadEndMarker { found } => {
                write!(f, "invalid section ending {:08x}, data might be junk", found)
            }
            FaultKind::Unrecoverable { discarded } => {
                write!(f, "no further section found, {} bytes discarded", discarded)
            }
        }
    }
}

/// A recoverable fault reported alongside the decoded sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeWarning {
    /// Byte offset of the frame the fault belongs to
    pub offset: usize,

    /// Type code from the frame header, when it was readable
    pub type_code: Option<u8>,

    /// Section version from the frame header, when it was readable
    pub version: Option<u8>,

    /// The fault itself
    pub kind: FaultKind,
}

impl DecodeWarning {
    /// Category of the underlying fault
    pub fn class(&self) -> FaultClass {
        self.kind.class()
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.type_code, self.version) {
            (Some(t), Some(v)) => write!(
                f,
                "section 0x{:02x}.{} @ offset {}: {}",
                t, v, self.offset, self.kind
            ),
            _ => write!(f, "offset {}: {}", self.offset, self.kind),
        }
    }
}

/// Decode statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Total bytes in the input, header included
    pub bytes_scanned: usize,

    /// Number of sections decoded
    pub sections_found: usize,

    /// Number of framing faults
    pub framing_faults: usize,

    /// Number of integrity faults
    pub integrity_faults: usize,

    /// Number of resynchronization scans performed
    pub resyncs: usize,

    /// Bytes skipped by resynchronization or dropped at the tail
    pub bytes_discarded: usize,

    /// Sum of all decoded frame sizes
    pub bytes_recovered: usize,
}

impl DecodeStats {
    /// Calculate recovery rate as a percentage of the bytes after the header
    pub fn recovery_rate(&self) -> f64 {
        let body = self
            .bytes_scanned
            .saturating_sub(crate::constants::CONTAINER_HEADER_SIZE);
        if body == 0 {
            100.0
        } else {
            (self.bytes_recovered as f64 / body as f64) * 100.0
        }
    }
}

/// A decoded bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// Negotiated container format version
    pub version: FormatVersion,

    /// Sections in stream order
    pub sections: Vec<LocatedSection>,

    /// Recoverable faults in stream order
    pub warnings: Vec<DecodeWarning>,

    /// Decode statistics
    pub stats: DecodeStats,
}

impl Bundle {
    /// Iterate over the sections in stream order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().map(|located| &located.section)
    }

    /// Number of decoded sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no section was decoded
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections ordered for presentation: ascending display weight, ties in stream order
    pub fn display_order(&self) -> Vec<&LocatedSection> {
        let mut ordered: Vec<&LocatedSection> = self.sections.iter().collect();
        ordered.sort_by_key(|located| located.section.kind().weight());
        ordered
    }

    /// First section of the given kind
    pub fn find(&self, kind: SectionKind) -> Option<&Section> {
        self.sections().find(|section| section.kind() == kind)
    }

    /// Warnings of the given class
    pub fn warnings_of(&self, class: FaultClass) -> impl Iterator<Item = &DecodeWarning> {
        self.warnings.iter().filter(move |w| w.class() == class)
    }

    /// Number of framing faults
    pub fn framing_faults(&self) -> usize {
        self.warnings_of(FaultClass::Framing).count()
    }

    /// Number of integrity faults
    pub fn integrity_faults(&self) -> usize {
        self.warnings_of(FaultClass::Integrity).count()
    }

    /// Whether the bundle decoded without any warning
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
