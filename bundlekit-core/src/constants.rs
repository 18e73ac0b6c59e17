//! Constants and limits for the bundle container and its section framings

use serde::{Deserialize, Serialize};

/// Global container magic (`0xDEADBEEF`, little-endian on the wire)
pub const CONTAINER_MAGIC: u32 = 0xDEAD_BEEF;

/// Container header size: 4-byte magic + 4-byte format version
pub const CONTAINER_HEADER_SIZE: usize = 8;

/// Legacy section start magic (`0xA5A5`, little-endian)
pub const V1_SECTION_MAGIC: u16 = 0xA5A5;

/// On-wire bytes of the v1 section magic, used for resynchronization
pub const V1_SECTION_MARKER: &[u8; 2] = &[0xA5, 0xA5];

/// v1 frame header: magic (2) + type (1) + version (1) + length (4)
pub const V1_HEADER_SIZE: usize = 8;

/// Current section start magic (`0xA5A55A5A`, little-endian)
pub const V2_SECTION_MAGIC: u32 = 0xA5A5_5A5A;

/// On-wire bytes of the v2 section start magic, used for resynchronization
pub const V2_SECTION_MARKER: &[u8; 4] = &[0x5A, 0x5A, 0xA5, 0xA5];

/// Section end magic carried in the v2 footer (`0x5A5AA5A5`, little-endian)
pub const V2_END_MAGIC: u32 = 0x5A5A_A5A5;

/// v2 frame header: magic (4) + length (4) + type (1) + version (1) + reserved (2)
pub const V2_HEADER_SIZE: usize = 12;

/// v2 footer: CRC-32 of the payload (4) + end magic (4)
pub const V2_FOOTER_SIZE: usize = 8;

/// Size of the CRC-32 checksum in bytes
pub const CRC32_SIZE: usize = 4;

/// Container format versions understood by the reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// 16-bit section magic, no footer
    V1,
    /// 32-bit section magic, CRC-32 + end magic footer
    #[default]
    V2,
}

impl FormatVersion {
    /// Map the raw header value to a known format version
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(FormatVersion::V1),
            2 => Some(FormatVersion::V2),
            _ => None,
        }
    }

    /// Raw value written into the container header
    pub const fn as_u32(&self) -> u32 {
        match self {
            FormatVersion::V1 => 1,
            FormatVersion::V2 => 2,
        }
    }

    /// Start-of-section byte pattern for this framing
    pub const fn marker(&self) -> &'static [u8] {
        match self {
            FormatVersion::V1 => V1_SECTION_MARKER,
            FormatVersion::V2 => V2_SECTION_MARKER,
        }
    }

    /// Fixed bytes preceding the payload
    pub const fn header_size(&self) -> usize {
        match self {
            FormatVersion::V1 => V1_HEADER_SIZE,
            FormatVersion::V2 => V2_HEADER_SIZE,
        }
    }

    /// Fixed bytes following the payload
    pub const fn footer_size(&self) -> usize {
        match self {
            FormatVersion::V1 => 0,
            FormatVersion::V2 => V2_FOOTER_SIZE,
        }
    }

    /// Total framing overhead per section
    pub const fn overhead(&self) -> usize {
        self.header_size() + self.footer_size()
    }
}
