//! Bundle encoding
//!
//! The device firmware is the real producer of bundles; this writer emits
//! byte-identical framing so bundles can be built for tests, fixtures and
//! the `pack` command.

use crate::checksum::crc32;
use crate::constants::{
    FormatVersion, CONTAINER_HEADER_SIZE, CONTAINER_MAGIC, V1_SECTION_MAGIC, V2_END_MAGIC,
    V2_SECTION_MAGIC,
};
use crate::error::BundleError;
use crate::types::Section;
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};

fn payload_len(section: &Section) -> Result<u32, BundleError> {
    u32::try_from(section.payload.len())
        .map_err(|_| BundleError::PayloadTooLarge(section.payload.len()))
}

/// Write the container header
pub fn encode_container_header(version: FormatVersion, buf: &mut BytesMut) {
    buf.put_u32_le(CONTAINER_MAGIC);
    buf.put_u32_le(version.as_u32());
}

/// Encode a section with the legacy framing
///
/// 1. Magic (2 bytes): `0xA5A5`
/// 2. Type code (1 byte)
/// 3. Version (1 byte)
/// 4. Payload length (4 bytes, little-endian)
/// 5. Payload
pub fn encode_section_v1(section: &Section) -> Result<Bytes, BundleError> {
    let mut buf = BytesMut::with_capacity(FormatVersion::V1.overhead() + section.len());
    put_section_v1(section, &mut buf)?;
    Ok(buf.freeze())
}

fn put_section_v1(section: &Section, buf: &mut BytesMut) -> Result<(), BundleError> {
    let len = payload_len(section)?;
    buf.put_u16_le(V1_SECTION_MAGIC);
    buf.put_u8(section.type_code);
    buf.put_u8(section.version);
    buf.put_u32_le(len);
    buf.put_slice(&section.payload);
    Ok(())
}

/// Encode a section with the current framing
///
/// 1. Magic (4 bytes): `0xA5A55A5A`
/// 2. Payload length (4 bytes, little-endian)
/// 3. Type code (1 byte)
/// 4. Version (1 byte)
/// 5. Reserved (2 bytes, zero)
/// 6. Payload
/// 7. CRC-32 of the payload (4 bytes, little-endian)
/// 8. End magic (4 bytes): `0x5A5AA5A5`
pub fn encode_section_v2(section: &Section) -> Result<Bytes, BundleError> {
    let mut buf = BytesMut::with_capacity(FormatVersion::V2.overhead() + section.len());
    put_section_v2(section, &mut buf)?;
    Ok(buf.freeze())
}

fn put_section_v2(section: &Section, buf: &mut BytesMut) -> Result<(), BundleError> {
    let len = payload_len(section)?;
    buf.put_u32_le(V2_SECTION_MAGIC);
    buf.put_u32_le(len);
    buf.put_u8(section.type_code);
    buf.put_u8(section.version);
    buf.put_u16_le(0);
    buf.put_slice(&section.payload);
    buf.put_u32_le(crc32(&section.payload));
    buf.put_u32_le(V2_END_MAGIC);
    Ok(())
}

/// Encode a section with the framing of the given container version
pub fn encode_section(version: FormatVersion, section: &Section) -> Result<Bytes, BundleError> {
    match version {
        FormatVersion::V1 => encode_section_v1(section),
        FormatVersion::V2 => encode_section_v2(section),
    }
}

/// Encode a complete bundle: container header followed by every section
pub fn encode_bundle(version: FormatVersion, sections: &[Section]) -> Result<Bytes, BundleError> {
    let body: usize = sections
        .iter()
        .map(|s| version.overhead() + s.len())
        .sum();
    let mut buf = BytesMut::with_capacity(CONTAINER_HEADER_SIZE + body);

    encode_container_header(version, &mut buf);
    for section in sections {
        match version {
            FormatVersion::V1 => put_section_v1(section, &mut buf)?,
            FormatVersion::V2 => put_section_v2(section, &mut buf)?,
        }
    }

    Ok(buf.freeze())
}

/// Builder for constructing bundles section by section
#[derive(Debug, Clone, Default)]
pub struct BundleBuilder {
    version: FormatVersion,
    sections: Vec<Section>,
}

impl BundleBuilder {
    /// Create a new bundle builder
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            sections: Vec::new(),
        }
    }

    /// Append a section
    pub fn section(mut self, type_code: u8, version: u8, payload: impl Into<Bytes>) -> Self {
        self.sections.push(Section::new(type_code, version, payload));
        self
    }

    /// Append an already built section
    pub fn push(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Container version the bundle will be written with
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Build and encode the bundle
    pub fn build(&self) -> Result<Bytes, BundleError> {
        encode_bundle(self.version, &self.sections)
    }

    /// Return the sections without encoding
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}
