//! Frame scanners for the v1 and v2 section framings
//!
//! A scanner looks at exactly one candidate frame starting at a given
//! offset. It either returns the frame's payload range and total size, or a
//! [`FrameFault`] telling the reader where resynchronization should start.
//! Scanners never copy payload bytes; the reader decides whether to copy or
//! slice.

use crate::checksum::crc32;
use crate::constants::{
    FormatVersion, V1_HEADER_SIZE, V1_SECTION_MAGIC, V1_SECTION_MARKER, V2_END_MAGIC,
    V2_FOOTER_SIZE, V2_HEADER_SIZE, V2_SECTION_MAGIC, V2_SECTION_MARKER,
};
use crate::scanner::find_next_marker;
use crate::types::{FaultKind, FrameHeader, Section};
use bytes::Bytes;
use core::fmt;
use core::ops::Range;

#[cfg(feature = "logging")]
use tracing::debug;

/// A frame that was read successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFrame {
    /// Header as read from the wire
    pub header: FrameHeader,

    /// Absolute byte range of the payload in the scanned buffer
    pub payload: Range<usize>,

    /// Total bytes consumed by the frame
    pub size: usize,

    /// Soft fault attached to an otherwise usable frame
    pub fault: Option<FaultKind>,
}

/// A frame that could not be read as declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFault {
    /// What went wrong
    pub kind: FaultKind,

    /// Header fields, when the magic matched and the header was complete
    pub header: Option<FrameHeader>,

    /// Offset from which resynchronization should search
    pub resume_from: usize,
}

impl FrameFault {
    fn new(kind: FaultKind, header: Option<FrameHeader>, resume_from: usize) -> Self {
        Self {
            kind,
            header,
            resume_from,
        }
    }
}

impl fmt::Display for FrameFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.header {
            Some(h) => write!(f, "section 0x{:02x}.{}: {}", h.type_code, h.version, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameFault {}

fn read_u16_le(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32_le(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// End offset of a frame, or `None` if it cannot be represented
fn frame_end(payload_start: usize, payload_len: u32, footer: usize) -> Option<usize> {
    payload_start
        .checked_add(usize::try_from(payload_len).ok()?)?
        .checked_add(footer)
}

/// Scan one legacy frame at `offset`
///
/// Layout (little-endian):
/// 1. Magic (2 bytes): `0xA5A5`
/// 2. Type code (1 byte)
/// 3. Version (1 byte)
/// 4. Payload length (4 bytes)
/// 5. Payload
///
/// The legacy format carries no checksum, so payload integrity is not checked.
pub fn scan_frame_v1(data: &[u8], offset: usize) -> Result<ScannedFrame, FrameFault> {
    let available = data.len().saturating_sub(offset);
    if available < V1_HEADER_SIZE {
        return Err(FrameFault::new(
            FaultKind::TruncatedHeader { available },
            None,
            offset + 1,
        ));
    }

    let magic = read_u16_le(data, offset);
    if magic != V1_SECTION_MAGIC {
        return Err(FrameFault::new(FaultKind::BadMarker, None, offset + 1));
    }

    let header = FrameHeader {
        magic: u32::from(magic),
        type_code: data[offset + 2],
        version: data[offset + 3],
        payload_len: read_u32_le(data, offset + 4),
    };

    let payload_start = offset + V1_HEADER_SIZE;
    match frame_end(payload_start, header.payload_len, 0) {
        Some(end) if end <= data.len() => {
            #[cfg(feature = "logging")]
            debug!(
                "v1 section 0x{:02x}.{} at offset {} ({} bytes)",
                header.type_code, header.version, offset, header.payload_len
            );

            Ok(ScannedFrame {
                header,
                payload: payload_start..end,
                size: end - offset,
                fault: None,
            })
        }
        _ => Err(FrameFault::new(
            FaultKind::TruncatedPayload {
                declared: header.payload_len,
                available: data.len() - payload_start,
            },
            Some(header),
            offset + V1_SECTION_MARKER.len(),
        )),
    }
}

/// Scan one current-format frame at `offset`
///
/// Layout (little-endian):
/// 1. Magic (4 bytes): `0xA5A55A5A`
/// 2. Payload length (4 bytes)
/// 3. Type code (1 byte)
/// 4. Version (1 byte)
/// 5. Reserved (2 bytes)
/// 6. Payload
/// 7. Footer: CRC-32 of the payload (4 bytes), end magic `0x5A5AA5A5` (4 bytes)
///
/// A CRC mismatch, or a bad end magic that cannot be explained by a wrong
/// length, still yields the frame with a soft fault attached. When the
/// declared length runs past the buffer or into the next frame, the footer
/// is looked for right before the next start magic and accepted only if
/// both its end magic and CRC verify against the shorter payload.
pub fn scan_frame_v2(data: &[u8], offset: usize) -> Result<ScannedFrame, FrameFault> {
    let available = data.len().saturating_sub(offset);
    if available < V2_HEADER_SIZE {
        return Err(FrameFault::new(
            FaultKind::TruncatedHeader { available },
            None,
            offset + 1,
        ));
    }

    let magic = read_u32_le(data, offset);
    if magic != V2_SECTION_MAGIC {
        return Err(FrameFault::new(FaultKind::BadMarker, None, offset + 1));
    }

    let header = FrameHeader {
        magic,
        payload_len: read_u32_le(data, offset + 4),
        type_code: data[offset + 8],
        version: data[offset + 9],
    };

    let payload_start = offset + V2_HEADER_SIZE;
    let resume_from = offset + V2_SECTION_MARKER.len();

    #[cfg(feature = "logging")]
    debug!(
        "v2 section 0x{:02x}.{} at offset {} (declared {} bytes)",
        header.type_code, header.version, offset, header.payload_len
    );

    match frame_end(payload_start, header.payload_len, V2_FOOTER_SIZE) {
        Some(end) if end <= data.len() => {
            let footer_at = end - V2_FOOTER_SIZE;
            let crc = read_u32_le(data, footer_at);
            let end_magic = read_u32_le(data, footer_at + 4);
            let payload = payload_start..footer_at;

            if end_magic == V2_END_MAGIC {
                let actual = crc32(&data[payload.clone()]);
                let fault = (actual != crc).then_some(FaultKind::CrcMismatch {
                    expected: crc,
                    actual,
                });
                return Ok(ScannedFrame {
                    header,
                    payload,
                    size: end - offset,
                    fault,
                });
            }

            // Payloads may hold start magic bytes, so only a successor that
            // verifies proves the declared length wrong
            match verified_successor(data, resume_from, end) {
                Some(next) => relocate_footer(data, offset, header, next).ok_or_else(|| {
                    FrameFault::new(
                        FaultKind::Overlap {
                            declared: header.payload_len,
                            next_frame: next,
                        },
                        Some(header),
                        resume_from,
                    )
                }),
                None => Ok(ScannedFrame {
                    header,
                    payload,
                    size: end - offset,
                    fault: Some(FaultKind::BadEndMarker { found: end_magic }),
                }),
            }
        }
        _ => {
            let candidate =
                find_next_marker(data, resume_from, V2_SECTION_MARKER).unwrap_or(data.len());
            relocate_footer(data, offset, header, candidate).ok_or_else(|| {
                FrameFault::new(
                    FaultKind::TruncatedPayload {
                        declared: header.payload_len,
                        available: data.len() - payload_start,
                    },
                    Some(header),
                    resume_from,
                )
            })
        }
    }
}

/// First start magic in `from..end` that begins a verified frame
fn verified_successor(data: &[u8], from: usize, end: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(next) = find_next_marker(data, pos, V2_SECTION_MARKER) {
        if next >= end {
            return None;
        }
        if frame_verifies(data, next) {
            return Some(next);
        }
        pos = next + 1;
    }
    None
}

/// Whether a complete v2 frame with a matching footer starts at `offset`
fn frame_verifies(data: &[u8], offset: usize) -> bool {
    if data.len().saturating_sub(offset) < V2_HEADER_SIZE
        || read_u32_le(data, offset) != V2_SECTION_MAGIC
    {
        return false;
    }

    let payload_start = offset + V2_HEADER_SIZE;
    match frame_end(payload_start, read_u32_le(data, offset + 4), V2_FOOTER_SIZE) {
        Some(end) if end <= data.len() => {
            let footer_at = end - V2_FOOTER_SIZE;
            read_u32_le(data, footer_at + 4) == V2_END_MAGIC
                && crc32(&data[payload_start..footer_at]) == read_u32_le(data, footer_at)
        }
        _ => false,
    }
}

/// Re-verify a frame assuming it ends right before `end`
fn relocate_footer(
    data: &[u8],
    offset: usize,
    header: FrameHeader,
    end: usize,
) -> Option<ScannedFrame> {
    let payload_start = offset + V2_HEADER_SIZE;
    if end > data.len() || end < payload_start + V2_FOOTER_SIZE {
        return None;
    }

    let footer_at = end - V2_FOOTER_SIZE;
    if read_u32_le(data, footer_at + 4) != V2_END_MAGIC {
        return None;
    }

    let payload = payload_start..footer_at;
    if crc32(&data[payload.clone()]) != read_u32_le(data, footer_at) {
        return None;
    }

    let recovered = u32::try_from(payload.len()).ok()?;

    #[cfg(feature = "logging")]
    debug!(
        "relocated footer of section 0x{:02x}.{}: {} -> {} bytes",
        header.type_code, header.version, header.payload_len, recovered
    );

    Some(ScannedFrame {
        header,
        payload,
        size: end - offset,
        fault: Some(FaultKind::LengthRepaired {
            declared: header.payload_len,
            recovered,
        }),
    })
}

/// Scan one frame using the framing of the given container version
pub fn scan_frame(
    version: FormatVersion,
    data: &[u8],
    offset: usize,
) -> Result<ScannedFrame, FrameFault> {
    match version {
        FormatVersion::V1 => scan_frame_v1(data, offset),
        FormatVersion::V2 => scan_frame_v2(data, offset),
    }
}

/// Decode a single frame at the start of `data`
///
/// Returns the section (payload copied) and the number of bytes consumed.
/// Soft faults are dropped; use the bundle reader to see them.
pub fn decode_section(
    version: FormatVersion,
    data: &[u8],
) -> Result<(Section, usize), FrameFault> {
    let frame = scan_frame(version, data, 0)?;
    let section = Section {
        type_code: frame.header.type_code,
        version: frame.header.version,
        payload: Bytes::copy_from_slice(&data[frame.payload]),
    };
    Ok((section, frame.size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_section_v1, encode_section_v2};

    #[test]
    fn test_decode_simple_v1_frame() {
        let data = [0xA5, 0xA5, 0x01, 0x01, 0x04, 0x00, 0x00, 0x00, 1, 2, 3, 4];
        let (section, size) = decode_section(FormatVersion::V1, &data).unwrap();

        assert_eq!(size, 12);
        assert_eq!(section.type_code, 1);
        assert_eq!(section.version, 1);
        assert_eq!(section.payload.as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_v1_truncated_payload() {
        let data = [0xA5, 0xA5, 0x03, 0x02, 0x10, 0x00, 0x00, 0x00, 1, 2];
        let fault = scan_frame_v1(&data, 0).unwrap_err();

        assert_eq!(
            fault.kind,
            FaultKind::TruncatedPayload {
                declared: 16,
                available: 2
            }
        );
        assert_eq!(fault.header.map(|h| h.type_code), Some(3));
        assert_eq!(fault.resume_from, 2);
    }

    #[test]
    fn test_v1_bad_marker() {
        let data = [0xA5, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00];
        let fault = scan_frame_v1(&data, 0).unwrap_err();
        assert_eq!(fault.kind, FaultKind::BadMarker);
        assert!(fault.header.is_none());
        assert_eq!(fault.resume_from, 1);
    }

    #[test]
    fn test_v1_truncated_header() {
        let data = [0xA5, 0xA5, 0x01];
        let fault = scan_frame_v1(&data, 0).unwrap_err();
        assert_eq!(fault.kind, FaultKind::TruncatedHeader { available: 3 });
    }

    #[test]
    fn test_decode_v2_frame() {
        let encoded = encode_section_v2(&Section::new(7, 2, &b"backtrace"[..])).unwrap();
        let frame = scan_frame_v2(&encoded, 0).unwrap();

        assert_eq!(frame.size, encoded.len());
        assert_eq!(frame.size, 12 + 9 + 8);
        assert_eq!(&encoded[frame.payload.clone()], b"backtrace");
        assert_eq!(frame.fault, None);
        assert_eq!(frame.header.type_code, 7);
        assert_eq!(frame.header.version, 2);
    }

    #[test]
    fn test_v2_crc_mismatch_is_soft() {
        let mut encoded = encode_section_v2(&Section::new(0, 3, &b"sysinfo"[..]))
            .unwrap()
            .to_vec();
        encoded[12] ^= 0xFF;

        let frame = scan_frame_v2(&encoded, 0).unwrap();
        assert!(matches!(frame.fault, Some(FaultKind::CrcMismatch { .. })));
        assert_eq!(encoded[frame.payload][0], b's' ^ 0xFF);
    }

    #[test]
    fn test_v2_bad_end_marker_is_soft() {
        let mut encoded = encode_section_v2(&Section::new(0, 3, &b"sysinfo"[..]))
            .unwrap()
            .to_vec();
        let last = encoded.len() - 1;
        encoded[last] = 0x00;

        let frame = scan_frame_v2(&encoded, 0).unwrap();
        assert_eq!(
            frame.fault,
            Some(FaultKind::BadEndMarker {
                found: 0x005A_A5A5
            })
        );
        assert_eq!(frame.size, encoded.len());
    }

    #[test]
    fn test_v2_bad_marker() {
        let mut encoded = encode_section_v2(&Section::new(1, 1, &b"fw"[..]))
            .unwrap()
            .to_vec();
        encoded[0] = 0x00;

        let fault = scan_frame_v2(&encoded, 0).unwrap_err();
        assert_eq!(fault.kind, FaultKind::BadMarker);
        assert_eq!(fault.resume_from, 1);
    }

    #[test]
    fn test_v2_truncated_without_successor() {
        let encoded = encode_section_v2(&Section::new(2, 1, vec![0x11u8; 64])).unwrap();
        let cut = &encoded[..40];

        let fault = scan_frame_v2(cut, 0).unwrap_err();
        assert_eq!(
            fault.kind,
            FaultKind::TruncatedPayload {
                declared: 64,
                available: 28
            }
        );
        assert_eq!(fault.resume_from, 4);
    }

    #[test]
    fn test_v2_overlap_with_successor() {
        // First frame cut mid-payload, second frame intact right after
        let first = encode_section_v2(&Section::new(2, 1, vec![0x11u8; 64])).unwrap();
        let second = encode_section_v2(&Section::new(3, 1, vec![0x22u8; 64])).unwrap();

        let mut data = first[..40].to_vec();
        data.extend_from_slice(&second);

        let fault = scan_frame_v2(&data, 0).unwrap_err();
        assert_eq!(
            fault.kind,
            FaultKind::Overlap {
                declared: 64,
                next_frame: 40
            }
        );
    }

    #[test]
    fn test_v2_magic_bytes_in_payload_keep_frame() {
        let mut payload = vec![0x11u8; 32];
        payload[10..14].copy_from_slice(V2_SECTION_MARKER);
        let mut encoded = encode_section_v2(&Section::new(2, 1, payload.clone()))
            .unwrap()
            .to_vec();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;

        let frame = scan_frame_v2(&encoded, 0).unwrap();
        assert!(matches!(frame.fault, Some(FaultKind::BadEndMarker { .. })));
        assert_eq!(frame.size, encoded.len());
        assert_eq!(&encoded[frame.payload], &payload[..]);
    }

    #[test]
    fn test_v2_overlap_skips_unverified_marker() {
        // A stray start magic in the torn payload, then the real successor
        let mut torn = vec![0x11u8; 40];
        torn[..4].copy_from_slice(V2_SECTION_MARKER);
        let first = encode_section_v2(&Section::new(2, 1, torn)).unwrap();
        let second = encode_section_v2(&Section::new(3, 1, vec![0x22u8; 64])).unwrap();

        let mut data = first[..30].to_vec();
        data.extend_from_slice(&second);

        let fault = scan_frame_v2(&data, 0).unwrap_err();
        assert_eq!(
            fault.kind,
            FaultKind::Overlap {
                declared: 40,
                next_frame: 30
            }
        );
    }

    #[test]
    fn test_v2_length_repaired() {
        // Declared length larger than the real payload, footer intact
        let mut encoded = encode_section_v2(&Section::new(6, 1, &b"diagnostics"[..]))
            .unwrap()
            .to_vec();
        encoded[4..8].copy_from_slice(&500u32.to_le_bytes());

        let frame = scan_frame_v2(&encoded, 0).unwrap();
        assert_eq!(
            frame.fault,
            Some(FaultKind::LengthRepaired {
                declared: 500,
                recovered: 11
            })
        );
        assert_eq!(&encoded[frame.payload], b"diagnostics");
        assert_eq!(frame.size, encoded.len());
    }

    #[test]
    fn test_v2_relocation_requires_valid_crc() {
        let mut encoded = encode_section_v2(&Section::new(6, 1, &b"diagnostics"[..]))
            .unwrap()
            .to_vec();
        encoded[4..8].copy_from_slice(&500u32.to_le_bytes());
        encoded[14] ^= 0x01;

        let fault = scan_frame_v2(&encoded, 0).unwrap_err();
        assert!(matches!(fault.kind, FaultKind::TruncatedPayload { .. }));
    }

    #[test]
    fn test_scan_at_nonzero_offset() {
        let mut data = vec![0xEEu8; 5];
        data.extend_from_slice(&encode_section_v1(&Section::new(4, 2, &b"mod"[..])).unwrap());

        let frame = scan_frame(FormatVersion::V1, &data, 5).unwrap();
        assert_eq!(frame.payload, 13..16);
        assert_eq!(frame.size, 11);
    }

    #[test]
    fn test_huge_declared_length_does_not_panic() {
        let mut data = vec![0x5A, 0x5A, 0xA5, 0xA5];
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]);

        let fault = scan_frame_v2(&data, 0).unwrap_err();
        assert!(matches!(fault.kind, FaultKind::TruncatedPayload { .. }));
    }
}
