//! Container reader
//!
//! Walks a bundle from the first frame to the end of the buffer:
//! 1. Validates the container header and picks the framing version
//! 2. Scans one frame at the current offset
//! 3. On success records the section and jumps past the frame
//! 4. On a framing fault records a warning and resynchronizes on the next
//!    start magic, or drops the tail when there is none
//!
//! Only a bad container header fails the decode. Everything after it is
//! salvaged on a best-effort basis and reported through warnings.

use crate::constants::{FormatVersion, CONTAINER_HEADER_SIZE, CONTAINER_MAGIC};
use crate::decoder::scan_frame;
use crate::error::BundleError;
use crate::scanner::find_next_marker;
use crate::types::{
    Bundle, ContainerHeader, DecodeStats, DecodeWarning, FaultClass, FaultKind, LocatedSection,
    Section,
};
use alloc::vec::Vec;
use bytes::Bytes;
use core::ops::Range;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Read and validate the container header
pub fn read_container_header(data: &[u8]) -> Result<ContainerHeader, BundleError> {
    if data.len() < CONTAINER_HEADER_SIZE {
        return Err(BundleError::IncompleteHeader {
            expected: CONTAINER_HEADER_SIZE,
            actual: data.len(),
        });
    }

    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if magic != CONTAINER_MAGIC {
        return Err(BundleError::BadMagic(magic));
    }

    let raw_version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let version =
        FormatVersion::from_raw(raw_version).ok_or(BundleError::UnsupportedVersion(raw_version))?;

    Ok(ContainerHeader { magic, version })
}

/// Decode a bundle, copying each section payload out of `data`
pub fn decode_bundle(data: &[u8]) -> Result<Bundle, BundleError> {
    decode_with(data, |range| Bytes::copy_from_slice(&data[range]))
}

/// Decode a bundle without copying payloads
///
/// Section payloads are slices of `buf` and keep it alive.
pub fn decode_bundle_zero_copy(buf: Bytes) -> Result<Bundle, BundleError> {
    decode_with(&buf, |range| buf.slice(range))
}

struct Collector {
    warnings: Vec<DecodeWarning>,
    stats: DecodeStats,
}

impl Collector {
    fn report(&mut self, warning: DecodeWarning) {
        #[cfg(feature = "logging")]
        warn!("{}", warning);

        match warning.class() {
            FaultClass::Framing => self.stats.framing_faults += 1,
            FaultClass::Integrity => self.stats.integrity_faults += 1,
            FaultClass::Truncation => {}
        }
        self.warnings.push(warning);
    }
}

fn decode_with<F>(data: &[u8], mut payload_of: F) -> Result<Bundle, BundleError>
where
    F: FnMut(Range<usize>) -> Bytes,
{
    let header = read_container_header(data)?;
    let version = header.version;

    #[cfg(feature = "logging")]
    debug!(
        "Decoding {:?} bundle of {} bytes",
        version,
        data.len()
    );

    let mut sections = Vec::new();
    let mut collector = Collector {
        warnings: Vec::new(),
        stats: DecodeStats {
            bytes_scanned: data.len(),
            ..Default::default()
        },
    };

    let mut offset = CONTAINER_HEADER_SIZE;
    while offset < data.len() {
        match scan_frame(version, data, offset) {
            Ok(frame) => {
                if let Some(kind) = frame.fault {
                    collector.report(DecodeWarning {
                        offset,
                        type_code: Some(frame.header.type_code),
                        version: Some(frame.header.version),
                        kind,
                    });
                }

                let section = Section {
                    type_code: frame.header.type_code,
                    version: frame.header.version,
                    payload: payload_of(frame.payload),
                };

                collector.stats.bytes_recovered += frame.size;
                sections.push(LocatedSection {
                    offset,
                    size: frame.size,
                    section,
                });
                offset += frame.size;
            }
            Err(fault) => {
                collector.report(DecodeWarning {
                    offset,
                    type_code: fault.header.map(|h| h.type_code),
                    version: fault.header.map(|h| h.version),
                    kind: fault.kind,
                });
                collector.stats.resyncs += 1;

                match find_next_marker(data, fault.resume_from, version.marker()) {
                    Some(next) => {
                        #[cfg(feature = "logging")]
                        debug!(
                            "Resynchronized at offset {} ({} bytes skipped)",
                            next,
                            next - offset
                        );

                        collector.stats.bytes_discarded += next - offset;
                        offset = next;
                    }
                    None => {
                        let discarded = data.len() - offset;
                        collector.report(DecodeWarning {
                            offset,
                            type_code: None,
                            version: None,
                            kind: FaultKind::Unrecoverable { discarded },
                        });
                        collector.stats.bytes_discarded += discarded;
                        offset = data.len();
                    }
                }
            }
        }
    }

    collector.stats.sections_found = sections.len();

    #[cfg(feature = "logging")]
    debug!(
        "Decode complete: {} sections, {} framing faults, {} integrity faults",
        collector.stats.sections_found,
        collector.stats.framing_faults,
        collector.stats.integrity_faults
    );

    Ok(Bundle {
        version,
        sections,
        warnings: collector.warnings,
        stats: collector.stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_section_v1, encode_section_v2, BundleBuilder};

    #[test]
    fn test_concrete_v1_bundle() {
        let data = [
            0xEF, 0xBE, 0xAD, 0xDE, 0x01, 0x00, 0x00, 0x00, // container header
            0xA5, 0xA5, 0x01, 0x01, 0x04, 0x00, 0x00, 0x00, // v1 frame header
            0x01, 0x02, 0x03, 0x04,
        ];

        let bundle = decode_bundle(&data).unwrap();

        assert_eq!(bundle.version, FormatVersion::V1);
        assert_eq!(bundle.len(), 1);
        let section = &bundle.sections[0].section;
        assert_eq!(section.type_code, 1);
        assert_eq!(section.version, 1);
        assert_eq!(section.payload.as_ref(), &[1, 2, 3, 4]);
        assert!(bundle.is_clean());
    }

    #[test]
    fn test_header_only() {
        let data = BundleBuilder::new(FormatVersion::V2).build().unwrap();
        let bundle = decode_bundle(&data).unwrap();

        assert!(bundle.is_empty());
        assert!(bundle.is_clean());
        assert_eq!(bundle.stats.resyncs, 0);
    }

    #[test]
    fn test_bad_magic() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(decode_bundle(&data), Err(BundleError::BadMagic(0)));
    }

    #[test]
    fn test_unsupported_versions() {
        for raw in [0u32, 3, 0xFFFF_FFFF] {
            let mut data = 0xDEAD_BEEFu32.to_le_bytes().to_vec();
            data.extend_from_slice(&raw.to_le_bytes());
            // A well-formed frame after the header must not matter
            data.extend_from_slice(&encode_section_v2(&Section::new(1, 1, &b"x"[..])).unwrap());
            assert_eq!(
                decode_bundle(&data),
                Err(BundleError::UnsupportedVersion(raw))
            );
        }
    }

    #[test]
    fn test_incomplete_header() {
        let data = [0xEF, 0xBE, 0xAD];
        assert!(matches!(
            decode_bundle(&data),
            Err(BundleError::IncompleteHeader {
                expected: 8,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_v1_resync_after_overrun() {
        let mut data = BundleBuilder::new(FormatVersion::V1).build().unwrap().to_vec();
        // Declared length 200, only 4 bytes follow before the next frame
        data.extend_from_slice(&[0xA5, 0xA5, 0x00, 0x01, 200, 0, 0, 0, 9, 9, 9, 9]);
        let next = data.len();
        data.extend_from_slice(&encode_section_v1(&Section::new(5, 1, &b"gpio"[..])).unwrap());
        // Overrun the buffer from here on
        data.extend_from_slice(&[0xA5, 0xA5, 0x07, 0x01, 0xFF, 0, 0, 0]);

        let bundle = decode_bundle(&data).unwrap();

        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.sections[0].offset, next);
        assert_eq!(bundle.sections[0].section.payload.as_ref(), b"gpio");
        assert_eq!(bundle.framing_faults(), 2);
        assert_eq!(bundle.stats.resyncs, 2);
        assert_eq!(
            bundle.warnings[0].kind,
            FaultKind::TruncatedPayload {
                declared: 200,
                available: 24
            }
        );
        assert_eq!(bundle.warnings[0].type_code, Some(0));
        assert_eq!(
            bundle.warnings.last().map(|w| w.kind),
            Some(FaultKind::Unrecoverable { discarded: 8 })
        );
        assert_eq!(bundle.stats.bytes_discarded, (next - 8) + 8);
    }

    #[test]
    fn test_v1_truncated_tail_is_unrecoverable() {
        let mut data = BundleBuilder::new(FormatVersion::V1)
            .section(0, 1, &b"sysinfo"[..])
            .build()
            .unwrap()
            .to_vec();
        data.extend_from_slice(&[0xA5, 0xA5, 0x07, 0x01, 0xFF, 0, 0, 0, 1, 2]);

        let bundle = decode_bundle(&data).unwrap();

        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.framing_faults(), 1);
        assert_eq!(bundle.warnings[0].type_code, Some(7));
        assert_eq!(
            bundle.warnings[1].kind,
            FaultKind::Unrecoverable { discarded: 10 }
        );
        assert_eq!(bundle.stats.bytes_discarded, 10);
    }

    #[test]
    fn test_zero_copy_matches_copying_decode() {
        let data = BundleBuilder::new(FormatVersion::V2)
            .section(0, 3, &b"sysinfo"[..])
            .section(7, 1, vec![0u8; 128])
            .build()
            .unwrap();

        let copied = decode_bundle(&data).unwrap();
        let sliced = decode_bundle_zero_copy(data.clone()).unwrap();
        assert_eq!(copied, sliced);
    }
}
