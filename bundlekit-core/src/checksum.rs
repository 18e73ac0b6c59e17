//! Checksums used by the bundle formats

/// Standard IEEE 802.3 CRC-32 (reflected polynomial 0xEDB88320)
///
/// This is the checksum the firmware stores in every v2 section footer.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

const ADLER_MOD: u32 = 65_521;

// Largest run of bytes that cannot overflow the u32 accumulators.
const ADLER_NMAX: usize = 5_552;

/// zlib Adler-32
///
/// Release images are identified by the Adler-32 of their application name.
pub fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;

    for chunk in data.chunks(ADLER_NMAX) {
        for &byte in chunk {
            a += u32::from(byte);
            b += a;
        }
        a %= ADLER_MOD;
        b %= ADLER_MOD;
    }

    (b << 16) | a
}
