//! Resynchronization over damaged streams
//!
//! When a frame cannot be read as declared, the reader calls
//! [`find_next_marker`] to locate the next plausible frame start and
//! discards everything in between.

/// Find the first occurrence of `marker` at or after `start`
///
/// Returns the absolute offset of the match, or `None` when the pattern
/// does not occur before the end of `data` (or `start` is already past it).
pub fn find_next_marker(data: &[u8], start: usize, marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || start >= data.len() {
        return None;
    }
    find_marker(&data[start..], marker).map(|pos| start + pos)
}

/// Find the next occurrence of a marker in `data`
fn find_marker(data: &[u8], marker: &[u8]) -> Option<usize> {
    // Fast substring search; memchr dispatches to optimized backends (SSE2/AVX2/NEON)
    if data.len() >= marker.len() {
        if let Some(pos) = memchr::memmem::find(data, marker) {
            return Some(pos);
        }
    }
    // Fallback: naive window scan
    data.windows(marker.len()).position(|window| window == marker)
}

/// Count every offset where `marker` starts, overlapping matches included
///
/// Used for diagnostics only; decoding never needs more than the next match.
pub fn count_markers(data: &[u8], marker: &[u8]) -> usize {
    let mut count = 0;
    let mut pos = 0;
    while let Some(found) = find_next_marker(data, pos, marker) {
        count += 1;
        pos = found + 1;
    }
    count
}
