//! Little-endian readers over byte slices.
//! Every accessor is bounds checked so that truncated or corrupt workbooks
//! surface as errors instead of panics.

/// Reads a `u16` at `offset`, or `None` when the slice is too short.
#[inline]
pub(crate) fn u16_at(bytes: &[u8], offset: usize) -> Option<u16> {
    let chunk = bytes.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([chunk[0], chunk[1]]))
}

/// Reads a `u32` at `offset`, or `None` when the slice is too short.
#[inline]
pub(crate) fn u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
    let chunk = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Reads a `u64` at `offset`, or `None` when the slice is too short.
#[inline]
pub(crate) fn u64_at(bytes: &[u8], offset: usize) -> Option<u64> {
    let chunk = bytes.get(offset..offset.checked_add(8)?)?;
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(chunk);
    Some(u64::from_le_bytes(buffer))
}

/// Iterates over the complete little-endian `u32` words of a slice.
/// A trailing partial word is ignored.
pub(crate) fn u32_words(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}
