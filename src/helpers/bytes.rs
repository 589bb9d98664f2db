//! Little-endian conversions over byte slices taken from workbook records.
//! Short slices are zero-padded so a truncated record never panics the reader.

/// Copies up to `N` leading bytes into a zero-padded array.
#[inline]
fn le_array<const N: usize>(s: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    let size = s.len().min(N);
    array[..size].copy_from_slice(&s[..size]);
    array
}

/// Converts a byte slice into an iterator of 32-bit unsigned integers.
/// A trailing partial chunk is ignored.
pub(crate) fn to_u32_iter(bytes: &[u8]) -> impl ExactSizeIterator<Item = u32> + '_ {
    bytes.chunks_exact(4).map(|chunk| u32::from_le_bytes(le_array(chunk)))
}

/// Converts a byte slice into an iterator of usize values.
pub(crate) fn to_usize_iter(bytes: &[u8]) -> impl ExactSizeIterator<Item = usize> + '_ {
    to_u32_iter(bytes).map(|value| value as usize)
}

#[inline]
pub(crate) fn to_f64(s: &[u8]) -> f64 {
    f64::from_le_bytes(le_array(s))
}

#[inline]
pub(crate) fn to_u64(s: &[u8]) -> u64 {
    u64::from_le_bytes(le_array(s))
}

#[inline]
pub(crate) fn to_u32(s: &[u8]) -> u32 {
    u32::from_le_bytes(le_array(s))
}

#[inline]
pub(crate) fn to_u16(s: &[u8]) -> u16 {
    u16::from_le_bytes(le_array(s))
}

#[inline]
pub(crate) fn to_usize(s: &[u8]) -> usize {
    to_u32(s) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_values() {
        assert_eq!(to_u16(&[0x34, 0x12]), 0x1234);
        assert_eq!(to_u32(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!(to_f64(&1.5f64.to_le_bytes()), 1.5);
    }

    #[test]
    fn short_slices_are_zero_padded() {
        assert_eq!(to_u32(&[0x01]), 1);
        assert_eq!(to_u64(&[]), 0);
    }

    #[test]
    fn iterator_skips_partial_chunk() {
        let values: Vec<usize> = to_usize_iter(&[1, 0, 0, 0, 2, 0, 0, 0, 9]).collect();
        assert_eq!(values, vec![1, 2]);
    }
}
