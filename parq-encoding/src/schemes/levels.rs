//! Repetition/definition level encoding: hybrid RLE at the minimum bit width
//! for the level's maximum. The v1 page format prepends a 4-byte
//! little-endian length to each level block; v2 stores the byte lengths in
//! the page header instead.

use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use parq_core::errors::Result;
use parq_core::util::bit_util::num_required_bits;

use super::rle::{RleDecoder, RleEncoder};

pub fn level_bit_width(max_level: i16) -> u8 {
    num_required_bits(max_level as u64)
}

/// Encodes one page's levels. Callers skip the call entirely when
/// `max_level == 0`; the level stream is omitted in that case.
pub fn encode_levels(levels: &[i16], max_level: i16, length_prefixed: bool) -> Result<Bytes> {
    debug_assert!(max_level > 0);
    let mut encoder = RleEncoder::new(level_bit_width(max_level));
    for &level in levels {
        encoder.put_u64(level as u64);
    }
    let body = encoder.consume();
    if length_prefixed {
        let mut out = Vec::with_capacity(4 + body.len());
        out.write_u32::<LittleEndian>(body.len() as u32)?;
        out.extend_from_slice(&body);
        Ok(Bytes::from(out))
    } else {
        Ok(Bytes::from(body))
    }
}

/// Test-support inverse of [`encode_levels`]. Returns the levels and the
/// total bytes consumed from `data`.
pub fn decode_levels(
    data: &[u8],
    count: usize,
    max_level: i16,
    length_prefixed: bool,
) -> Option<(Vec<i16>, usize)> {
    let (body, consumed_prefix) = if length_prefixed {
        let len = u32::from_le_bytes(data.get(0..4)?.try_into().ok()?) as usize;
        (data.get(4..4 + len)?, 4 + len)
    } else {
        (data, data.len())
    };
    let mut decoder = RleDecoder::new(body, level_bit_width(max_level));
    let levels = decoder
        .collect_n(count)?
        .into_iter()
        .map(|v| v as i16)
        .collect();
    Some((levels, consumed_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_levels_are_length_prefixed() {
        let levels = vec![0i16, 1, 1, 0, 1, 1, 1, 0];
        let bytes = encode_levels(&levels, 1, true).unwrap();
        let body_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        assert_eq!(body_len + 4, bytes.len());
        let (decoded, consumed) = decode_levels(&bytes, levels.len(), 1, true).unwrap();
        assert_eq!(decoded, levels);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_v2_levels_have_no_prefix() {
        let levels = vec![0i16, 3, 2, 3, 3, 1];
        let bytes = encode_levels(&levels, 3, false).unwrap();
        let (decoded, _) = decode_levels(&bytes, levels.len(), 3, false).unwrap();
        assert_eq!(decoded, levels);
    }

    #[test]
    fn test_bit_width_tracks_max_level() {
        assert_eq!(level_bit_width(0), 0);
        assert_eq!(level_bit_width(1), 1);
        assert_eq!(level_bit_width(2), 2);
        assert_eq!(level_bit_width(3), 2);
        assert_eq!(level_bit_width(4), 3);
    }
}
