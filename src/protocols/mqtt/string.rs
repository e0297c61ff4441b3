//! Length-prefixed MQTT strings.
//!
//! ```text
//! +-------------+-------------+------------------+
//! | length MSB  | length LSB  | length raw bytes |
//! +-------------+-------------+------------------+
//! ```

use bytes::BufMut;

use super::PacketError;

/// Longest string representable by the 2-byte length prefix.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Encode `value` as a 2-byte big-endian length followed by its bytes.
///
/// Nothing is written if the string is too long.
pub fn encode_string<B: BufMut>(buf: &mut B, value: &str) -> Result<(), PacketError> {
    let bytes = value.as_bytes();
    let len = u16::try_from(bytes.len()).map_err(|_| PacketError::StringTooLong(bytes.len()))?;

    buf.put_u16(len);
    buf.put_slice(bytes);
    Ok(())
}

/// Decode a length-prefixed string from the start of `input`.
///
/// Returns the string and the number of bytes consumed.
pub fn decode_string(input: &[u8]) -> Result<(String, usize), PacketError> {
    if input.len() < 2 {
        return Err(PacketError::Incomplete {
            needed: 2,
            available: input.len(),
        });
    }

    let len = u16::from_be_bytes([input[0], input[1]]) as usize;
    let end = 2 + len;
    if input.len() < end {
        return Err(PacketError::Incomplete {
            needed: end,
            available: input.len(),
        });
    }

    let value = std::str::from_utf8(&input[2..end]).map_err(|_| PacketError::InvalidUtf8)?;
    Ok((value.to_string(), end))
}

/// Bytes needed to encode `value`.
pub fn encoded_len(value: &str) -> usize {
    2 + value.len()
}
