//! MQTT remaining-length field.
//!
//! The size of the variable header plus payload, written as a
//! variable-length quantity: 7 value bits per byte, least significant
//! group first, with 0x80 set on every byte except the last.
//!
//! | Value range             | Bytes |
//! |-------------------------|-------|
//! | 0 - 127                 | 1     |
//! | 128 - 16 383            | 2     |
//! | 16 384 - 2 097 151      | 3     |
//! | 2 097 152 - 268 435 455 | 4     |

use bytes::BufMut;

use super::PacketError;

/// Largest value that fits in four bytes.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

const CONTINUATION: u8 = 0x80;

/// Append the encoded form of `value` to `buf`.
///
/// Nothing is written if `value` exceeds `MAX_REMAINING_LENGTH`.
pub fn encode<B: BufMut>(buf: &mut B, value: usize) -> Result<(), PacketError> {
    if value > MAX_REMAINING_LENGTH {
        return Err(PacketError::RemainingLengthTooLarge(value));
    }

    let mut value = value;
    loop {
        let mut byte = (value % 128) as u8;
        value /= 128;
        if value > 0 {
            byte |= CONTINUATION;
        }
        buf.put_u8(byte);
        if value == 0 {
            return Ok(());
        }
    }
}

/// Number of bytes `encode` emits for `value`.
pub fn encoded_size(value: usize) -> Result<usize, PacketError> {
    match value {
        0..=127 => Ok(1),
        128..=16_383 => Ok(2),
        16_384..=2_097_151 => Ok(3),
        2_097_152..=MAX_REMAINING_LENGTH => Ok(4),
        _ => Err(PacketError::RemainingLengthTooLarge(value)),
    }
}

/// Decode a remaining-length field from the start of `input`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(input: &[u8]) -> Result<(usize, usize), PacketError> {
    let mut value = 0usize;
    let mut multiplier = 1usize;

    for i in 0..4 {
        let byte = *input.get(i).ok_or(PacketError::Incomplete {
            needed: i + 1,
            available: input.len(),
        })?;

        value += (byte & 0x7F) as usize * multiplier;
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
        multiplier *= 128;
    }

    Err(PacketError::MalformedRemainingLength)
}
