//! Shared encoding, hashing and compression helpers.

mod compression;
mod crypto;

pub use compression::{deflate, inflate};
pub use crypto::compute_sha256;

/// Largest value the ECMA-335 compressed unsigned integer encoding can hold.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// Writes an ECMA-335 compressed unsigned integer (II.23.2) to the buffer.
///
/// 1, 2 or 4 bytes, big-endian, with the width encoded in the leading bits.
///
/// # Errors
/// Returns a malformed error for values above [`MAX_COMPRESSED_UINT`].
#[allow(clippy::cast_possible_truncation)]
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> crate::Result<()> {
    if value < 0x80 {
        buffer.push(value as u8);
    } else if value < 0x4000 {
        let encoded = (0x8000 | value) as u16;
        buffer.extend_from_slice(&encoded.to_be_bytes());
    } else if value <= MAX_COMPRESSED_UINT {
        buffer.extend_from_slice(&(0xC000_0000 | value).to_be_bytes());
    } else {
        return Err(malformed_error!(
            "Value {} exceeds the compressed integer range",
            value
        ));
    }

    Ok(())
}

/// Writes an ECMA-335 compressed signed integer (II.23.2) to the buffer.
///
/// The value is rotated so that the sign lands in the least significant bit, after truncating to
/// 6, 13 or 28 bits. This is the encoding Portable PDB readers expect for sequence-point deltas.
///
/// # Errors
/// Returns a malformed error for values outside `-2^28..2^28`.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn write_compressed_int(value: i32, buffer: &mut Vec<u8>) -> crate::Result<()> {
    const B6: i32 = 0x3F;
    const B13: i32 = 0x1FFF;
    const B28: i32 = 0x0FFF_FFFF;

    let sign_mask = value >> 31;
    let sign_bit = sign_mask & 1;

    if (value & !B6) == (sign_mask & !B6) {
        let rotated = ((value & B6) << 1) | sign_bit;
        buffer.push(rotated as u8);
    } else if (value & !B13) == (sign_mask & !B13) {
        let rotated = ((value & B13) << 1) | sign_bit;
        buffer.extend_from_slice(&(0x8000 | rotated as u16).to_be_bytes());
    } else if (value & !B28) == (sign_mask & !B28) {
        let rotated = ((value & B28) << 1) | sign_bit;
        buffer.extend_from_slice(&(0xC000_0000 | rotated as u32).to_be_bytes());
    } else {
        return Err(malformed_error!(
            "Value {} exceeds the compressed signed integer range",
            value
        ));
    }

    Ok(())
}

/// Number of bytes [`write_compressed_uint`] emits for `value`.
#[must_use]
pub fn compressed_uint_size(value: u32) -> usize {
    if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else {
        4
    }
}

/// Round `value` up to the next multiple of 4.
#[must_use]
pub fn align_to_4(value: usize) -> usize {
    (value + 3) & !3
}

/// Pad the buffer with zero bytes until its length is a multiple of 4.
pub fn pad_to_4(buffer: &mut Vec<u8>) {
    buffer.resize(align_to_4(buffer.len()), 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    fn uint(value: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_compressed_uint(value, &mut buffer).unwrap();
        buffer
    }

    fn int(value: i32) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_compressed_int(value, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn compressed_uint_widths() {
        assert_eq!(uint(0x03), [0x03]);
        assert_eq!(uint(0x7F), [0x7F]);
        assert_eq!(uint(0x80), [0x80, 0x80]);
        assert_eq!(uint(0x2E57), [0xAE, 0x57]);
        assert_eq!(uint(0x3FFF), [0xBF, 0xFF]);
        assert_eq!(uint(0x4000), [0xC0, 0x00, 0x40, 0x00]);
        assert_eq!(uint(0x1FFF_FFFF), [0xDF, 0xFF, 0xFF, 0xFF]);

        let mut buffer = Vec::new();
        assert!(write_compressed_uint(0x2000_0000, &mut buffer).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn compressed_int_ecma_values() {
        assert_eq!(int(3), [0x06]);
        assert_eq!(int(-3), [0x7B]);
        assert_eq!(int(64), [0x80, 0x80]);
        assert_eq!(int(-64), [0x01]);
        assert_eq!(int(8192), [0xC0, 0x00, 0x40, 0x00]);
        assert_eq!(int(-8192), [0x80, 0x01]);
        assert_eq!(int(268_435_455), [0xDF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(int(-268_435_456), [0xC0, 0x00, 0x00, 0x01]);

        let mut buffer = Vec::new();
        assert!(write_compressed_int(i32::MAX, &mut buffer).is_err());
        assert!(write_compressed_int(i32::MIN, &mut buffer).is_err());
    }

    #[test]
    fn compressed_int_boundaries_decode() {
        for value in [0, 1, -1, 63, -63, 64, -65, 4095, -4096, 8191, -8193, 1 << 20, -(1 << 20)] {
            let encoded = int(value);
            let mut parser = Parser::new(&encoded);
            assert_eq!(parser.read_compressed_int().unwrap(), value, "value {value}");
            assert!(!parser.has_more_data());
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(compressed_uint_size(0x7F), 1);
        assert_eq!(compressed_uint_size(0x80), 2);
        assert_eq!(compressed_uint_size(0x4000), 4);
        assert_eq!(align_to_4(5), 8);
        assert_eq!(align_to_4(8), 8);

        let mut buffer = vec![1, 2, 3, 4, 5];
        pad_to_4(&mut buffer);
        assert_eq!(buffer, [1, 2, 3, 4, 5, 0, 0, 0]);
    }
}
