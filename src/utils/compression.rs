//! Raw deflate (RFC 1951) used for embedded source blobs.

use std::io::{Read, Write};

use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};

use crate::Result;

/// Compress `data` into a raw deflate stream, without zlib or gzip framing.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the encoder fails.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a raw deflate stream.
///
/// `expected_size` is the uncompressed length recorded next to the payload; the output is
/// verified against it.
///
/// # Errors
/// Returns an error if the stream is corrupt or does not inflate to `expected_size` bytes.
pub fn inflate(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut output = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut output)
        .map_err(|error| malformed_error!("Deflate stream is corrupt - {}", error))?;

    if output.len() != expected_size {
        return Err(malformed_error!(
            "Deflate stream inflated to {} bytes, expected {}",
            output.len(),
            expected_size
        ));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_inflate() {
        let source = "namespace Demo\n{\n    public class Foo { }\n}\n".repeat(16);
        let compressed = deflate(source.as_bytes()).unwrap();
        assert!(compressed.len() < source.len());

        let restored = inflate(&compressed, source.len()).unwrap();
        assert_eq!(restored, source.as_bytes());
    }

    #[test]
    fn inflate_size_mismatch() {
        let compressed = deflate(b"abc").unwrap();
        assert!(inflate(&compressed, 4).is_err());
        assert!(inflate(&[0xFF, 0xFF, 0xFF], 3).is_err());
    }
}
