//! Stream headers of the metadata root (ECMA-335 II.24.2.2).

use crate::{
    file::io::read_le,
    utils::{align_to_4, pad_to_4},
    Error::OutOfBounds,
    Result,
};

/// Stream names a Portable PDB or an assembly may carry
pub const VALID_STREAM_NAMES: [&str; 7] =
    ["#Pdb", "#~", "#-", "#Strings", "#US", "#GUID", "#Blob"];

/// A stream header: where a named stream lives relative to the metadata root
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes, a multiple of 4
    pub size: u32,
    /// Name of the stream
    pub name: String,
}

impl StreamHeader {
    /// Parse a stream header from the start of `data`
    ///
    /// ## Arguments
    /// * 'data' - The bytes starting at the stream header
    ///
    /// # Errors
    /// Returns an error if the data is too short or the name is not a known stream.
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let mut name = String::with_capacity(32);
        let mut terminated = false;
        for counter in 0..std::cmp::min(32, data.len() - 8) {
            let name_char = read_le::<u8>(&data[8 + counter..])?;
            if name_char == 0 {
                terminated = true;
                break;
            }

            name.push(char::from(name_char));
        }

        if !terminated {
            return Err(malformed_error!("Unterminated stream header name - {}", name));
        }

        if !VALID_STREAM_NAMES.iter().any(|valid_name| name == *valid_name) {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
        })
    }

    /// Number of bytes this header occupies, name terminator and padding included
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        8 + align_to_4(self.name.len() + 1)
    }

    /// Append the encoded header to `out`
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.push(0);
        pad_to_4(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00,
        ];

        let parsed_header = StreamHeader::from(&header_bytes).unwrap();

        assert_eq!(parsed_header.offset, 0x6C);
        assert_eq!(parsed_header.size, 0x45A4);
        assert_eq!(parsed_header.name, "#~");
    }

    #[test]
    fn crafted_invalid() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x24, 0x7E, 0x00,
        ];

        assert!(StreamHeader::from(&header_bytes).is_err());
    }

    #[test]
    fn write_pads_name() {
        let header = StreamHeader {
            offset: 0x80,
            size: 0x10,
            name: "#Pdb".to_string(),
        };

        let mut out = Vec::new();
        header.write(&mut out);
        assert_eq!(out.len(), header.encoded_size());
        assert_eq!(
            out,
            [0x80, 0, 0, 0, 0x10, 0, 0, 0, b'#', b'P', b'd', b'b', 0, 0, 0, 0]
        );

        let parsed = StreamHeader::from(&out).unwrap();
        assert_eq!(parsed, header);
    }
}
