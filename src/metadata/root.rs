//! The metadata root (ECMA-335 II.24.2.1).
//!
//! Both an assembly's metadata and a standalone Portable PDB start with this header: a magic
//! signature, a version string, and the directory of streams that follow.

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::{StreamHeader, VALID_STREAM_NAMES},
    utils::{align_to_4, pad_to_4},
    Error::OutOfBounds,
    Result,
};

/// The magic signature of the metadata root, 'BSJB'
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Version string written into Portable PDB metadata roots
pub const PDB_VERSION_STRING: &str = "PDB v1.0";

/// The metadata root header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Magic signature, always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1
    pub major_version: u16,
    /// Minor version, 1
    pub minor_version: u16,
    /// Reserved, 0
    pub reserved: u32,
    /// Length of the version field including padding
    pub length: u32,
    /// The version string, without padding
    pub version: String,
    /// Reserved, 0
    pub flags: u16,
    /// Number of streams
    pub stream_number: u16,
    /// The stream directory
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Parse the metadata root from the start of `data`
    ///
    /// ## Arguments
    /// * 'data' - The whole metadata, stream offsets are relative to its start
    ///
    /// # Errors
    /// Returns an error if the signature is wrong or any stream lies outside `data`.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 36 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {}",
                signature
            ));
        }

        let length = read_le_at::<u32>(data, &mut 12)?;
        let Some(version_end) = (length as usize).checked_add(16) else {
            return Err(malformed_error!(
                "Version string length causing integer overflow - {}",
                length
            ));
        };
        if version_end + 4 > data.len() {
            return Err(OutOfBounds);
        }

        let version_bytes = &data[16..version_end];
        let version_len = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();

        let flags = read_le::<u16>(&data[version_end..])?;
        let stream_count = read_le::<u16>(&data[version_end + 2..])?;
        if stream_count == 0
            || usize::from(stream_count) > VALID_STREAM_NAMES.len()
            || usize::from(stream_count) * 9 > data.len()
        {
            return Err(malformed_error!("Invalid stream count - {}", stream_count));
        }

        let mut streams: Vec<StreamHeader> = Vec::with_capacity(usize::from(stream_count));
        let mut stream_offset = version_end + 4;
        for _ in 0..stream_count {
            if stream_offset > data.len() {
                return Err(OutOfBounds);
            }

            let new_stream = StreamHeader::from(&data[stream_offset..])?;
            match u32::checked_add(new_stream.offset, new_stream.size) {
                Some(range) => {
                    if range as usize > data.len() {
                        return Err(OutOfBounds);
                    }
                }
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        new_stream.offset,
                        new_stream.size
                    ))
                }
            }

            if streams.iter().any(|stream| stream.name == new_stream.name) {
                return Err(malformed_error!("Duplicate stream - {}", new_stream.name));
            }

            stream_offset += new_stream.encoded_size();
            streams.push(new_stream);
        }

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            reserved: read_le::<u32>(&data[8..])?,
            length,
            version,
            flags,
            stream_number: stream_count,
            stream_headers: streams,
        })
    }

    /// Header of the stream called `name`
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|stream| stream.name == name)
    }

    /// Bytes of the stream called `name`, sliced out of the metadata it was read from
    #[must_use]
    pub fn stream_data<'a>(&self, data: &'a [u8], name: &str) -> Option<&'a [u8]> {
        let stream = self.stream(name)?;
        let start = stream.offset as usize;
        data.get(start..start + stream.size as usize)
    }

    /// Lay out a metadata root followed by the given streams
    ///
    /// Streams are placed in the given order, each padded to 4 bytes, right after the stream
    /// directory.
    ///
    /// ## Arguments
    /// * 'version' - The version string, e.g. [`PDB_VERSION_STRING`]
    /// * 'streams' - `(name, bytes)` of every stream
    ///
    /// # Errors
    /// Returns an error if the result would exceed 32-bit offsets.
    pub fn write_with_streams(version: &str, streams: &[(&str, &[u8])]) -> Result<Vec<u8>> {
        let version_length = align_to_4(version.len() + 1);

        let mut headers = Vec::with_capacity(streams.len());
        let directory_size: usize = streams
            .iter()
            .map(|(name, _)| 8 + align_to_4(name.len() + 1))
            .sum();
        let mut offset = 16 + version_length + 4 + directory_size;
        for (name, bytes) in streams {
            let size = align_to_4(bytes.len());
            let (Ok(stream_offset), Ok(stream_size)) = (u32::try_from(offset), u32::try_from(size))
            else {
                return Err(malformed_error!("Metadata exceeds 4GB"));
            };

            headers.push(StreamHeader {
                offset: stream_offset,
                size: stream_size,
                name: (*name).to_string(),
            });
            offset += size;
        }

        let Ok(stream_count) = u16::try_from(streams.len()) else {
            return Err(malformed_error!("Too many streams - {}", streams.len()));
        };
        let Ok(length) = u32::try_from(version_length) else {
            return Err(malformed_error!("Version string too long"));
        };

        let mut out = Vec::with_capacity(offset);
        out.extend_from_slice(&CIL_HEADER_MAGIC.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(version.as_bytes());
        out.resize(16 + version_length, 0);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&stream_count.to_le_bytes());
        for header in &headers {
            header.write(&mut out);
        }
        for (_, bytes) in streams {
            out.extend_from_slice(bytes);
            pad_to_4(&mut out);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x42, 0x53, 0x4A, 0x42,
            0x01, 0x00,
            0x01, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            b'v', b'4', b'.', b'0', 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0x01, 0x00,

            0x28, 0x00, 0x00, 0x00, // StreamHeader
            0x04, 0x00, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,

            0xAA, 0xBB, 0xCC, 0xDD,
        ];

        let parsed_header = Root::read(&header_bytes).unwrap();

        assert_eq!(parsed_header.signature, CIL_HEADER_MAGIC);
        assert_eq!(parsed_header.major_version, 1);
        assert_eq!(parsed_header.length, 8);
        assert_eq!(parsed_header.version, "v4.0");
        assert_eq!(parsed_header.stream_number, 1);
        assert_eq!(
            parsed_header.stream_data(&header_bytes, "#~").unwrap(),
            &[0xAA, 0xBB, 0xCC, 0xDD]
        );
        assert!(parsed_header.stream("#Blob").is_none());
    }

    #[test]
    fn written_root_layout() {
        let blob = [0u8, 3, 1, 2, 3];
        let guid = [0x11u8; 16];
        let data =
            Root::write_with_streams(PDB_VERSION_STRING, &[("#Blob", &blob), ("#GUID", &guid)])
                .unwrap();

        assert_eq!(&data[0..4], &[0x42, 0x53, 0x4A, 0x42]);
        assert_eq!(read_le::<u32>(&data[12..]).unwrap(), 12);
        assert_eq!(&data[16..28], b"PDB v1.0\0\0\0\0");
        assert_eq!(data.len() % 4, 0);

        let root = Root::read(&data).unwrap();
        assert_eq!(root.version, PDB_VERSION_STRING);
        assert_eq!(root.minor_version, 1);
        assert_eq!(root.stream_number, 2);

        let blob_header = root.stream("#Blob").unwrap();
        assert_eq!(blob_header.size, 8);
        assert_eq!(blob_header.offset % 4, 0);
        assert_eq!(
            &root.stream_data(&data, "#Blob").unwrap()[..5],
            &[0, 3, 1, 2, 3]
        );
        assert_eq!(root.stream_data(&data, "#GUID").unwrap(), &guid);
    }

    #[test]
    fn bad_magic() {
        let mut data = Root::write_with_streams("v4.0", &[("#~", &[0; 4])]).unwrap();
        data[0] = 0;
        assert!(Root::read(&data).is_err());
    }
}
