//! The identity shared by an assembly and its PDB.
//!
//! A debugger only loads a PDB whose `#Pdb` id matches the CodeView entry of the assembly: the
//! 16 byte GUID must equal the RSDS GUID and the 4 byte stamp the debug directory time stamp.
//! When the assembly has no CodeView entry, an id is minted from the content of the container so
//! that identical input yields an identical file.

use std::fmt;

use serde::{Serialize, Serializer};
use uguid::Guid;

use crate::{
    file::{io::read_le, CodeViewInfo},
    utils::compute_sha256,
    Error::OutOfBounds,
    Result,
};

/// Size of the id as stored in the `#Pdb` stream
pub const CONTENT_ID_SIZE: usize = 20;

/// GUID and stamp identifying a PDB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentId {
    /// PDB GUID
    pub guid: Guid,
    /// Time stamp
    pub stamp: u32,
}

impl Default for ContentId {
    fn default() -> Self {
        ContentId {
            guid: Guid::ZERO,
            stamp: 0,
        }
    }
}

impl ContentId {
    /// Create an id from its parts
    #[must_use]
    pub fn new(guid: Guid, stamp: u32) -> Self {
        ContentId { guid, stamp }
    }

    /// Reuse the identity recorded in the assembly's CodeView entry
    #[must_use]
    pub fn from_codeview(codeview: &CodeViewInfo) -> Self {
        ContentId {
            guid: codeview.guid,
            stamp: codeview.time_date_stamp,
        }
    }

    /// Mint an id from a container serialized with a zero id
    ///
    /// The GUID is the first 16 bytes of the SHA-256 with the RFC 4122 version (4) and variant
    /// bits set; the stamp is the next 4 bytes, little-endian, with the high bit set.
    #[must_use]
    pub fn from_content(container: &[u8]) -> Self {
        let hash = compute_sha256(container);

        let mut guid = [0u8; 16];
        guid.copy_from_slice(&hash[..16]);
        guid[7] = (guid[7] & 0x0F) | 0x40;
        guid[8] = (guid[8] & 0x3F) | 0x80;

        let stamp = u32::from_le_bytes([hash[16], hash[17], hash[18], hash[19]]) | 0x8000_0000;

        ContentId {
            guid: Guid::from_bytes(guid),
            stamp,
        }
    }

    /// Decode the 20 byte `PdbId`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 20 bytes are given.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < CONTENT_ID_SIZE {
            return Err(OutOfBounds);
        }

        let mut guid = [0u8; 16];
        guid.copy_from_slice(&data[..16]);
        Ok(ContentId {
            guid: Guid::from_bytes(guid),
            stamp: read_le::<u32>(&data[16..])?,
        })
    }

    /// The 20 byte `PdbId`
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CONTENT_ID_SIZE] {
        let mut bytes = [0u8; CONTENT_ID_SIZE];
        bytes[..16].copy_from_slice(&self.guid.to_bytes());
        bytes[16..].copy_from_slice(&self.stamp.to_le_bytes());
        bytes
    }

    /// True for the all-zero placeholder id
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.guid == Guid::ZERO && self.stamp == 0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:08x}", self.guid, self.stamp)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codeview() {
        let codeview = CodeViewInfo {
            guid: uguid::guid!("01234567-89ab-cdef-0123-456789abcdef"),
            age: 1,
            path: "App.pdb".to_string(),
            time_date_stamp: 0xAABB_CCDD,
        };

        let id = ContentId::from_codeview(&codeview);
        let bytes = id.to_bytes();
        assert_eq!(&bytes[..4], &[0x67, 0x45, 0x23, 0x01]);
        assert_eq!(&bytes[16..], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(ContentId::from_bytes(&bytes).unwrap(), id);
        assert_eq!(
            id.to_string(),
            "01234567-89ab-cdef-0123-456789abcdef-aabbccdd"
        );
    }

    #[test]
    fn minted() {
        let a = ContentId::from_content(b"container");
        let b = ContentId::from_content(b"container");
        let c = ContentId::from_content(b"container2");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let bytes = a.to_bytes();
        assert_eq!(bytes[7] & 0xF0, 0x40);
        assert_eq!(bytes[8] & 0xC0, 0x80);
        assert!(a.stamp & 0x8000_0000 != 0);
        assert!(!a.is_zero());
        assert!(ContentId::default().is_zero());
    }

    #[test]
    fn short() {
        assert!(ContentId::from_bytes(&[0; 19]).is_err());
    }
}
