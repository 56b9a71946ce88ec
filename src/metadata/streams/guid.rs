//! GUID Heap (`#GUID`)
//!
//! A sequence of 16-byte GUIDs addressed by 1-based index. The PDB stores the hash algorithm and
//! language of every document, and the kind of every custom debug information record here.
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use rustc_hash::FxHashMap;

use crate::{Error::OutOfBounds, Result};

/// Read-only view of a `#GUID` heap
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Create a `Guid` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns an error if the length is not a multiple of 16.
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!(
                "#GUID heap size {} is not a multiple of 16",
                data.len()
            ));
        }

        Ok(Guid { data })
    }

    /// Number of GUIDs in the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / 16
    }

    /// True if the heap holds no GUIDs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the GUID at the 1-based `index`; index 0 is the nil GUID
    ///
    /// # Errors
    /// Returns an error if the index is past the end of the heap.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Ok(uguid::Guid::ZERO);
        }
        if index > self.len() {
            return Err(OutOfBounds);
        }

        let offset_start = (index - 1) * 16;
        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(&self.data[offset_start..offset_start + 16]);

        Ok(uguid::Guid::from_bytes(buffer))
    }
}

/// Deduplicating writer for a `#GUID` heap
#[derive(Debug, Default)]
pub struct GuidBuilder {
    data: Vec<u8>,
    lookup: FxHashMap<[u8; 16], u32>,
}

impl GuidBuilder {
    /// Create an empty heap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a GUID and return its 1-based index; the nil GUID is 0
    ///
    /// # Errors
    /// Returns an error if the heap outgrows 32-bit indices.
    pub fn add(&mut self, guid: uguid::Guid) -> Result<u32> {
        if guid == uguid::Guid::ZERO {
            return Ok(0);
        }

        let bytes = guid.to_bytes();
        if let Some(index) = self.lookup.get(&bytes) {
            return Ok(*index);
        }

        let Ok(index) = u32::try_from(self.data.len() / 16 + 1) else {
            return Err(malformed_error!("#GUID heap exceeds 32-bit indices"));
        };
        self.data.extend_from_slice(&bytes);
        self.lookup.insert(bytes, index);
        Ok(index)
    }

    /// Current size of the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no GUID was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Finish the heap
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data : [u8; 48] = [
            0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe, 0xa5,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let guids = Guid::from(&data).unwrap();

        assert_eq!(
            guids.get(1).unwrap(),
            uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5")
        );
        assert_eq!(
            guids.get(2).unwrap(),
            uguid::guid!("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA")
        );
        assert_eq!(guids.get(3).unwrap(), uguid::Guid::ZERO);
        assert!(guids.get(4).is_err());
        assert!(Guid::from(&data[..20]).is_err());
    }

    #[test]
    fn builder_dedups() {
        let csharp = uguid::guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");
        let sha256 = uguid::guid!("8829d00f-11b8-4213-878b-770e8597ac16");

        let mut builder = GuidBuilder::new();
        assert_eq!(builder.add(uguid::Guid::ZERO).unwrap(), 0);
        assert_eq!(builder.add(sha256).unwrap(), 1);
        assert_eq!(builder.add(csharp).unwrap(), 2);
        assert_eq!(builder.add(sha256).unwrap(), 1);

        let bytes = builder.into_bytes();
        let heap = Guid::from(&bytes).unwrap();
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.get(2).unwrap(), csharp);
    }
}
