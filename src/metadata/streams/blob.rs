//! Blob Heap (`#Blob`)
//!
//! Length-prefixed byte sequences. In a Portable PDB it carries document names and path parts,
//! hashes, sequence points, import lists and every custom debug information payload.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use rustc_hash::FxHashMap;

use crate::{
    file::parser::Parser,
    utils::{pad_to_4, write_compressed_uint},
    Error::OutOfBounds,
    Result,
};

/// Read-only view of a `#Blob` heap
///
/// Each entry is prefixed with its length as a compressed unsigned integer:
///
/// * `0bbbbbbb` - 7 bit length
/// * `10bbbbbb x` - 14 bit length
/// * `110bbbbb x y z` - 29 bit length
///
/// # Examples
///
/// ```rust
/// use dotpdb::metadata::streams::Blob;
/// let data = &[0u8, 0x03, 0x41, 0x42, 0x43];
/// let blob = Blob::from(data).unwrap();
/// assert_eq!(blob.get(1).unwrap(), &[0x41, 0x42, 0x43]);
/// ```
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns an error if the data is empty or does not start with the empty blob.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob starting at `index`, without its length prefix
    ///
    /// # Errors
    /// Returns an error if the index or the encoded length points past the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        let skip = parser.pos();

        let Some(data_start) = index.checked_add(skip) else {
            return Err(OutOfBounds);
        };

        let Some(data_end) = data_start.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if data_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[data_start..data_end])
    }

    /// Iterate all blobs as `(offset, bytes)`, skipping the empty blob at 0
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'_> {
        BlobIterator {
            blob: self,
            position: 1,
        }
    }
}

impl<'a> IntoIterator for &'a Blob<'a> {
    type Item = Result<(usize, &'a [u8])>;
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over entries in the `#Blob` heap
pub struct BlobIterator<'a> {
    blob: &'a Blob<'a>,
    position: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.blob.data.len() {
            return None;
        }

        // Trailing alignment padding reads as a run of empty blobs
        if self.blob.data[self.position..].iter().all(|byte| *byte == 0) {
            self.position = self.blob.data.len();
            return None;
        }

        let start_position = self.position;
        let mut parser = Parser::new(&self.blob.data[self.position..]);
        let length = match parser.read_compressed_uint() {
            Ok(length) => length as usize,
            Err(error) => {
                self.position = self.blob.data.len();
                return Some(Err(error));
            }
        };

        match self.blob.get(start_position) {
            Ok(blob_data) => {
                self.position += parser.pos() + length;
                Some(Ok((start_position, blob_data)))
            }
            Err(error) => {
                self.position = self.blob.data.len();
                Some(Err(error))
            }
        }
    }
}

/// Interning writer for a `#Blob` heap
#[derive(Debug)]
pub struct BlobBuilder {
    data: Vec<u8>,
    lookup: FxHashMap<Vec<u8>, u32>,
}

impl Default for BlobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobBuilder {
    /// Create a heap holding only the empty blob
    #[must_use]
    pub fn new() -> Self {
        BlobBuilder {
            data: vec![0],
            lookup: FxHashMap::default(),
        }
    }

    /// Add a blob and return its index; identical blobs share one entry, the empty blob is 0
    ///
    /// # Errors
    /// Returns an error if the blob is too long for a compressed length or the heap outgrows
    /// 32-bit indices.
    pub fn add(&mut self, value: &[u8]) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }
        if let Some(index) = self.lookup.get(value) {
            return Ok(*index);
        }

        let Ok(index) = u32::try_from(self.data.len()) else {
            return Err(malformed_error!("#Blob heap exceeds 4GB"));
        };
        let Ok(length) = u32::try_from(value.len()) else {
            return Err(malformed_error!("Blob of {} bytes is too large", value.len()));
        };

        write_compressed_uint(length, &mut self.data)?;
        self.data.extend_from_slice(value);
        self.lookup.insert(value.to_vec(), index);
        Ok(index)
    }

    /// Current size of the heap, unpadded
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if only the empty blob is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    }

    /// Finish the heap, padded to a multiple of 4
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        let mut data = self.data;
        pad_to_4(&mut data);
        data
    }
}
