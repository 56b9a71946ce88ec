//! String Heap (`#Strings`)
//!
//! Identifier strings in UTF-8, NUL terminated. Index 0 is always the empty string. The PDB uses
//! it for local variable and constant names only; paths and namespaces go to `#Blob`.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{ffi::CStr, str};

use rustc_hash::FxHashMap;

use crate::{utils::pad_to_4, Error::OutOfBounds, Result};

/// Read-only view of a `#Strings` heap
///
/// # Examples
///
/// ```rust
/// use dotpdb::metadata::streams::Strings;
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = Strings::from(data).unwrap();
/// assert_eq!(strings.get(1).unwrap(), "Hello");
/// ```
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the empty string.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #String heap is empty"));
        }

        Ok(Strings { data })
    }

    /// Get the string starting at `index`
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the string is not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }
}

/// Interning writer for a `#Strings` heap
#[derive(Debug)]
pub struct StringsBuilder {
    data: Vec<u8>,
    lookup: FxHashMap<String, u32>,
}

impl Default for StringsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StringsBuilder {
    /// Create a heap holding only the empty string
    #[must_use]
    pub fn new() -> Self {
        StringsBuilder {
            data: vec![0],
            lookup: FxHashMap::default(),
        }
    }

    /// Add a string and return its index; identical strings share one entry
    ///
    /// # Errors
    /// Returns an error if the string contains a NUL byte or the heap outgrows 32-bit indices.
    pub fn add(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }
        if let Some(index) = self.lookup.get(value) {
            return Ok(*index);
        }
        if value.as_bytes().contains(&0) {
            return Err(malformed_error!("String contains a NUL byte - {:?}", value));
        }

        let Ok(index) = u32::try_from(self.data.len()) else {
            return Err(malformed_error!("#Strings heap exceeds 4GB"));
        };
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self.lookup.insert(value.to_string(), index);
        Ok(index)
    }

    /// Current size of the heap, unpadded
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if only the empty string is present
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = [
            0x00,
            0x3c, 0x4d, 0x61, 0x69, 0x6e, 0x3e, 0x24, 0x00,
            0x43, 0x5f, 0x53, 0x68, 0x61, 0x72, 0x70, 0x00,
        ];

        let str_view = Strings::from(&data).unwrap();
        assert_eq!(str_view.get(1).unwrap(), "<Main>$");
        assert_eq!(str_view.get(9).unwrap(), "C_Sharp");
        assert_eq!(str_view.get(0).unwrap(), "");
        assert!(str_view.get(data.len()).is_err());
    }

    #[test]
    fn builder_interns() {
        let mut builder = StringsBuilder::new();
        assert_eq!(builder.add("").unwrap(), 0);
        let first = builder.add("counter").unwrap();
        let second = builder.add("total").unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 9);
        assert_eq!(builder.add("counter").unwrap(), first);
        assert!(builder.add("a\0b").is_err());

        let bytes = builder.into_bytes();
        assert_eq!(bytes.len() % 4, 0);

        let heap = Strings::from(&bytes).unwrap();
        assert_eq!(heap.get(first as usize).unwrap(), "counter");
        assert_eq!(heap.get(second as usize).unwrap(), "total");
    }
}
