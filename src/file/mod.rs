//! PE file access.
//!
//! [`File`] wraps a PE image, memory mapped from disk or held in memory, together with its goblin
//! parse. It answers the questions PDB generation asks of the container: where the CLI header
//! and metadata live, how RVAs map to file offsets, and which debug directory entries exist.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotpdb::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("Program.dll"))?;
//! let (clr_rva, clr_size) = file.clr()?;
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! let clr_header = file.data_slice(clr_offset, clr_size)?;
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! # References
//!
//! - Microsoft PE/COFF Specification
//! - ECMA-335 6th Edition, Partition II - PE File Format

pub mod io;
pub mod parser;

mod debug;
mod memory;
mod physical;

use std::path::Path;

use goblin::pe::{
    data_directories::DataDirectoryType, header::Header, section_table::SectionTable, PE,
};
use ouroboros::self_referencing;

use crate::{
    Error::{Empty, GoblinErr},
    Result,
};
use memory::Memory;
use physical::Physical;

pub use debug::{CodeViewInfo, DebugDirectoryEntry, IMAGE_DEBUG_TYPE_CODEVIEW};

/// Source of the raw bytes of a PE image
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is outside the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the full data
    fn data(&self) -> &[u8];

    /// Returns the length of the data
    fn len(&self) -> usize;
}

/// A loaded PE image with its parsed headers
#[self_referencing]
pub struct File {
    data: Box<dyn Backend>,
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Memory map and parse a PE file from disk
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, is not a PE image, or has no CLI header.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Parse a PE image held in memory
    ///
    /// # Errors
    /// Returns an error if the data is not a PE image or has no CLI header.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| {
            let data = data.as_ref();
            match PE::parse(data.data()) {
                Ok(pe) => match pe.header.optional_header {
                    Some(optional_header) => {
                        if optional_header
                            .data_directories
                            .get_clr_runtime_header()
                            .is_none()
                        {
                            Err(malformed_error!(
                                "File does not have a CLR runtime header directory"
                            ))
                        } else {
                            Ok(pe)
                        }
                    }
                    None => Err(malformed_error!("File does not have an OptionalHeader")),
                },
                Err(error) => Err(GoblinErr(error)),
            }
        })
    }

    /// Size of the image in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// True if the image holds no data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The COFF and optional headers
    #[must_use]
    pub fn header(&self) -> &Header {
        self.with_pe(|pe| &pe.header)
    }

    /// Whether this is a PE32+ image
    #[must_use]
    pub fn is_64bit(&self) -> bool {
        self.with_pe(|pe| pe.is_64)
    }

    /// RVA and size of the CLI header
    ///
    /// # Errors
    /// Returns an error if the CLR runtime header directory is missing.
    pub fn clr(&self) -> Result<(usize, usize)> {
        match self.get_data_directory(DataDirectoryType::ClrRuntimeHeader) {
            Some((rva, size)) => Ok((rva as usize, size as usize)),
            None => Err(malformed_error!(
                "File does not have a CLR runtime header directory"
            )),
        }
    }

    /// The section table
    pub fn sections(&self) -> impl Iterator<Item = &SectionTable> {
        self.with_pe(|pe| pe.sections.iter())
    }

    /// RVA and size of a data directory, if present and non-empty
    #[must_use]
    pub fn get_data_directory(&self, dir_type: DataDirectoryType) -> Option<(u32, u32)> {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .as_ref()?
                .data_directories
                .dirs()
                .find(|(directory_type, directory)| {
                    *directory_type == dir_type
                        && directory.virtual_address != 0
                        && directory.size != 0
                })
                .map(|(_, directory)| (directory.virtual_address, directory.size))
        })
    }

    /// The whole image
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.with_data(|data| data.data())
    }

    /// A bounds-checked slice of the image
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is outside the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.with_data(|data| data.data_slice(offset, len))
    }

    /// Translate a relative virtual address into a file offset
    ///
    /// # Errors
    /// Returns an error if no section contains the address.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        for section in self.sections() {
            let Some(section_max) = section.virtual_address.checked_add(section.virtual_size)
            else {
                return Err(malformed_error!(
                    "Section malformed, causing integer overflow - {} + {}",
                    section.virtual_address,
                    section.virtual_size
                ));
            };

            if (section.virtual_address as usize) <= rva && rva < section_max as usize {
                return Ok(rva - section.virtual_address as usize
                    + section.pointer_to_raw_data as usize);
            }
        }

        Err(malformed_error!(
            "RVA could not be converted to offset - {}",
            rva
        ))
    }

    /// Translate a file offset into a relative virtual address
    ///
    /// # Errors
    /// Returns an error if no section contains the offset.
    pub fn offset_to_rva(&self, offset: usize) -> Result<usize> {
        for section in self.sections() {
            let start = section.pointer_to_raw_data as usize;
            let end = start + section.size_of_raw_data as usize;
            if start <= offset && offset < end {
                return Ok(offset - start + section.virtual_address as usize);
            }
        }

        Err(malformed_error!(
            "Offset could not be converted to RVA - {}",
            offset
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::root::Root,
        test::{MetadataImageBuilder, PeImageBuilder},
    };

    #[test]
    fn load_crafted_image() {
        let metadata = MetadataImageBuilder::new()
            .type_def("App", "Program", &[])
            .build();
        let image = PeImageBuilder::new().metadata(metadata.clone()).build();
        let file = File::from_mem(image).unwrap();

        assert!(!file.is_64bit());
        assert_eq!(file.sections().count(), 1);

        let (clr_rva, clr_size) = file.clr().unwrap();
        assert_eq!(clr_rva, PeImageBuilder::TEXT_RVA as usize);
        assert_eq!(clr_size, 72);

        let offset = file.rva_to_offset(clr_rva).unwrap();
        assert_eq!(offset, PeImageBuilder::TEXT_OFFSET as usize);
        assert_eq!(file.offset_to_rva(offset).unwrap(), clr_rva);
        assert_eq!(file.data_slice(offset, 4).unwrap(), &[72, 0, 0, 0]);

        let header = file.data_slice(offset + 8, 8).unwrap();
        let metadata_rva = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let metadata_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(metadata_size as usize, metadata.len());
        let metadata_offset = file.rva_to_offset(metadata_rva as usize).unwrap();
        let loaded = file.data_slice(metadata_offset, metadata.len()).unwrap();
        assert_eq!(loaded, metadata.as_slice());
        assert!(Root::read(loaded).is_ok());

        assert!(file.rva_to_offset(0x10).is_err());
        assert!(file.data_slice(file.len(), 1).is_err());
    }

    #[test]
    fn rejects_non_pe() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Empty)));
        assert!(File::from_mem(vec![0x4D, 0x5A, 0x00, 0x00]).is_err());
    }

    #[test]
    fn rejects_native_image() {
        let image = PeImageBuilder::new().without_clr().build();
        assert!(File::from_mem(image).is_err());
    }
}
