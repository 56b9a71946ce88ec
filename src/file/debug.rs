//! Debug directory entries of the PE image.
//!
//! The CodeView (`RSDS`) entry carries the GUID and age a debugger matches against a PDB, and its
//! directory entry carries the time stamp. A PDB generated for an existing assembly has to reuse
//! both, or the debugger will refuse to load it.

use uguid::Guid;

use crate::{
    file::{io::read_le_at, File},
    Result,
};

/// `IMAGE_DEBUG_TYPE_CODEVIEW`
pub const IMAGE_DEBUG_TYPE_CODEVIEW: u32 = 2;

/// Size of one `IMAGE_DEBUG_DIRECTORY` record
const DEBUG_DIRECTORY_ENTRY_SIZE: usize = 28;

/// Signature of a PDB 7.0 CodeView record, 'RSDS'
const CODEVIEW_RSDS_SIGNATURE: u32 = 0x5344_5352;

/// One `IMAGE_DEBUG_DIRECTORY` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugDirectoryEntry {
    /// Reserved, 0
    pub characteristics: u32,
    /// Time stamp, part of the PDB identity
    pub time_date_stamp: u32,
    /// Major version; `0x0100` plus a Portable PDB version for portable CodeView entries
    pub major_version: u16,
    /// Minor version; `0x504D` marks a Portable PDB
    pub minor_version: u16,
    /// Kind of debug data
    pub debug_type: u32,
    /// Size of the debug data
    pub size_of_data: u32,
    /// RVA of the debug data
    pub address_of_raw_data: u32,
    /// File offset of the debug data
    pub pointer_to_raw_data: u32,
}

/// The identity a CodeView entry assigns to the matching PDB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeViewInfo {
    /// PDB GUID
    pub guid: Guid,
    /// PDB age
    pub age: u32,
    /// Path of the PDB at build time
    pub path: String,
    /// Time stamp of the debug directory entry
    pub time_date_stamp: u32,
}

impl DebugDirectoryEntry {
    fn read(data: &[u8], offset: &mut usize) -> Result<Self> {
        Ok(DebugDirectoryEntry {
            characteristics: read_le_at::<u32>(data, offset)?,
            time_date_stamp: read_le_at::<u32>(data, offset)?,
            major_version: read_le_at::<u16>(data, offset)?,
            minor_version: read_le_at::<u16>(data, offset)?,
            debug_type: read_le_at::<u32>(data, offset)?,
            size_of_data: read_le_at::<u32>(data, offset)?,
            address_of_raw_data: read_le_at::<u32>(data, offset)?,
            pointer_to_raw_data: read_le_at::<u32>(data, offset)?,
        })
    }
}

impl File {
    /// All records of the debug directory, empty if the image has none
    ///
    /// # Errors
    /// Returns an error if the directory points outside the image.
    pub fn debug_directory(&self) -> Result<Vec<DebugDirectoryEntry>> {
        let directory = self.with_pe(|pe| {
            pe.header.optional_header.as_ref().and_then(|optional_header| {
                optional_header
                    .data_directories
                    .get_debug_table()
                    .as_ref()
                    .map(|directory| (directory.virtual_address, directory.size))
            })
        });
        let Some((rva, size)) = directory.filter(|(rva, size)| *rva != 0 && *size != 0) else {
            return Ok(Vec::new());
        };

        let offset = self.rva_to_offset(rva as usize)?;
        let data = self.data_slice(offset, size as usize)?;

        let count = data.len() / DEBUG_DIRECTORY_ENTRY_SIZE;
        let mut entries = Vec::with_capacity(count);
        let mut cursor = 0;
        for _ in 0..count {
            entries.push(DebugDirectoryEntry::read(data, &mut cursor)?);
        }

        Ok(entries)
    }

    /// The first PDB 7.0 CodeView record, if any
    ///
    /// # Errors
    /// Returns an error if the debug directory or the CodeView record is truncated.
    pub fn codeview(&self) -> Result<Option<CodeViewInfo>> {
        for entry in self.debug_directory()? {
            if entry.debug_type != IMAGE_DEBUG_TYPE_CODEVIEW || entry.size_of_data < 24 {
                continue;
            }

            let offset = if entry.pointer_to_raw_data != 0 {
                entry.pointer_to_raw_data as usize
            } else {
                self.rva_to_offset(entry.address_of_raw_data as usize)?
            };
            let data = self.data_slice(offset, entry.size_of_data as usize)?;

            let mut cursor = 0;
            if read_le_at::<u32>(data, &mut cursor)? != CODEVIEW_RSDS_SIGNATURE {
                continue;
            }

            let mut guid = [0u8; 16];
            guid.copy_from_slice(&data[4..20]);
            cursor = 20;
            let age = read_le_at::<u32>(data, &mut cursor)?;

            let path_bytes = &data[24..];
            let path_len = path_bytes
                .iter()
                .position(|byte| *byte == 0)
                .unwrap_or(path_bytes.len());

            return Ok(Some(CodeViewInfo {
                guid: Guid::from_bytes(guid),
                age,
                path: String::from_utf8_lossy(&path_bytes[..path_len]).into_owned(),
                time_date_stamp: entry.time_date_stamp,
            }));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::PeImageBuilder;

    #[test]
    fn codeview_entry() {
        let guid = uguid::guid!("11223344-5566-7788-99aa-bbccddeeff00");
        let image = PeImageBuilder::new()
            .metadata(vec![0; 16])
            .codeview(guid, 1, "C:\\build\\App.pdb", 0x6543_2100)
            .build();
        let file = File::from_mem(image).unwrap();

        let entries = file.debug_directory().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].debug_type, IMAGE_DEBUG_TYPE_CODEVIEW);

        let codeview = file.codeview().unwrap().unwrap();
        assert_eq!(codeview.guid, guid);
        assert_eq!(codeview.age, 1);
        assert_eq!(codeview.path, "C:\\build\\App.pdb");
        assert_eq!(codeview.time_date_stamp, 0x6543_2100);
    }

    #[test]
    fn no_debug_directory() {
        let image = PeImageBuilder::new().metadata(vec![0; 16]).build();
        let file = File::from_mem(image).unwrap();

        assert!(file.debug_directory().unwrap().is_empty());
        assert!(file.codeview().unwrap().is_none());
    }
}
