//! Raw `Document` table rows of a Portable PDB.
//!
//! One row per source file. The generator writes a row for every decompiled source file that
//! produced syntax; the reader turns rows back into paths, hashes and languages.

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `Document` row, heap indices unresolved
///
/// # Binary Format
///
/// - Name: `#Blob` index of the document name blob (separator plus part indices)
/// - HashAlgorithm: `#GUID` index, SHA-256 for generated documents
/// - Hash: `#Blob` index of the content hash
/// - Language: `#GUID` index, C# for generated documents
///
/// Index widths follow the heap size flags of the tables header.
///
/// # Reference
/// * [Portable PDB Format - Document Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#document-table-0x30)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRaw {
    /// Row identifier within the `Document` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// `#Blob` index of the document name blob
    pub name: u32,
    /// `#GUID` index of the hash algorithm
    pub hash_algorithm: u32,
    /// `#Blob` index of the content hash
    pub hash: u32,
    /// `#GUID` index of the source language
    pub language: u32,
}

impl RowReadable for DocumentRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.blob_bytes() + // name
            sizes.guid_bytes() + // hash_algorithm
            sizes.blob_bytes() + // hash
            sizes.guid_bytes()   // language
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(DocumentRaw {
            rid,
            token: Token::from_parts(TableId::Document, rid),
            offset: *offset,
            name: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            hash_algorithm: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            hash: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            language: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
        })
    }
}

impl RowWritable for DocumentRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.name, sizes.is_large_blob())?;
        write_le_at_dyn(data, offset, self.hash_algorithm, sizes.is_large_guid())?;
        write_le_at_dyn(data, offset, self.hash, sizes.is_large_blob())?;
        write_le_at_dyn(data, offset, self.language, sizes.is_large_guid())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::types::{write_rows, MetadataTable, TableInfo};

    #[test]
    fn crafted_short() {
        let data = vec![
            0x01, 0x01, // name
            0x02, 0x00, // hash_algorithm
            0x03, 0x03, // hash
            0x01, 0x00, // language
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::Document, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<DocumentRaw>::new(&data, 1, sizes.clone()).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x30000001);
        assert_eq!(row.name, 0x0101);
        assert_eq!(row.hash_algorithm, 2);
        assert_eq!(row.hash, 0x0303);
        assert_eq!(row.language, 1);

        let mut written = Vec::new();
        write_rows(&[row], &sizes, &mut written).unwrap();
        assert_eq!(written, data);
    }

    #[test]
    fn crafted_long() {
        let data = vec![
            0x01, 0x01, 0x01, 0x01, // name
            0x02, 0x00, // hash_algorithm
            0x03, 0x03, 0x03, 0x03, // hash
            0x01, 0x00, // language
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::Document, 1)],
            false,
            true,
            false,
        ));
        let table = MetadataTable::<DocumentRaw>::new(&data, 1, sizes).unwrap();

        for row in table.iter() {
            assert_eq!(row.name, 0x01010101);
            assert_eq!(row.hash, 0x03030303);
            assert_eq!(row.language, 1);
        }
    }
}
