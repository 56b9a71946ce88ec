//! Raw `ImportScope` table rows.
//!
//! Import scopes form a tree through their parent column. Row 1 is the global scope of the
//! generated PDB with no parent and no imports; every other row points at a lower row.

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of an `ImportScope` row
///
/// # Binary Format
///
/// - Parent: simple index into the `ImportScope` table, 0 for a root
/// - Imports: `#Blob` index of the import declarations, see
///   [`crate::metadata::importscope`]
///
/// # Reference
/// * [Portable PDB Format - ImportScope Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#importscope-table-0x35)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportScopeRaw {
    /// Row identifier within the `ImportScope` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// Parent `ImportScope` row, 0 for the root
    pub parent: u32,
    /// `#Blob` index of the imports blob
    pub imports: u32,
}

impl RowReadable for ImportScopeRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.table_index_bytes(TableId::ImportScope) + // parent
            sizes.blob_bytes()                              // imports
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(ImportScopeRaw {
            rid,
            token: Token::from_parts(TableId::ImportScope, rid),
            offset: *offset,
            parent: read_le_at_dyn(data, offset, sizes.is_large(TableId::ImportScope))?,
            imports: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for ImportScopeRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.parent, sizes.is_large(TableId::ImportScope))?;
        write_le_at_dyn(data, offset, self.imports, sizes.is_large_blob())?;
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
            0x00, 0x00, // parent
            0x00, 0x00, // imports
            0x01, 0x00, // parent
            0x05, 0x00, // imports
        ];

        let sizes = Arc::new(TableInfo::new_test(&[(TableId::ImportScope, 2)], false, false, false));
        let table = MetadataTable::<ImportScopeRaw>::new(&data, 2, sizes.clone()).unwrap();

        let rows: Vec<ImportScopeRaw> = table.iter().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parent, 0);
        assert_eq!(rows[1].token.value(), 0x35000002);
        assert_eq!(rows[1].parent, 1);
        assert_eq!(rows[1].imports, 5);

        let mut written = Vec::new();
        write_rows(&rows, &sizes, &mut written).unwrap();
        assert_eq!(written, data);
    }
}
