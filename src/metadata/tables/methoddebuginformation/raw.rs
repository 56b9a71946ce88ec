//! Raw `MethodDebugInformation` table rows.
//!
//! The table is parallel to the `MethodDef` table of the assembly: row N describes method N,
//! so a PDB always carries exactly as many rows as the assembly has methods.

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `MethodDebugInformation` row
///
/// # Binary Format
///
/// - Document: simple index into the `Document` table, 0 when the sequence points blob names
///   its own initial document or the method has no points
/// - SequencePoints: `#Blob` index of the encoded points, 0 for none
///
/// # Reference
/// * [Portable PDB Format - MethodDebugInformation Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#methoddebuginformation-table-0x31)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDebugInformationRaw {
    /// Row identifier, equal to the `MethodDef` row it describes
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// `Document` row holding the method, 0 for none
    pub document: u32,
    /// `#Blob` index of the sequence points, 0 for none
    pub sequence_points: u32,
}

impl RowReadable for MethodDebugInformationRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.table_index_bytes(TableId::Document) + // document
            sizes.blob_bytes()                           // sequence_points
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(MethodDebugInformationRaw {
            rid,
            token: Token::from_parts(TableId::MethodDebugInformation, rid),
            offset: *offset,
            document: read_le_at_dyn(data, offset, sizes.is_large(TableId::Document))?,
            sequence_points: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for MethodDebugInformationRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.document, sizes.is_large(TableId::Document))?;
        write_le_at_dyn(data, offset, self.sequence_points, sizes.is_large_blob())?;
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
            0x01, 0x01, // document
            0x02, 0x02, // sequence_points
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::MethodDebugInformation, 1), (TableId::Document, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<MethodDebugInformationRaw>::new(&data, 1, sizes.clone()).unwrap();

        let eval = |row: &MethodDebugInformationRaw| {
            assert_eq!(row.rid, 1);
            assert_eq!(row.token.value(), 0x31000001);
            assert_eq!(row.document, 0x0101);
            assert_eq!(row.sequence_points, 0x0202);
        };

        for row in table.iter() {
            eval(&row);
        }

        let row = table.get(1).unwrap();
        eval(&row);

        let mut written = Vec::new();
        write_rows(&[row], &sizes, &mut written).unwrap();
        assert_eq!(written, data);
    }

    #[test]
    fn crafted_long() {
        let data = vec![
            0x01, 0x01, 0x01, 0x01, // document
            0x02, 0x02, 0x02, 0x02, // sequence_points
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::MethodDebugInformation, 1),
                (TableId::Document, 100000),
            ],
            true,
            true,
            true,
        ));
        let table = MetadataTable::<MethodDebugInformationRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.document, 0x01010101);
        assert_eq!(row.sequence_points, 0x02020202);
    }
}
