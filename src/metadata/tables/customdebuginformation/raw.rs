//! Raw `CustomDebugInformation` table rows.
//!
//! Extension records keyed by a GUID kind: embedded source on documents, hoisted local scopes
//! and async stepping information on methods. Rows are sorted by their encoded parent.

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{
            CodedIndex, CodedIndexType, RowReadable, RowWritable, TableId, TableInfoRef,
        },
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `CustomDebugInformation` row
///
/// # Binary Format
///
/// - Parent: `HasCustomDebugInformation` coded index
/// - Kind: `#GUID` index identifying the blob format
/// - Value: `#Blob` index of the kind-specific payload
///
/// # Reference
/// * [Portable PDB Format - CustomDebugInformation Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#customdebuginformation-table-0x37)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDebugInformationRaw {
    /// Row identifier within the `CustomDebugInformation` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// The entity this record is attached to
    pub parent: CodedIndex,
    /// `#GUID` index of the kind
    pub kind: u32,
    /// `#Blob` index of the kind-specific value
    pub value: u32,
}

impl RowReadable for CustomDebugInformationRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.coded_index_bytes(CodedIndexType::HasCustomDebugInformation) + // parent
            sizes.guid_bytes() +                                                // kind
            sizes.blob_bytes()                                                  // value
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        let row_offset = *offset;
        Ok(CustomDebugInformationRaw {
            rid,
            token: Token::from_parts(TableId::CustomDebugInformation, rid),
            offset: row_offset,
            parent: CodedIndex::read(
                data,
                offset,
                sizes,
                CodedIndexType::HasCustomDebugInformation,
            )?,
            kind: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            value: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for CustomDebugInformationRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        self.parent
            .write(data, offset, sizes, CodedIndexType::HasCustomDebugInformation)?;
        write_le_at_dyn(data, offset, self.kind, sizes.is_large_guid())?;
        write_le_at_dyn(data, offset, self.value, sizes.is_large_blob())?;
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
            0x36, 0x00, // parent: Document (tag 22), row 1
            0x01, 0x00, // kind
            0x07, 0x00, // value
            0x40, 0x00, // parent: MethodDef (tag 0), row 2
            0x02, 0x00, // kind
            0x09, 0x00, // value
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::MethodDef, 2),
                (TableId::Document, 1),
                (TableId::CustomDebugInformation, 2),
            ],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<CustomDebugInformationRaw>::new(&data, 2, sizes.clone()).unwrap();

        let rows: Vec<CustomDebugInformationRaw> = table.iter().collect();
        assert_eq!(rows[0].parent, CodedIndex::new(TableId::Document, 1));
        assert_eq!(rows[0].kind, 1);
        assert_eq!(rows[0].value, 7);
        assert_eq!(rows[1].parent.token, Token::method_def(2));
        assert_eq!(rows[1].token.value(), 0x37000002);

        let mut written = Vec::new();
        write_rows(&rows, &sizes, &mut written).unwrap();
        assert_eq!(written, data);
    }
}
