//! Raw `StateMachineMethod` table rows.
//!
//! Maps the `MoveNext` method of a compiler generated iterator or async state machine back to
//! the method the user wrote. Rows are sorted by `MoveNext` row.

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `StateMachineMethod` row
///
/// # Binary Format
///
/// - MoveNextMethod: simple index into the assembly's `MethodDef` table
/// - KickoffMethod: simple index into the assembly's `MethodDef` table
///
/// # Reference
/// * [Portable PDB Format - StateMachineMethod Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#statemachinemethod-table-0x36)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineMethodRaw {
    /// Row identifier within the `StateMachineMethod` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// `MethodDef` row of the generated `MoveNext`
    pub move_next_method: u32,
    /// `MethodDef` row of the user-written method
    pub kickoff_method: u32,
}

impl RowReadable for StateMachineMethodRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.table_index_bytes(TableId::MethodDef) + // move_next_method
            sizes.table_index_bytes(TableId::MethodDef)   // kickoff_method
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(StateMachineMethodRaw {
            rid,
            token: Token::from_parts(TableId::StateMachineMethod, rid),
            offset: *offset,
            move_next_method: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
            kickoff_method: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
        })
    }
}

impl RowWritable for StateMachineMethodRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.move_next_method, sizes.is_large(TableId::MethodDef))?;
        write_le_at_dyn(data, offset, self.kickoff_method, sizes.is_large(TableId::MethodDef))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::types::{write_rows, MetadataTable, TableInfo};

    #[test]
    fn crafted_long() {
        let data = vec![
            0x05, 0x00, 0x01, 0x00, // move_next_method
            0x02, 0x00, 0x00, 0x00, // kickoff_method
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::MethodDef, 0x10005), (TableId::StateMachineMethod, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<StateMachineMethodRaw>::new(&data, 1, sizes.clone()).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x36000001);
        assert_eq!(row.move_next_method, 0x10005);
        assert_eq!(row.kickoff_method, 2);

        let mut written = Vec::new();
        write_rows(&[row], &sizes, &mut written).unwrap();
        assert_eq!(written, data);
    }
}
