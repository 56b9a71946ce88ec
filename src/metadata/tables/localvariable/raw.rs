//! Raw `LocalVariable` table rows.

use bitflags::bitflags;

use crate::{
    file::io::{read_le_at, read_le_at_dyn, write_le_at, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

bitflags! {
    /// `LocalVariable` attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LocalVariableAttributes: u16 {
        /// Variable is compiler-generated and hidden from the debugger's locals view
        const DEBUGGER_HIDDEN = 0x0001;
    }
}

/// Raw binary representation of a `LocalVariable` row
///
/// # Binary Format
///
/// - Attributes: 2-byte [`LocalVariableAttributes`]
/// - Index: 2-byte slot in the local signature
/// - Name: `#Strings` index
///
/// # Reference
/// * [Portable PDB Format - LocalVariable Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#localvariable-table-0x33)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableRaw {
    /// Row identifier within the `LocalVariable` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// Raw [`LocalVariableAttributes`]
    pub attributes: u16,
    /// Slot index in the method's local signature
    pub index: u16,
    /// `#Strings` index of the variable name
    pub name: u32,
}

impl RowReadable for LocalVariableRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            2 +                 // attributes
            2 +                 // index
            sizes.str_bytes()   // name
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(LocalVariableRaw {
            rid,
            token: Token::from_parts(TableId::LocalVariable, rid),
            offset: *offset,
            attributes: read_le_at::<u16>(data, offset)?,
            index: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}

impl RowWritable for LocalVariableRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at::<u16>(data, offset, self.attributes)?;
        write_le_at::<u16>(data, offset, self.index)?;
        write_le_at_dyn(data, offset, self.name, sizes.is_large_str())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::types::{MetadataTable, TableInfo};

    #[test]
    fn crafted_short() {
        let data = vec![
            0x01, 0x00, // attributes
            0x03, 0x00, // index
            0x10, 0x00, // name
        ];

        let sizes = Arc::new(TableInfo::new_test(&[(TableId::LocalVariable, 1)], false, false, false));
        let table = MetadataTable::<LocalVariableRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x33000001);
        assert_eq!(
            LocalVariableAttributes::from_bits_truncate(row.attributes),
            LocalVariableAttributes::DEBUGGER_HIDDEN
        );
        assert_eq!(row.index, 3);
        assert_eq!(row.name, 0x10);
    }
}
