//! Raw `LocalConstant` table rows.

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `LocalConstant` row
///
/// # Binary Format
///
/// - Name: `#Strings` index
/// - Signature: `#Blob` index of the constant's type and value
///
/// # Reference
/// * [Portable PDB Format - LocalConstant Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#localconstant-table-0x34)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConstantRaw {
    /// Row identifier within the `LocalConstant` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// `#Strings` index of the constant name
    pub name: u32,
    /// `#Blob` index of the constant signature and value
    pub signature: u32,
}

impl RowReadable for LocalConstantRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.str_bytes() +  // name
            sizes.blob_bytes()   // signature
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(LocalConstantRaw {
            rid,
            token: Token::from_parts(TableId::LocalConstant, rid),
            offset: *offset,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for LocalConstantRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.name, sizes.is_large_str())?;
        write_le_at_dyn(data, offset, self.signature, sizes.is_large_blob())?;
        Ok(())
    }
}
