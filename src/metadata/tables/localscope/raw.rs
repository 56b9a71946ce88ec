//! Raw `LocalScope` table rows.
//!
//! Rows are sorted by method, then by ascending start offset, then by descending length, so
//! an enclosing scope always precedes the scopes nested in it.

use crate::{
    file::io::{read_le_at, read_le_at_dyn, write_le_at, write_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `LocalScope` row
///
/// # Binary Format
///
/// - Method: simple index into the assembly's `MethodDef` table
/// - ImportScope: simple index into the `ImportScope` table
/// - VariableList: first row of a contiguous run in `LocalVariable`
/// - ConstantList: first row of a contiguous run in `LocalConstant`
/// - StartOffset: 4-byte IL offset
/// - Length: 4-byte IL length, never zero
///
/// # Reference
/// * [Portable PDB Format - LocalScope Table](https://github.com/dotnet/core/blob/main/Documentation/diagnostics/portable_pdb.md#localscope-table-0x32)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalScopeRaw {
    /// Row identifier within the `LocalScope` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// `MethodDef` row of the assembly
    pub method: u32,
    /// `ImportScope` row in effect
    pub import_scope: u32,
    /// First `LocalVariable` row of this scope
    pub variable_list: u32,
    /// First `LocalConstant` row of this scope
    pub constant_list: u32,
    /// IL offset the scope starts at
    pub start_offset: u32,
    /// Length of the scope in IL bytes
    pub length: u32,
}

impl RowReadable for LocalScopeRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.table_index_bytes(TableId::MethodDef) +     // method
            sizes.table_index_bytes(TableId::ImportScope) +   // import_scope
            sizes.table_index_bytes(TableId::LocalVariable) + // variable_list
            sizes.table_index_bytes(TableId::LocalConstant) + // constant_list
            4 +                                               // start_offset
            4                                                 // length
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(LocalScopeRaw {
            rid,
            token: Token::from_parts(TableId::LocalScope, rid),
            offset: *offset,
            method: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
            import_scope: read_le_at_dyn(data, offset, sizes.is_large(TableId::ImportScope))?,
            variable_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::LocalVariable))?,
            constant_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::LocalConstant))?,
            start_offset: read_le_at::<u32>(data, offset)?,
            length: read_le_at::<u32>(data, offset)?,
        })
    }
}

impl RowWritable for LocalScopeRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.method, sizes.is_large(TableId::MethodDef))?;
        write_le_at_dyn(data, offset, self.import_scope, sizes.is_large(TableId::ImportScope))?;
        write_le_at_dyn(data, offset, self.variable_list, sizes.is_large(TableId::LocalVariable))?;
        write_le_at_dyn(data, offset, self.constant_list, sizes.is_large(TableId::LocalConstant))?;
        write_le_at::<u32>(data, offset, self.start_offset)?;
        write_le_at::<u32>(data, offset, self.length)?;
        Ok(())
    }
}
