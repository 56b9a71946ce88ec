use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::types::{RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `NestedClass` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedClassRaw {
    /// Row identifier within the `NestedClass` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// `TypeDef` row of the nested type
    pub nested_class: u32,
    /// `TypeDef` row of the declaring type
    pub enclosing_class: u32,
}

impl RowReadable for NestedClassRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            sizes.table_index_bytes(TableId::TypeDef) + // nested_class
            sizes.table_index_bytes(TableId::TypeDef)   // enclosing_class
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(NestedClassRaw {
            rid,
            token: Token::from_parts(TableId::NestedClass, rid),
            offset: *offset,
            nested_class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
            enclosing_class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
        })
    }
}
