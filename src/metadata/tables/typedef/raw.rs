use bitflags::bitflags;

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::types::{CodedIndex, CodedIndexType, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

bitflags! {
    /// The subset of `TypeAttributes` (ECMA-335 II.23.1.15) type selection looks at
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeAttributes: u32 {
        /// Visibility mask
        const VISIBILITY_MASK = 0x0000_0007;
        /// Interface semantics
        const INTERFACE = 0x0000_0020;
        /// Name is special, e.g. compiler generated
        const SPECIAL_NAME = 0x0000_0400;
        /// Runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x0000_0800;
    }
}

/// Raw binary representation of a `TypeDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefRaw {
    /// Row identifier within the `TypeDef` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// Raw `TypeAttributes`
    pub flags: u32,
    /// `#Strings` index of the name
    pub type_name: u32,
    /// `#Strings` index of the namespace
    pub type_namespace: u32,
    /// Base type
    pub extends: CodedIndex,
    /// First `Field` row owned by this type
    pub field_list: u32,
    /// First `MethodDef` row owned by this type
    pub method_list: u32,
}

impl RowReadable for TypeDefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            4 +                                                  // flags
            sizes.str_bytes() +                                  // type_name
            sizes.str_bytes() +                                  // type_namespace
            sizes.coded_index_bytes(CodedIndexType::TypeDefOrRef) + // extends
            sizes.table_index_bytes(TableId::Field) +            // field_list
            sizes.table_index_bytes(TableId::MethodDef)          // method_list
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        let row_offset = *offset;
        Ok(TypeDefRaw {
            rid,
            token: Token::type_def(rid),
            offset: row_offset,
            flags: read_le_at::<u32>(data, offset)?,
            type_name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            type_namespace: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            extends: CodedIndex::read(data, offset, sizes, CodedIndexType::TypeDefOrRef)?,
            field_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Field))?,
            method_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
        })
    }
}
