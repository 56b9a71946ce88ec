use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of a `MethodDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefRaw {
    /// Row identifier within the `MethodDef` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// RVA of the method body, 0 for abstract, extern and runtime methods
    pub rva: u32,
    /// Raw `MethodImplAttributes`
    pub impl_flags: u16,
    /// Raw `MethodAttributes`
    pub flags: u16,
    /// `#Strings` index of the name
    pub name: u32,
    /// `#Blob` index of the signature
    pub signature: u32,
    /// First `Param` row owned by this method
    pub param_list: u32,
}

impl RowReadable for MethodDefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            4 +                                      // rva
            2 +                                      // impl_flags
            2 +                                      // flags
            sizes.str_bytes() +                      // name
            sizes.blob_bytes() +                     // signature
            sizes.table_index_bytes(TableId::Param)  // param_list
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(MethodDefRaw {
            rid,
            token: Token::method_def(rid),
            offset: *offset,
            rva: read_le_at::<u32>(data, offset)?,
            impl_flags: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            param_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Param))?,
        })
    }
}
