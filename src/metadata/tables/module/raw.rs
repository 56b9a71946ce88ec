use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::types::{RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// Raw binary representation of the single `Module` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRaw {
    /// Row identifier within the `Module` table
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of this row within the tables stream
    pub offset: usize,
    /// Reserved, zero
    pub generation: u32,
    /// `#Strings` index of the module name
    pub name: u32,
    /// `#GUID` index of the module version id
    pub mvid: u32,
    /// Reserved `#GUID` index
    pub encid: u32,
    /// Reserved `#GUID` index
    pub encbaseid: u32,
}

impl RowReadable for ModuleRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            2 +                   // generation
            sizes.str_bytes() +   // name
            sizes.guid_bytes() +  // mvid
            sizes.guid_bytes() +  // encid
            sizes.guid_bytes()    // encbaseid
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(ModuleRaw {
            rid,
            token: Token::from_parts(TableId::Module, rid),
            offset: *offset,
            generation: u32::from(read_le_at::<u16>(data, offset)?),
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            mvid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            encid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            encbaseid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
        })
    }
}
