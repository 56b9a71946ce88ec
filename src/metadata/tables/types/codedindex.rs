use strum::{EnumCount, EnumIter};

use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::types::{TableId, TableInfo},
        token::Token,
    },
    Error::OutOfBounds,
    Result,
};

/// The coded index kinds of ECMA-335 II.24.2.6 plus the Portable PDB
/// `HasCustomDebugInformation` kind.
///
/// A coded index packs a table tag into its low bits and a row index into the rest, so one
/// column can point into any of several tables.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef`, `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param`, `Property`
    HasConstant,
    /// Any attributable table
    HasCustomAttribute,
    /// `Field`, `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef`, `Assembly`
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef`, `TypeSpec`
    MemberRefParent,
    /// `Event`, `Property`
    HasSemantics,
    /// `MethodDef`, `MemberRef`
    MethodDefOrRef,
    /// `Field`, `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef`, `ExportedType`
    Implementation,
    /// `MethodDef`, `MemberRef` (tags 0, 1 and 4 unused)
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef`, `TypeRef`
    ResolutionScope,
    /// `TypeDef`, `MethodDef`
    TypeOrMethodDef,
    /// Parent column of `CustomDebugInformation`
    HasCustomDebugInformation,
}

impl CodedIndexType {
    /// The tables this coded index can refer to, in tag order
    #[must_use]
    pub fn tables(&self) -> &'static [TableId] {
        match self {
            CodedIndexType::TypeDefOrRef => {
                &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec]
            }
            CodedIndexType::HasConstant => &[TableId::Field, TableId::Param, TableId::Property],
            CodedIndexType::HasCustomAttribute => &[
                TableId::MethodDef,
                TableId::Field,
                TableId::TypeRef,
                TableId::TypeDef,
                TableId::Param,
                TableId::InterfaceImpl,
                TableId::MemberRef,
                TableId::Module,
                TableId::DeclSecurity,
                TableId::Property,
                TableId::Event,
                TableId::StandAloneSig,
                TableId::ModuleRef,
                TableId::TypeSpec,
                TableId::Assembly,
                TableId::AssemblyRef,
                TableId::File,
                TableId::ExportedType,
                TableId::ManifestResource,
                TableId::GenericParam,
                TableId::GenericParamConstraint,
                TableId::MethodSpec,
            ],
            CodedIndexType::HasFieldMarshal => &[TableId::Field, TableId::Param],
            CodedIndexType::HasDeclSecurity => {
                &[TableId::TypeDef, TableId::MethodDef, TableId::Assembly]
            }
            CodedIndexType::MemberRefParent => &[
                TableId::TypeDef,
                TableId::TypeRef,
                TableId::ModuleRef,
                TableId::MethodDef,
                TableId::TypeSpec,
            ],
            CodedIndexType::HasSemantics => &[TableId::Event, TableId::Property],
            CodedIndexType::MethodDefOrRef => &[TableId::MethodDef, TableId::MemberRef],
            CodedIndexType::MemberForwarded => &[TableId::Field, TableId::MethodDef],
            CodedIndexType::Implementation => {
                &[TableId::File, TableId::AssemblyRef, TableId::ExportedType]
            }
            CodedIndexType::CustomAttributeType => &[
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MemberRef,
                TableId::MemberRef,
            ],
            CodedIndexType::ResolutionScope => &[
                TableId::Module,
                TableId::ModuleRef,
                TableId::AssemblyRef,
                TableId::TypeRef,
            ],
            CodedIndexType::TypeOrMethodDef => &[TableId::TypeDef, TableId::MethodDef],
            CodedIndexType::HasCustomDebugInformation => &[
                TableId::MethodDef,
                TableId::Field,
                TableId::TypeRef,
                TableId::TypeDef,
                TableId::Param,
                TableId::InterfaceImpl,
                TableId::MemberRef,
                TableId::Module,
                TableId::DeclSecurity,
                TableId::Property,
                TableId::Event,
                TableId::StandAloneSig,
                TableId::ModuleRef,
                TableId::TypeSpec,
                TableId::Assembly,
                TableId::AssemblyRef,
                TableId::File,
                TableId::ExportedType,
                TableId::ManifestResource,
                TableId::GenericParam,
                TableId::GenericParamConstraint,
                TableId::MethodSpec,
                TableId::Document,
                TableId::LocalScope,
                TableId::LocalVariable,
                TableId::LocalConstant,
                TableId::ImportScope,
            ],
        }
    }

    /// Number of low bits holding the table tag
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tag_bits(&self) -> u8 {
        let count = self.tables().len();
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }
}

/// A decoded coded index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodedIndex {
    /// The table this index points into
    pub tag: TableId,
    /// The 1-based row, 0 for a null reference
    pub row: u32,
    /// The equivalent metadata token
    pub token: Token,
}

impl CodedIndex {
    /// Create a new `CodedIndex`
    #[must_use]
    pub fn new(tag: TableId, row: u32) -> CodedIndex {
        CodedIndex {
            tag,
            row,
            token: Token::from_parts(tag, row),
        }
    }

    /// Read a coded index column
    ///
    /// ## Arguments
    /// * 'data'    - The table data
    /// * 'offset'  - Column offset, advanced past the column
    /// * 'info'    - Table sizes, deciding the 2 or 4 byte width
    /// * 'ci_type' - The coded index kind of this column
    ///
    /// # Errors
    /// Returns an error if the data is too short or the tag is out of range.
    pub fn read(
        data: &[u8],
        offset: &mut usize,
        info: &TableInfo,
        ci_type: CodedIndexType,
    ) -> Result<Self> {
        let value = read_le_at_dyn(data, offset, info.coded_index_bytes(ci_type) == 4)?;
        Self::decode(value, ci_type)
    }

    /// Write this coded index as a column
    ///
    /// # Errors
    /// Returns an error if the buffer is too short or the table is not part of `ci_type`.
    pub fn write(
        &self,
        data: &mut [u8],
        offset: &mut usize,
        info: &TableInfo,
        ci_type: CodedIndexType,
    ) -> Result<()> {
        let value = self.encode(ci_type)?;
        write_le_at_dyn(data, offset, value, info.coded_index_bytes(ci_type) == 4)
    }

    /// Split a raw coded index value into table and row
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the tag does not name a table of `ci_type`.
    pub fn decode(value: u32, ci_type: CodedIndexType) -> Result<Self> {
        let tables = ci_type.tables();
        let tag_bits = ci_type.tag_bits();
        let tag = (value & ((1 << tag_bits) - 1)) as usize;
        if tag >= tables.len() {
            return Err(OutOfBounds);
        }

        Ok(CodedIndex::new(tables[tag], value >> tag_bits))
    }

    /// The raw coded index value, `row << tag_bits | tag`
    ///
    /// This is also the value `CustomDebugInformation` rows are sorted by.
    ///
    /// # Errors
    /// Returns a malformed error if the table is not part of `ci_type`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(&self, ci_type: CodedIndexType) -> Result<u32> {
        let Some(tag) = ci_type.tables().iter().position(|table| *table == self.tag) else {
            return Err(malformed_error!(
                "Table {:?} is not part of coded index {:?}",
                self.tag,
                ci_type
            ));
        };

        Ok((self.row << ci_type.tag_bits()) | tag as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_bits() {
        assert_eq!(CodedIndexType::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasFieldMarshal.tag_bits(), 1);
        assert_eq!(CodedIndexType::HasCustomAttribute.tag_bits(), 5);
        assert_eq!(CodedIndexType::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexType::ResolutionScope.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasCustomDebugInformation.tag_bits(), 5);
    }

    #[test]
    fn encode_decode() {
        let method = CodedIndex::new(TableId::MethodDef, 3);
        assert_eq!(
            method.encode(CodedIndexType::HasCustomDebugInformation).unwrap(),
            3 << 5
        );

        let document = CodedIndex::new(TableId::Document, 1);
        let value = document
            .encode(CodedIndexType::HasCustomDebugInformation)
            .unwrap();
        assert_eq!(value, (1 << 5) | 22);
        assert_eq!(
            CodedIndex::decode(value, CodedIndexType::HasCustomDebugInformation).unwrap(),
            document
        );
        assert_eq!(document.token, Token(0x3000_0001));

        assert!(document.encode(CodedIndexType::TypeDefOrRef).is_err());
        assert!(CodedIndex::decode(0x1F, CodedIndexType::HasCustomDebugInformation).is_err());
    }
}
