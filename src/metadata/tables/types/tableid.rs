use strum::{EnumCount, EnumIter};

/// Identifiers for the metadata tables defined in ECMA-335 and the Portable PDB format.
///
/// The numeric values are the table ids used in tokens, in the `Valid` and `Sorted` bit vectors
/// of the `#~` stream and in the `ReferencedTypeSystemTables` mask of the `#Pdb` stream.
///
/// ## Table Categories
///
/// ### Type System (`0x00` - `0x2C`)
/// Live in the assembly. A Portable PDB never stores their rows, but their row counts decide the
/// width of the indices the debug tables hold into them (`MethodDef` most importantly).
///
/// ### Debug (`0x30` - `0x37`)
/// - **`Document`**: Source documents, with hash and language
/// - **`MethodDebugInformation`**: Sequence points, exactly one row per `MethodDef`
/// - **`LocalScope`**: IL ranges with their import scope and locals
/// - **`LocalVariable`** / **`LocalConstant`**: Scope members
/// - **`ImportScope`**: Lexical namespace imports, as a tree
/// - **`StateMachineMethod`**: `MoveNext` to kickoff method mapping
/// - **`CustomDebugInformation`**: Kind-tagged extension records
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord)]
pub enum TableId {
    /// `Module` table (0x00)
    Module = 0x00,
    /// `TypeRef` table (0x01)
    TypeRef = 0x01,
    /// `TypeDef` table (0x02)
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03), only in unoptimized `#-` streams
    FieldPtr = 0x03,
    /// `Field` table (0x04)
    Field = 0x04,
    /// `MethodPtr` table (0x05), only in unoptimized `#-` streams
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06)
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07), only in unoptimized `#-` streams
    ParamPtr = 0x07,
    /// `Param` table (0x08)
    Param = 0x08,
    /// `InterfaceImpl` table (0x09)
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A)
    MemberRef = 0x0A,
    /// `Constant` table (0x0B)
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C)
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D)
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E)
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F)
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10)
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11)
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12)
    EventMap = 0x12,
    /// `EventPtr` table (0x13), only in unoptimized `#-` streams
    EventPtr = 0x13,
    /// `Event` table (0x14)
    Event = 0x14,
    /// `PropertyMap` table (0x15)
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16), only in unoptimized `#-` streams
    PropertyPtr = 0x16,
    /// `Property` table (0x17)
    Property = 0x17,
    /// `MethodSemantics` table (0x18)
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19)
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A)
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B)
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C)
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D)
    FieldRVA = 0x1D,
    /// `EncLog` table (0x1E)
    EncLog = 0x1E,
    /// `EncMap` table (0x1F)
    EncMap = 0x1F,
    /// `Assembly` table (0x20)
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21)
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22)
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (0x23)
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24)
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25)
    AssemblyRefOS = 0x25,
    /// `File` table (0x26)
    File = 0x26,
    /// `ExportedType` table (0x27)
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28)
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29)
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A)
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B)
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C)
    GenericParamConstraint = 0x2C,
    /// `Document` table (0x30)
    Document = 0x30,
    /// `MethodDebugInformation` table (0x31)
    MethodDebugInformation = 0x31,
    /// `LocalScope` table (0x32)
    LocalScope = 0x32,
    /// `LocalVariable` table (0x33)
    LocalVariable = 0x33,
    /// `LocalConstant` table (0x34)
    LocalConstant = 0x34,
    /// `ImportScope` table (0x35)
    ImportScope = 0x35,
    /// `StateMachineMethod` table (0x36)
    StateMachineMethod = 0x36,
    /// `CustomDebugInformation` table (0x37)
    CustomDebugInformation = 0x37,
}

impl TableId {
    /// Map a raw table id back to its variant
    #[must_use]
    pub fn from_u8(value: u8) -> Option<TableId> {
        use strum::IntoEnumIterator;

        TableId::iter().find(|table| *table as u8 == value)
    }

    /// True for the tables a Portable PDB stores itself (`0x30` and up)
    #[must_use]
    pub fn is_debug_table(&self) -> bool {
        (*self as u8) >= TableId::Document as u8
    }

    /// The bit of this table in the `Valid` / `Sorted` / `ReferencedTypeSystemTables` masks
    #[must_use]
    pub fn mask(&self) -> u64 {
        1u64 << (*self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn ids() {
        assert_eq!(TableId::COUNT, 53);
        assert_eq!(TableId::from_u8(0x06), Some(TableId::MethodDef));
        assert_eq!(TableId::from_u8(0x37), Some(TableId::CustomDebugInformation));
        assert_eq!(TableId::from_u8(0x2D), None);
        assert!(TableId::Document.is_debug_table());
        assert!(!TableId::GenericParamConstraint.is_debug_table());
        assert_eq!(TableId::LocalScope.mask(), 1 << 0x32);
    }

    #[test]
    fn ascending() {
        let ids: Vec<u8> = TableId::iter().map(|table| table as u8).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
