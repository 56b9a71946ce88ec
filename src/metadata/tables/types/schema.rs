//! Column layouts of every metadata table.
//!
//! Reading any one table of an assembly requires knowing the byte size of every table stored
//! before it, so the layouts of all type-system tables are described here even though only a
//! handful of them are decoded into rows.

use crate::metadata::tables::types::{CodedIndexType, TableId, TableInfo};

/// One column of a metadata table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    /// Fixed 2-byte value
    U16,
    /// Fixed 4-byte value
    U32,
    /// Index into `#Strings`
    Str,
    /// Index into `#GUID`
    Guid,
    /// Index into `#Blob`
    Blob,
    /// Simple index into a table
    Table(TableId),
    /// Coded index
    Coded(CodedIndexType),
}

impl Column {
    /// Byte width of this column under the given sizes
    #[must_use]
    pub fn size(&self, info: &TableInfo) -> u32 {
        u32::from(match self {
            Column::U16 => 2,
            Column::U32 => 4,
            Column::Str => info.str_bytes(),
            Column::Guid => info.guid_bytes(),
            Column::Blob => info.blob_bytes(),
            Column::Table(table) => info.table_index_bytes(*table),
            Column::Coded(coded) => info.coded_index_bytes(*coded),
        })
    }
}

/// The columns of a table, in storage order
#[must_use]
pub fn columns(table: TableId) -> &'static [Column] {
    use CodedIndexType as Ci;
    use Column::{Blob, Coded, Guid, Str, Table, U16, U32};

    match table {
        TableId::Module => &[U16, Str, Guid, Guid, Guid],
        TableId::TypeRef => &[Coded(Ci::ResolutionScope), Str, Str],
        TableId::TypeDef => &[
            U32,
            Str,
            Str,
            Coded(Ci::TypeDefOrRef),
            Table(TableId::Field),
            Table(TableId::MethodDef),
        ],
        TableId::FieldPtr => &[Table(TableId::Field)],
        TableId::Field => &[U16, Str, Blob],
        TableId::MethodPtr => &[Table(TableId::MethodDef)],
        TableId::MethodDef => &[U32, U16, U16, Str, Blob, Table(TableId::Param)],
        TableId::ParamPtr => &[Table(TableId::Param)],
        TableId::Param => &[U16, U16, Str],
        TableId::InterfaceImpl => &[Table(TableId::TypeDef), Coded(Ci::TypeDefOrRef)],
        TableId::MemberRef => &[Coded(Ci::MemberRefParent), Str, Blob],
        TableId::Constant => &[U16, Coded(Ci::HasConstant), Blob],
        TableId::CustomAttribute => &[
            Coded(Ci::HasCustomAttribute),
            Coded(Ci::CustomAttributeType),
            Blob,
        ],
        TableId::FieldMarshal => &[Coded(Ci::HasFieldMarshal), Blob],
        TableId::DeclSecurity => &[U16, Coded(Ci::HasDeclSecurity), Blob],
        TableId::ClassLayout => &[U16, U32, Table(TableId::TypeDef)],
        TableId::FieldLayout => &[U32, Table(TableId::Field)],
        TableId::StandAloneSig => &[Blob],
        TableId::EventMap => &[Table(TableId::TypeDef), Table(TableId::Event)],
        TableId::EventPtr => &[Table(TableId::Event)],
        TableId::Event => &[U16, Str, Coded(Ci::TypeDefOrRef)],
        TableId::PropertyMap => &[Table(TableId::TypeDef), Table(TableId::Property)],
        TableId::PropertyPtr => &[Table(TableId::Property)],
        TableId::Property => &[U16, Str, Blob],
        TableId::MethodSemantics => &[U16, Table(TableId::MethodDef), Coded(Ci::HasSemantics)],
        TableId::MethodImpl => &[
            Table(TableId::TypeDef),
            Coded(Ci::MethodDefOrRef),
            Coded(Ci::MethodDefOrRef),
        ],
        TableId::ModuleRef => &[Str],
        TableId::TypeSpec => &[Blob],
        TableId::ImplMap => &[
            U16,
            Coded(Ci::MemberForwarded),
            Str,
            Table(TableId::ModuleRef),
        ],
        TableId::FieldRVA => &[U32, Table(TableId::Field)],
        TableId::EncLog => &[U32, U32],
        TableId::EncMap => &[U32],
        TableId::Assembly => &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
        TableId::AssemblyProcessor => &[U32],
        TableId::AssemblyOS => &[U32, U32, U32],
        TableId::AssemblyRef => &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
        TableId::AssemblyRefProcessor => &[U32, Table(TableId::AssemblyRef)],
        TableId::AssemblyRefOS => &[U32, U32, U32, Table(TableId::AssemblyRef)],
        TableId::File => &[U32, Str, Blob],
        TableId::ExportedType => &[U32, U32, Str, Str, Coded(Ci::Implementation)],
        TableId::ManifestResource => &[U32, U32, Str, Coded(Ci::Implementation)],
        TableId::NestedClass => &[Table(TableId::TypeDef), Table(TableId::TypeDef)],
        TableId::GenericParam => &[U16, U16, Coded(Ci::TypeOrMethodDef), Str],
        TableId::MethodSpec => &[Coded(Ci::MethodDefOrRef), Blob],
        TableId::GenericParamConstraint => &[
            Table(TableId::GenericParam),
            Coded(Ci::TypeDefOrRef),
        ],
        TableId::Document => &[Blob, Guid, Blob, Guid],
        TableId::MethodDebugInformation => &[Table(TableId::Document), Blob],
        TableId::LocalScope => &[
            Table(TableId::MethodDef),
            Table(TableId::ImportScope),
            Table(TableId::LocalVariable),
            Table(TableId::LocalConstant),
            U32,
            U32,
        ],
        TableId::LocalVariable => &[U16, U16, Str],
        TableId::LocalConstant => &[Str, Blob],
        TableId::ImportScope => &[Table(TableId::ImportScope), Blob],
        TableId::StateMachineMethod => &[Table(TableId::MethodDef), Table(TableId::MethodDef)],
        TableId::CustomDebugInformation => {
            &[Coded(Ci::HasCustomDebugInformation), Guid, Blob]
        }
    }
}

/// Byte size of one row of `table`
#[must_use]
pub fn row_size(table: TableId, info: &TableInfo) -> u32 {
    columns(table).iter().map(|column| column.size(info)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_layouts() {
        let info = TableInfo::new_test(&[], false, false, false);
        assert_eq!(row_size(TableId::Module, &info), 10);
        assert_eq!(row_size(TableId::TypeDef, &info), 14);
        assert_eq!(row_size(TableId::MethodDef, &info), 14);
        assert_eq!(row_size(TableId::Assembly, &info), 22);
        assert_eq!(row_size(TableId::Document, &info), 8);
        assert_eq!(row_size(TableId::LocalScope, &info), 16);
        assert_eq!(row_size(TableId::CustomDebugInformation, &info), 6);
    }

    #[test]
    fn large_layouts() {
        let info = TableInfo::new_test(
            &[(TableId::MethodDef, 0x10000), (TableId::Field, 0x10000)],
            true,
            true,
            true,
        );
        assert_eq!(row_size(TableId::TypeDef, &info), 4 + 4 + 4 + 2 + 4 + 4);
        assert_eq!(row_size(TableId::StateMachineMethod, &info), 8);
        assert_eq!(row_size(TableId::LocalScope, &info), 4 + 2 + 2 + 2 + 8);
    }
}
