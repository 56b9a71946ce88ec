//! Decoding Portable PDB containers.
//!
//! [`PortablePdb::parse`] reads a complete container into owned, decoded records: document names
//! are reassembled, embedded sources inflated, sequence point and imports blobs decoded, and
//! every custom debug information blob decoded by its kind. Row ids are kept so that references
//! between tables can be followed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotpdb::pdb::PortablePdb;
//!
//! let data = std::fs::read("App.pdb")?;
//! let pdb = PortablePdb::parse(&data)?;
//! println!("PDB {}", pdb.id);
//! for document in &pdb.documents {
//!     println!("{} ({} bytes of source)", document.name, document.source.as_ref().map_or(0, String::len));
//! }
//! # Ok::<(), dotpdb::Error>(())
//! ```

use serde::Serialize;
use uguid::Guid;

use crate::{
    file::io::read_le_at,
    metadata::{
        customdebuginformation::{parse_custom_debug_blob, CustomDebugInfo, CustomDebugKind},
        importscope::{parse_imports_blob, ImportsInfo},
        root::Root,
        sequencepoints::{parse_sequence_points_with, SequencePoints},
        streams::{Blob, Guid as GuidHeap, Strings, TableSummary, TablesHeader},
        tables::{
            CodedIndex, CustomDebugInformationRaw, DocumentRaw, ImportScopeRaw, LocalScopeRaw,
            LocalVariableRaw, MethodDebugInformationRaw, StateMachineMethodRaw, TableId,
            TABLE_SLOTS,
        },
        token::Token,
    },
    pdb::{
        contentid::{ContentId, CONTENT_ID_SIZE},
        document::decode_document_name,
        serializer::PDB_STREAM,
    },
    Error::OutOfBounds,
    Result,
};

const EMPTY_HEAP: &[u8] = &[0];

/// A decoded `Document` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbDocument {
    /// Row id
    pub row: u32,
    /// Path, reassembled from the name blob
    pub name: String,
    /// Algorithm of `hash`
    #[serde(serialize_with = "serialize_guid")]
    pub hash_algorithm: Guid,
    /// Hash of the source
    pub hash: Vec<u8>,
    /// Source language
    #[serde(serialize_with = "serialize_guid")]
    pub language: Guid,
    /// Embedded source text, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A decoded `MethodDebugInformation` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbMethod {
    /// The `MethodDef` this row describes
    pub method: Token,
    /// Document row, 0 when none or when the blob names it
    pub document: u32,
    /// Decoded sequence points, `None` for an empty row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_points: Option<SequencePoints>,
}

/// A decoded `LocalScope` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbLocalScope {
    /// Row id
    pub row: u32,
    /// The `MethodDef` the scope belongs to
    pub method: Token,
    /// `ImportScope` row
    pub import_scope: u32,
    /// First IL offset
    pub start_offset: u32,
    /// Length in bytes
    pub length: u32,
    /// Variables owned by the scope
    pub variables: Vec<PdbLocalVariable>,
}

/// A decoded `LocalVariable` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbLocalVariable {
    /// Slot in the local signature
    pub index: u16,
    /// Name
    pub name: String,
    /// Raw attributes
    pub attributes: u16,
}

/// A decoded `ImportScope` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbImportScope {
    /// Row id
    pub row: u32,
    /// Parent row, 0 for the root
    pub parent: u32,
    /// Decoded imports
    pub imports: ImportsInfo,
}

/// A decoded `StateMachineMethod` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PdbStateMachine {
    /// The `MoveNext` method
    pub move_next: Token,
    /// The user-written method
    pub kickoff: Token,
}

/// A decoded `CustomDebugInformation` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbCustomDebugInfo {
    /// Row id
    pub row: u32,
    /// The row the information is attached to
    pub parent: Token,
    /// Kind
    pub kind: CustomDebugKind,
    /// Decoded value
    pub value: CustomDebugInfo,
}

/// A decoded Portable PDB
#[derive(Debug, Clone, Serialize)]
pub struct PortablePdb {
    /// The `PdbId`
    pub id: ContentId,
    /// Entry point of the assembly, nil for libraries
    pub entry_point: Token,
    /// Row counts of the assembly's type-system tables, by table id
    #[serde(skip)]
    pub type_system_rows: [u32; TABLE_SLOTS],
    /// Row counts of the PDB's own tables
    #[serde(skip)]
    pub tables: Vec<TableSummary>,
    /// `Document` rows
    pub documents: Vec<PdbDocument>,
    /// `MethodDebugInformation` rows, one per `MethodDef`
    pub methods: Vec<PdbMethod>,
    /// `LocalScope` rows
    pub local_scopes: Vec<PdbLocalScope>,
    /// `ImportScope` rows
    pub import_scopes: Vec<PdbImportScope>,
    /// `StateMachineMethod` rows
    pub state_machines: Vec<PdbStateMachine>,
    /// `CustomDebugInformation` rows
    pub custom_debug_information: Vec<PdbCustomDebugInfo>,
}

fn serialize_guid<S: serde::Serializer>(
    guid: &Guid,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(guid)
}

fn parent_token(parent: &CodedIndex) -> Token {
    Token::from_parts(parent.tag, parent.row)
}

impl PortablePdb {
    /// Parse a container
    ///
    /// # Errors
    /// Returns an error if the container is truncated, lacks the `#Pdb` or `#~` stream, or any
    /// row or blob fails to decode.
    pub fn parse(data: &[u8]) -> Result<PortablePdb> {
        let root = Root::read(data)?;

        let Some(pdb_stream) = root.stream_data(data, PDB_STREAM) else {
            return Err(malformed_error!("Not a Portable PDB, no {} stream", PDB_STREAM));
        };
        let Some(tables_stream) = root
            .stream_data(data, "#~")
            .or_else(|| root.stream_data(data, "#-"))
        else {
            return Err(malformed_error!("Portable PDB has no tables stream"));
        };

        let strings = Strings::from(root.stream_data(data, "#Strings").unwrap_or(EMPTY_HEAP))?;
        let blobs = Blob::from(root.stream_data(data, "#Blob").unwrap_or(EMPTY_HEAP))?;
        let guids = GuidHeap::from(root.stream_data(data, "#GUID").unwrap_or(&[]))?;

        if pdb_stream.len() < CONTENT_ID_SIZE + 12 {
            return Err(OutOfBounds);
        }
        let id = ContentId::from_bytes(pdb_stream)?;
        let mut offset = CONTENT_ID_SIZE;
        let entry_point = Token::new(read_le_at::<u32>(pdb_stream, &mut offset)?);
        let referenced = read_le_at::<u64>(pdb_stream, &mut offset)?;
        let mut type_system_rows = [0u32; TABLE_SLOTS];
        for (slot, rows) in type_system_rows.iter_mut().enumerate() {
            if referenced & (1u64 << slot) != 0 {
                *rows = read_le_at::<u32>(pdb_stream, &mut offset)?;
            }
        }

        let header = TablesHeader::from_pdb(tables_stream, &type_system_rows)?;

        let mut pdb = PortablePdb {
            id,
            entry_point,
            type_system_rows,
            tables: header.table_summary(),
            documents: Vec::new(),
            methods: Vec::new(),
            local_scopes: Vec::new(),
            import_scopes: Vec::new(),
            state_machines: Vec::new(),
            custom_debug_information: Vec::new(),
        };

        if let Some(table) = header.table::<DocumentRaw>(TableId::Document) {
            for row in &table {
                let name_blob = blobs.get(row.name as usize)?;
                pdb.documents.push(PdbDocument {
                    row: row.rid,
                    name: decode_document_name(name_blob, &blobs)?,
                    hash_algorithm: guids.get(row.hash_algorithm as usize)?,
                    hash: blobs.get(row.hash as usize)?.to_vec(),
                    language: guids.get(row.language as usize)?,
                    source: None,
                });
            }
        }

        if let Some(table) =
            header.table::<MethodDebugInformationRaw>(TableId::MethodDebugInformation)
        {
            for row in &table {
                let sequence_points = if row.sequence_points == 0 {
                    None
                } else {
                    let blob = blobs.get(row.sequence_points as usize)?;
                    Some(parse_sequence_points_with(blob, row.document == 0)?)
                };
                pdb.methods.push(PdbMethod {
                    method: Token::method_def(row.rid),
                    document: row.document,
                    sequence_points,
                });
            }
        }

        let variables: Vec<LocalVariableRaw> = header
            .table::<LocalVariableRaw>(TableId::LocalVariable)
            .map(|table| table.iter().collect())
            .unwrap_or_default();
        if let Some(table) = header.table::<LocalScopeRaw>(TableId::LocalScope) {
            let scopes: Vec<LocalScopeRaw> = table.iter().collect();
            for (index, row) in scopes.iter().enumerate() {
                let first = row.variable_list as usize;
                let end = scopes
                    .get(index + 1)
                    .map_or(variables.len() + 1, |next| next.variable_list as usize);

                let mut owned = Vec::new();
                for variable in variables
                    .iter()
                    .skip(first.saturating_sub(1))
                    .take(end.saturating_sub(first))
                {
                    owned.push(PdbLocalVariable {
                        index: variable.index,
                        name: strings.get(variable.name as usize)?.to_string(),
                        attributes: variable.attributes,
                    });
                }

                pdb.local_scopes.push(PdbLocalScope {
                    row: row.rid,
                    method: Token::method_def(row.method),
                    import_scope: row.import_scope,
                    start_offset: row.start_offset,
                    length: row.length,
                    variables: owned,
                });
            }
        }

        if let Some(table) = header.table::<ImportScopeRaw>(TableId::ImportScope) {
            for row in &table {
                let imports = if row.imports == 0 {
                    ImportsInfo::default()
                } else {
                    parse_imports_blob(blobs.get(row.imports as usize)?, &blobs)?
                };
                pdb.import_scopes.push(PdbImportScope {
                    row: row.rid,
                    parent: row.parent,
                    imports,
                });
            }
        }

        if let Some(table) = header.table::<StateMachineMethodRaw>(TableId::StateMachineMethod) {
            for row in &table {
                pdb.state_machines.push(PdbStateMachine {
                    move_next: Token::method_def(row.move_next_method),
                    kickoff: Token::method_def(row.kickoff_method),
                });
            }
        }

        if let Some(table) =
            header.table::<CustomDebugInformationRaw>(TableId::CustomDebugInformation)
        {
            for row in &table {
                let kind = CustomDebugKind::from_guid(guids.get(row.kind as usize)?);
                let value = parse_custom_debug_blob(blobs.get(row.value as usize)?, kind)?;

                if let CustomDebugInfo::EmbeddedSource { content, .. } = &value {
                    if row.parent.tag == TableId::Document {
                        if let Some(document) = pdb
                            .documents
                            .iter_mut()
                            .find(|document| document.row == row.parent.row)
                        {
                            document.source = Some(content.clone());
                        }
                    }
                }

                pdb.custom_debug_information.push(PdbCustomDebugInfo {
                    row: row.rid,
                    parent: parent_token(&row.parent),
                    kind,
                    value,
                });
            }
        }

        Ok(pdb)
    }

    /// Look up a document by row id
    #[must_use]
    pub fn document(&self, row: u32) -> Option<&PdbDocument> {
        self.documents.iter().find(|document| document.row == row)
    }

    /// Look up a document by path
    #[must_use]
    pub fn document_by_name(&self, name: &str) -> Option<&PdbDocument> {
        self.documents.iter().find(|document| document.name == name)
    }

    /// The debug row of a method
    #[must_use]
    pub fn method(&self, method: Token) -> Option<&PdbMethod> {
        if !method.is_table(TableId::MethodDef) {
            return None;
        }
        self.methods.get((method.row() as usize).checked_sub(1)?)
    }

    /// Local scopes of a method, in table order
    pub fn local_scopes_of(&self, method: Token) -> impl Iterator<Item = &PdbLocalScope> {
        self.local_scopes
            .iter()
            .filter(move |scope| scope.method == method)
    }

    /// Custom debug information attached to `parent`
    pub fn custom_debug_information_of(
        &self,
        parent: Token,
    ) -> impl Iterator<Item = &PdbCustomDebugInfo> {
        self.custom_debug_information
            .iter()
            .filter(move |info| info.parent == parent)
    }

    /// Row count of one of the PDB's tables
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.tables
            .iter()
            .find(|summary| summary.table_id == table)
            .map_or(0, |summary| summary.row_count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        metadata::{
            customdebuginformation::{encode_async_stepping, AsyncStepInfo, AwaitPoint},
            sequencepoints::{encode_sequence_points, SequencePoint},
            tables::LocalVariableAttributes,
        },
        pdb::{
            builder::{LocalVariableInfo, PdbBuilder, GLOBAL_IMPORT_SCOPE},
            document::SourceDocument,
            serializer::serialize,
        },
    };

    fn type_system_rows(methods: u32) -> [u32; TABLE_SLOTS] {
        let mut rows = [0u32; TABLE_SLOTS];
        rows[TableId::Module as usize] = 1;
        rows[TableId::MethodDef as usize] = methods;
        rows
    }

    #[test]
    fn round_trip() {
        let mut builder = PdbBuilder::new().unwrap();
        let source = "namespace App { class Program { static void Main() {} } }";
        let document = builder
            .add_document(&SourceDocument::new("App/Program.cs", source).unwrap())
            .unwrap();

        let points = [SequencePoint::new(0, 1, 1, 1, 20), SequencePoint::hidden(10)];
        let blob = encode_sequence_points(0, &points).unwrap().unwrap();
        builder
            .add_method_debug_information(Token::method_def(1), document, Some(&blob))
            .unwrap();

        let namespaces: BTreeSet<String> = ["System".to_string()].into();
        let scope = builder
            .add_import_scope(GLOBAL_IMPORT_SCOPE, &namespaces)
            .unwrap();
        builder
            .add_local_scope(
                Token::method_def(1),
                scope,
                0,
                12,
                &[LocalVariableInfo {
                    index: 0,
                    name: "args".to_string(),
                    attributes: LocalVariableAttributes::empty(),
                }],
            )
            .unwrap();
        builder
            .add_local_scope(Token::method_def(2), scope, 0, 30, &[])
            .unwrap();

        builder
            .add_state_machine_method(Token::method_def(2), Token::method_def(1))
            .unwrap();
        let stepping = encode_async_stepping(
            &AsyncStepInfo {
                catch_handler_offset: None,
                awaits: vec![AwaitPoint {
                    yield_offset: 4,
                    resume_offset: 8,
                    resume_method: Token::method_def(2),
                }],
            },
            Token::method_def(2),
        )
        .unwrap();
        builder
            .add_custom_debug_information(
                CodedIndex::new(TableId::MethodDef, 2),
                CustomDebugKind::AsyncMethodSteppingInformation,
                &stepping,
            )
            .unwrap();

        let tables = builder.finish(2).unwrap();
        let id = ContentId::new(uguid::guid!("01234567-89ab-cdef-0123-456789abcdef"), 5);
        let data = serialize(&tables, id, Token::method_def(1), &type_system_rows(2)).unwrap();

        let pdb = PortablePdb::parse(&data).unwrap();
        assert_eq!(pdb.id, id);
        assert_eq!(pdb.entry_point, Token::method_def(1));
        assert_eq!(pdb.type_system_rows[TableId::MethodDef as usize], 2);

        let doc = pdb.document_by_name("App/Program.cs").unwrap();
        assert_eq!(doc.source.as_deref(), Some(source));
        assert_eq!(doc.hash.len(), 32);

        let main = pdb.method(Token::method_def(1)).unwrap();
        assert_eq!(main.document, document);
        assert_eq!(main.sequence_points.as_ref().unwrap().points, points);
        assert!(pdb.method(Token::method_def(2)).unwrap().sequence_points.is_none());

        assert_eq!(pdb.import_scopes.len(), 2);
        assert_eq!(
            pdb.import_scopes[1].imports.namespaces().collect::<Vec<_>>(),
            ["System"]
        );

        let scopes: Vec<&PdbLocalScope> = pdb.local_scopes_of(Token::method_def(1)).collect();
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].import_scope, scope);
        assert_eq!(scopes[0].variables[0].name, "args");
        assert!(pdb
            .local_scopes_of(Token::method_def(2))
            .all(|scope| scope.variables.is_empty()));

        assert_eq!(
            pdb.state_machines,
            [PdbStateMachine {
                move_next: Token::method_def(2),
                kickoff: Token::method_def(1),
            }]
        );
        let async_info: Vec<&PdbCustomDebugInfo> = pdb
            .custom_debug_information_of(Token::method_def(2))
            .collect();
        assert_eq!(async_info.len(), 1);
        assert!(matches!(
            &async_info[0].value,
            CustomDebugInfo::AsyncMethodStepping(info) if info.awaits.len() == 1
        ));
        assert_eq!(pdb.row_count(TableId::CustomDebugInformation), 2);
    }

    #[test]
    fn rejects_other_metadata() {
        assert!(PortablePdb::parse(&[]).is_err());
        assert!(PortablePdb::parse(&[0u8; 64]).is_err());

        let data = Root::write_with_streams("v4.0.30319", &[("#Strings", &[0, 0, 0, 0])]).unwrap();
        assert!(PortablePdb::parse(&data).is_err());
    }
}
