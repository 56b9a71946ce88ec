//! Accumulates the rows and heaps of a Portable PDB.
//!
//! [`PdbBuilder`] is the single owner of all debug records of a generation run. Per-file results
//! are merged into it one after another; [`PdbBuilder::finish`] then lays out the
//! `MethodDebugInformation` table (one row per `MethodDef`), sorts `LocalScope`,
//! `StateMachineMethod` and `CustomDebugInformation` by their primary key and checks the order
//! before anything is serialized.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    metadata::{
        customdebuginformation::CustomDebugKind,
        importscope::encode_imports,
        streams::{BlobBuilder, GuidBuilder, StringsBuilder},
        tables::{
            CodedIndex, CodedIndexType, CustomDebugInformationRaw, DocumentRaw, ImportScopeRaw,
            LocalConstantRaw, LocalScopeRaw, LocalVariableAttributes, LocalVariableRaw,
            MethodDebugInformationRaw, StateMachineMethodRaw, TableId,
        },
        token::Token,
    },
    pdb::document::{encode_document_name, SourceDocument, HASH_ALGORITHM_SHA256, LANGUAGE_CSHARP},
    Error, Result,
};

/// Row of the global import scope, the root of every import scope tree
pub const GLOBAL_IMPORT_SCOPE: u32 = 1;

/// A local variable of a local scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableInfo {
    /// Slot in the method's local signature
    pub index: u16,
    /// Name
    pub name: String,
    /// `DebuggerHidden` and friends
    pub attributes: LocalVariableAttributes,
}

#[derive(Debug, Clone)]
struct LocalScopeEntry {
    method: u32,
    import_scope: u32,
    start_offset: u32,
    length: u32,
    variables: Vec<LocalVariableRaw>,
}

#[derive(Debug, Clone, Copy)]
struct MethodDebugEntry {
    document: u32,
    sequence_points: u32,
}

/// Finished, sorted tables and heaps, ready to serialize
#[derive(Debug, Clone, Default)]
pub struct PdbTables {
    /// `Document` rows
    pub documents: Vec<DocumentRaw>,
    /// `MethodDebugInformation` rows, one per `MethodDef`
    pub method_debug_information: Vec<MethodDebugInformationRaw>,
    /// `LocalScope` rows, sorted
    pub local_scopes: Vec<LocalScopeRaw>,
    /// `LocalVariable` rows
    pub local_variables: Vec<LocalVariableRaw>,
    /// `LocalConstant` rows
    pub local_constants: Vec<LocalConstantRaw>,
    /// `ImportScope` rows
    pub import_scopes: Vec<ImportScopeRaw>,
    /// `StateMachineMethod` rows, sorted
    pub state_machine_methods: Vec<StateMachineMethodRaw>,
    /// `CustomDebugInformation` rows, sorted
    pub custom_debug_information: Vec<CustomDebugInformationRaw>,
    /// `#Strings` heap, padded
    pub strings: Vec<u8>,
    /// `#Blob` heap, padded
    pub blobs: Vec<u8>,
    /// `#GUID` heap
    pub guids: Vec<u8>,
}

impl PdbTables {
    /// Row counts of the debug tables, indexed by table id
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        let count = match table {
            TableId::Document => self.documents.len(),
            TableId::MethodDebugInformation => self.method_debug_information.len(),
            TableId::LocalScope => self.local_scopes.len(),
            TableId::LocalVariable => self.local_variables.len(),
            TableId::LocalConstant => self.local_constants.len(),
            TableId::ImportScope => self.import_scopes.len(),
            TableId::StateMachineMethod => self.state_machine_methods.len(),
            TableId::CustomDebugInformation => self.custom_debug_information.len(),
            _ => 0,
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Number of methods that have a sequence point blob
    #[must_use]
    pub fn methods_with_sequence_points(&self) -> usize {
        self.method_debug_information
            .iter()
            .filter(|row| row.sequence_points != 0)
            .count()
    }
}

fn row_id(len: usize) -> Result<u32> {
    u32::try_from(len + 1)
        .ok()
        .filter(|rid| *rid <= 0x00FF_FFFF)
        .ok_or_else(|| malformed_error!("Table exceeds the 24-bit row range"))
}

/// Collects debug records and heap entries
///
/// # Examples
///
/// ```rust
/// use dotpdb::pdb::{PdbBuilder, SourceDocument, GLOBAL_IMPORT_SCOPE};
/// use dotpdb::metadata::token::Token;
///
/// let mut builder = PdbBuilder::new()?;
/// let document = builder.add_document(&SourceDocument::new("App/Program.cs", "class Program {}")?)?;
/// builder.add_method_debug_information(Token::method_def(1), document, None)?;
/// builder.add_local_scope(Token::method_def(1), GLOBAL_IMPORT_SCOPE, 0, 12, &[])?;
///
/// let tables = builder.finish(1)?;
/// assert_eq!(tables.method_debug_information.len(), 1);
/// assert_eq!(tables.local_scopes[0].variable_list, 1);
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub struct PdbBuilder {
    strings: StringsBuilder,
    blobs: BlobBuilder,
    guids: GuidBuilder,
    documents: Vec<DocumentRaw>,
    document_rows: FxHashMap<String, u32>,
    methods: FxHashMap<u32, MethodDebugEntry>,
    import_scopes: Vec<ImportScopeRaw>,
    local_scopes: Vec<LocalScopeEntry>,
    local_scope_keys: FxHashSet<(u32, u32, u32)>,
    state_machines: Vec<(u32, u32)>,
    custom_debug_information: Vec<(CodedIndex, u32, u32)>,
}

impl PdbBuilder {
    /// Create a builder holding only the global import scope
    ///
    /// # Errors
    /// Never fails in practice; the global scope row is created through the regular path.
    pub fn new() -> Result<Self> {
        let mut builder = PdbBuilder {
            strings: StringsBuilder::new(),
            blobs: BlobBuilder::new(),
            guids: GuidBuilder::new(),
            documents: Vec::new(),
            document_rows: FxHashMap::default(),
            methods: FxHashMap::default(),
            import_scopes: Vec::new(),
            local_scopes: Vec::new(),
            local_scope_keys: FxHashSet::default(),
            state_machines: Vec::new(),
            custom_debug_information: Vec::new(),
        };
        builder.push_import_scope(0, 0)?;
        Ok(builder)
    }

    /// Add a document and its embedded source, returning the `Document` row
    ///
    /// # Errors
    /// Returns [`Error::DuplicateDocument`] if a document with the same path was already added.
    pub fn add_document(&mut self, document: &SourceDocument) -> Result<u32> {
        if self.document_rows.contains_key(&document.path) {
            return Err(Error::DuplicateDocument(document.path.clone()));
        }

        let rid = row_id(self.documents.len())?;
        let name_blob = encode_document_name(&document.path, &mut self.blobs)?;
        let row = DocumentRaw {
            rid,
            token: Token::from_parts(TableId::Document, rid),
            offset: 0,
            name: self.blobs.add(&name_blob)?,
            hash_algorithm: self.guids.add(HASH_ALGORITHM_SHA256)?,
            hash: self.blobs.add(&document.hash)?,
            language: self.guids.add(LANGUAGE_CSHARP)?,
        };
        self.documents.push(row);
        self.document_rows.insert(document.path.clone(), rid);

        self.add_custom_debug_information(
            CodedIndex::new(TableId::Document, rid),
            CustomDebugKind::EmbeddedSource,
            &document.embedded_source,
        )?;
        Ok(rid)
    }

    /// The `Document` row of a path, if added
    #[must_use]
    pub fn document_row(&self, path: &str) -> Option<u32> {
        self.document_rows.get(path).copied()
    }

    fn push_import_scope(&mut self, parent: u32, imports: u32) -> Result<u32> {
        let rid = row_id(self.import_scopes.len())?;
        self.import_scopes.push(ImportScopeRaw {
            rid,
            token: Token::from_parts(TableId::ImportScope, rid),
            offset: 0,
            parent,
            imports,
        });
        Ok(rid)
    }

    /// Add an import scope, returning its `ImportScope` row
    ///
    /// ## Arguments
    /// * 'parent'     - Row of the enclosing scope, [`GLOBAL_IMPORT_SCOPE`] at the top
    /// * 'namespaces' - Imported namespaces, written in set order
    ///
    /// # Errors
    /// Returns an error if `parent` is not an existing row or the imports blob cannot be encoded.
    pub fn add_import_scope(&mut self, parent: u32, namespaces: &BTreeSet<String>) -> Result<u32> {
        if parent == 0 || parent as usize > self.import_scopes.len() {
            return Err(malformed_error!("Invalid parent import scope - {}", parent));
        }

        let blob = encode_imports(namespaces.iter().map(String::as_str), &mut self.blobs)?;
        let imports = self.blobs.add(&blob)?;
        self.push_import_scope(parent, imports)
    }

    /// True if debug information for the method was already added
    #[must_use]
    pub fn has_method_debug_information(&self, method: Token) -> bool {
        self.methods.contains_key(&method.row())
    }

    /// Record the sequence points of a method
    ///
    /// Methods without a blob get an empty row regardless of `document`. Returns `false` and
    /// changes nothing if the method was already recorded.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMethod`] for tokens other than `MethodDef`.
    pub fn add_method_debug_information(
        &mut self,
        method: Token,
        document: u32,
        sequence_points: Option<&[u8]>,
    ) -> Result<bool> {
        if !method.is_table(TableId::MethodDef) {
            return Err(Error::InvalidMethod(method));
        }
        if self.methods.contains_key(&method.row()) {
            return Ok(false);
        }

        let entry = match sequence_points {
            Some(blob) => MethodDebugEntry {
                document,
                sequence_points: self.blobs.add(blob)?,
            },
            None => MethodDebugEntry {
                document: 0,
                sequence_points: 0,
            },
        };
        self.methods.insert(method.row(), entry);
        Ok(true)
    }

    /// Record a local scope
    ///
    /// Returns `false` and changes nothing if the method already has a scope over the same range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMethod`] for tokens other than `MethodDef`, or an error if a
    /// variable name cannot be interned.
    pub fn add_local_scope(
        &mut self,
        method: Token,
        import_scope: u32,
        start_offset: u32,
        length: u32,
        variables: &[LocalVariableInfo],
    ) -> Result<bool> {
        if !method.is_table(TableId::MethodDef) {
            return Err(Error::InvalidMethod(method));
        }
        if !self
            .local_scope_keys
            .insert((method.row(), start_offset, length))
        {
            return Ok(false);
        }

        let mut rows = Vec::with_capacity(variables.len());
        for variable in variables {
            rows.push(LocalVariableRaw {
                rid: 0,
                token: Token::default(),
                offset: 0,
                attributes: variable.attributes.bits(),
                index: variable.index,
                name: self.strings.add(&variable.name)?,
            });
        }
        rows.sort_by_key(|row| row.index);

        self.local_scopes.push(LocalScopeEntry {
            method: method.row(),
            import_scope,
            start_offset,
            length,
            variables: rows,
        });
        Ok(true)
    }

    /// Record a `(MoveNext, kickoff)` pair
    ///
    /// # Errors
    /// Returns [`Error::InvalidMethod`] if either token is not a `MethodDef`.
    pub fn add_state_machine_method(&mut self, move_next: Token, kickoff: Token) -> Result<()> {
        for method in [move_next, kickoff] {
            if !method.is_table(TableId::MethodDef) {
                return Err(Error::InvalidMethod(method));
            }
        }

        self.state_machines.push((move_next.row(), kickoff.row()));
        Ok(())
    }

    /// Attach a custom debug information blob
    ///
    /// # Errors
    /// Returns an error if the parent cannot carry custom debug information or the heaps overflow.
    pub fn add_custom_debug_information(
        &mut self,
        parent: CodedIndex,
        kind: CustomDebugKind,
        value: &[u8],
    ) -> Result<()> {
        parent.encode(CodedIndexType::HasCustomDebugInformation)?;

        let kind = self.guids.add(kind.guid())?;
        let value = self.blobs.add(value)?;
        self.custom_debug_information.push((parent, kind, value));
        Ok(())
    }

    /// Number of import scope rows so far, the global scope included
    #[must_use]
    pub fn import_scope_count(&self) -> usize {
        self.import_scopes.len()
    }

    /// Lay out and sort all tables
    ///
    /// ## Arguments
    /// * 'method_count' - Number of `MethodDef` rows of the module
    ///
    /// # Errors
    /// Returns [`Error::InvalidMethod`] if a record names a method past `method_count`, or a
    /// malformed error if a sorted table ends up out of order.
    pub fn finish(self, method_count: u32) -> Result<PdbTables> {
        let mut tables = PdbTables {
            documents: self.documents,
            import_scopes: self.import_scopes,
            ..PdbTables::default()
        };

        if let Some(row) = self.methods.keys().filter(|row| **row > method_count).min() {
            return Err(Error::InvalidMethod(Token::method_def(*row)));
        }

        for rid in 1..=method_count {
            let entry = self.methods.get(&rid).copied().unwrap_or(MethodDebugEntry {
                document: 0,
                sequence_points: 0,
            });
            tables.method_debug_information.push(MethodDebugInformationRaw {
                rid,
                token: Token::from_parts(TableId::MethodDebugInformation, rid),
                offset: 0,
                document: entry.document,
                sequence_points: entry.sequence_points,
            });
        }

        let mut local_scopes = self.local_scopes;
        local_scopes.sort_by(|a, b| {
            a.method
                .cmp(&b.method)
                .then(a.start_offset.cmp(&b.start_offset))
                .then(b.length.cmp(&a.length))
        });
        for scope in local_scopes {
            if scope.method > method_count {
                return Err(Error::InvalidMethod(Token::method_def(scope.method)));
            }

            let rid = row_id(tables.local_scopes.len())?;
            let variable_list = row_id(tables.local_variables.len())?;
            for mut variable in scope.variables {
                variable.rid = row_id(tables.local_variables.len())?;
                variable.token = Token::from_parts(TableId::LocalVariable, variable.rid);
                tables.local_variables.push(variable);
            }

            tables.local_scopes.push(LocalScopeRaw {
                rid,
                token: Token::from_parts(TableId::LocalScope, rid),
                offset: 0,
                method: scope.method,
                import_scope: scope.import_scope,
                variable_list,
                constant_list: row_id(tables.local_constants.len())?,
                start_offset: scope.start_offset,
                length: scope.length,
            });
        }

        let mut state_machines = self.state_machines;
        state_machines.sort_by_key(|(move_next, _)| *move_next);
        for (move_next_method, kickoff_method) in state_machines {
            let rid = row_id(tables.state_machine_methods.len())?;
            tables.state_machine_methods.push(StateMachineMethodRaw {
                rid,
                token: Token::from_parts(TableId::StateMachineMethod, rid),
                offset: 0,
                move_next_method,
                kickoff_method,
            });
        }

        let mut custom_debug_information = Vec::with_capacity(self.custom_debug_information.len());
        for (parent, kind, value) in self.custom_debug_information {
            let key = parent.encode(CodedIndexType::HasCustomDebugInformation)?;
            custom_debug_information.push((key, parent, kind, value));
        }
        custom_debug_information.sort_by_key(|(key, ..)| *key);
        for (_, parent, kind, value) in custom_debug_information {
            let rid = row_id(tables.custom_debug_information.len())?;
            tables
                .custom_debug_information
                .push(CustomDebugInformationRaw {
                    rid,
                    token: Token::from_parts(TableId::CustomDebugInformation, rid),
                    offset: 0,
                    parent,
                    kind,
                    value,
                });
        }

        verify_sorted(&tables)?;

        tables.strings = self.strings.into_bytes();
        tables.blobs = self.blobs.into_bytes();
        tables.guids = self.guids.into_bytes();
        Ok(tables)
    }
}

/// Check the ordering of the tables flagged as sorted
///
/// # Errors
/// Returns a malformed error naming the first pair of rows that is out of order.
pub fn verify_sorted(tables: &PdbTables) -> Result<()> {
    for pair in tables.local_scopes.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let ordered = a.method < b.method
            || (a.method == b.method
                && (a.start_offset < b.start_offset
                    || (a.start_offset == b.start_offset && a.length >= b.length)));
        if !ordered {
            return Err(malformed_error!(
                "LocalScope rows {} and {} are out of order",
                a.rid,
                b.rid
            ));
        }
    }

    for pair in tables.state_machine_methods.windows(2) {
        if pair[0].move_next_method > pair[1].move_next_method {
            return Err(malformed_error!(
                "StateMachineMethod rows {} and {} are out of order",
                pair[0].rid,
                pair[1].rid
            ));
        }
    }

    for pair in tables.custom_debug_information.windows(2) {
        let a = pair[0].parent.encode(CodedIndexType::HasCustomDebugInformation)?;
        let b = pair[1].parent.encode(CodedIndexType::HasCustomDebugInformation)?;
        if a > b {
            return Err(malformed_error!(
                "CustomDebugInformation rows {} and {} are out of order",
                pair[0].rid,
                pair[1].rid
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(path: &str) -> SourceDocument {
        SourceDocument::new(path, "class C {}").unwrap()
    }

    #[test]
    fn global_import_scope() {
        let builder = PdbBuilder::new().unwrap();
        assert_eq!(builder.import_scope_count(), 1);

        let tables = builder.finish(0).unwrap();
        assert_eq!(tables.import_scopes[0].parent, 0);
        assert_eq!(tables.import_scopes[0].imports, 0);
    }

    #[test]
    fn documents() {
        let mut builder = PdbBuilder::new().unwrap();
        assert_eq!(builder.add_document(&document("A.cs")).unwrap(), 1);
        assert_eq!(builder.add_document(&document("B.cs")).unwrap(), 2);
        assert!(matches!(
            builder.add_document(&document("A.cs")),
            Err(Error::DuplicateDocument(_))
        ));
        assert_eq!(builder.document_row("B.cs"), Some(2));

        let tables = builder.finish(0).unwrap();
        assert_eq!(tables.documents.len(), 2);
        // same source text, same hash blob
        assert_eq!(tables.documents[0].hash, tables.documents[1].hash);
        assert_eq!(tables.documents[0].hash_algorithm, 1);
        assert_eq!(tables.documents[0].language, 2);
        assert_eq!(tables.custom_debug_information.len(), 2);
        assert_eq!(tables.custom_debug_information[0].parent.tag, TableId::Document);
    }

    #[test]
    fn import_scopes() {
        let mut builder = PdbBuilder::new().unwrap();
        let namespaces: BTreeSet<String> =
            ["System".to_string(), "System.Linq".to_string()].into();

        let outer = builder
            .add_import_scope(GLOBAL_IMPORT_SCOPE, &namespaces)
            .unwrap();
        let inner = builder.add_import_scope(outer, &BTreeSet::new()).unwrap();
        assert_eq!((outer, inner), (2, 3));
        assert!(builder.add_import_scope(9, &namespaces).is_err());
        assert!(builder.add_import_scope(0, &namespaces).is_err());

        let tables = builder.finish(0).unwrap();
        assert_eq!(tables.import_scopes[2].parent, 2);
        assert_ne!(tables.import_scopes[1].imports, 0);
        assert_eq!(tables.import_scopes[2].imports, 0);
    }

    #[test]
    fn method_rows() {
        let mut builder = PdbBuilder::new().unwrap();
        let doc = builder.add_document(&document("A.cs")).unwrap();

        assert!(builder
            .add_method_debug_information(Token::method_def(2), doc, Some(&[0, 0, 1, 2, 2]))
            .unwrap());
        assert!(!builder
            .add_method_debug_information(Token::method_def(2), doc, None)
            .unwrap());
        assert!(builder
            .add_method_debug_information(Token::method_def(3), doc, None)
            .unwrap());
        assert!(builder.has_method_debug_information(Token::method_def(3)));
        assert!(builder
            .add_method_debug_information(Token::type_def(1), doc, None)
            .is_err());

        let tables = builder.finish(4).unwrap();
        assert_eq!(tables.method_debug_information.len(), 4);
        assert_eq!(tables.method_debug_information[0].document, 0);
        assert_eq!(tables.method_debug_information[1].document, doc);
        assert_ne!(tables.method_debug_information[1].sequence_points, 0);
        assert_eq!(tables.method_debug_information[2].document, 0);
        assert_eq!(tables.method_debug_information[2].sequence_points, 0);
        assert_eq!(tables.methods_with_sequence_points(), 1);
    }

    #[test]
    fn method_out_of_range() {
        let mut builder = PdbBuilder::new().unwrap();
        builder
            .add_method_debug_information(Token::method_def(5), 0, None)
            .unwrap();
        assert!(matches!(builder.finish(4), Err(Error::InvalidMethod(_))));
    }

    #[test]
    fn local_scope_order() {
        let mut builder = PdbBuilder::new().unwrap();
        let variables = [
            LocalVariableInfo {
                index: 1,
                name: "b".to_string(),
                attributes: LocalVariableAttributes::empty(),
            },
            LocalVariableInfo {
                index: 0,
                name: "a".to_string(),
                attributes: LocalVariableAttributes::empty(),
            },
        ];

        builder
            .add_local_scope(Token::method_def(3), 1, 0, 10, &[])
            .unwrap();
        builder
            .add_local_scope(Token::method_def(1), 1, 4, 2, &[])
            .unwrap();
        builder
            .add_local_scope(Token::method_def(1), 1, 0, 8, &variables)
            .unwrap();
        builder
            .add_local_scope(Token::method_def(1), 1, 0, 20, &[])
            .unwrap();

        let tables = builder.finish(3).unwrap();
        let order: Vec<(u32, u32, u32)> = tables
            .local_scopes
            .iter()
            .map(|scope| (scope.method, scope.start_offset, scope.length))
            .collect();
        assert_eq!(order, [(1, 0, 20), (1, 0, 8), (1, 4, 2), (3, 0, 10)]);

        let variable_lists: Vec<u32> = tables
            .local_scopes
            .iter()
            .map(|scope| scope.variable_list)
            .collect();
        assert_eq!(variable_lists, [1, 1, 3, 3]);
        assert_eq!(tables.local_variables.len(), 2);
        assert_eq!(tables.local_variables[0].index, 0);
        assert_eq!(tables.local_scopes[0].constant_list, 1);
    }

    #[test]
    fn repeated_local_scope_ignored() {
        let mut builder = PdbBuilder::new().unwrap();
        assert!(builder
            .add_local_scope(Token::method_def(1), 1, 0, 12, &[])
            .unwrap());
        assert!(!builder
            .add_local_scope(Token::method_def(1), 1, 0, 12, &[])
            .unwrap());
        assert!(builder
            .add_local_scope(Token::method_def(1), 1, 0, 6, &[])
            .unwrap());

        let tables = builder.finish(1).unwrap();
        assert_eq!(tables.local_scopes.len(), 2);
    }

    #[test]
    fn state_machines_and_custom_debug_information_sorted() {
        let mut builder = PdbBuilder::new().unwrap();
        builder
            .add_state_machine_method(Token::method_def(9), Token::method_def(2))
            .unwrap();
        builder
            .add_state_machine_method(Token::method_def(7), Token::method_def(1))
            .unwrap();
        assert!(builder
            .add_state_machine_method(Token::type_def(7), Token::method_def(1))
            .is_err());

        builder
            .add_custom_debug_information(
                CodedIndex::new(TableId::MethodDef, 9),
                CustomDebugKind::StateMachineHoistedLocalScopes,
                &[],
            )
            .unwrap();
        builder.add_document(&document("A.cs")).unwrap();
        builder
            .add_custom_debug_information(
                CodedIndex::new(TableId::MethodDef, 2),
                CustomDebugKind::AsyncMethodSteppingInformation,
                &[0, 0, 0, 0],
            )
            .unwrap();
        assert!(builder
            .add_custom_debug_information(
                CodedIndex::new(TableId::Field, 1),
                CustomDebugKind::SourceLink,
                &[],
            )
            .is_ok());
        assert!(builder
            .add_custom_debug_information(
                CodedIndex::new(TableId::LocalScope, 1),
                CustomDebugKind::SourceLink,
                &[],
            )
            .is_ok());

        let tables = builder.finish(9).unwrap();
        let pairs: Vec<(u32, u32)> = tables
            .state_machine_methods
            .iter()
            .map(|row| (row.move_next_method, row.kickoff_method))
            .collect();
        assert_eq!(pairs, [(7, 1), (9, 2)]);

        let keys: Vec<u32> = tables
            .custom_debug_information
            .iter()
            .map(|row| {
                row.parent
                    .encode(CodedIndexType::HasCustomDebugInformation)
                    .unwrap()
            })
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(tables.custom_debug_information[0].parent.row, 1);
        assert_eq!(tables.custom_debug_information[0].parent.tag, TableId::Field);
    }

    #[test]
    fn verify_rejects_unsorted() {
        let mut tables = PdbTables::default();
        for (rid, method) in [(1, 2), (2, 1)] {
            tables.state_machine_methods.push(StateMachineMethodRaw {
                rid,
                token: Token::from_parts(TableId::StateMachineMethod, rid),
                offset: 0,
                move_next_method: method,
                kickoff_method: 1,
            });
        }
        assert!(matches!(
            verify_sorted(&tables),
            Err(Error::Malformed { .. })
        ));

        tables.state_machine_methods.reverse();
        assert!(verify_sorted(&tables).is_ok());

        for (rid, length) in [(1, 4), (2, 8)] {
            tables.local_scopes.push(LocalScopeRaw {
                rid,
                token: Token::from_parts(TableId::LocalScope, rid),
                offset: 0,
                method: 1,
                import_scope: 1,
                variable_list: 1,
                constant_list: 1,
                start_offset: 0,
                length,
            });
        }
        assert!(verify_sorted(&tables).is_err());
    }
}
