//! The view of an assembly that PDB generation works from.
//!
//! [`ModuleInfo`] is an owned snapshot of what the generator has to know about a compiled
//! module: every `MethodDef` row with its IL code size and local signature, every `TypeDef` row
//! with its name and nesting, the row counts of all type-system tables, the entry point and the
//! debug directory. It is loaded once from a PE image and then shared read-only across the
//! worker threads.
//!
//! Embedders that already have this information (or tests) build one with
//! [`ModuleInfoBuilder`] instead.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotpdb::metadata::module::ModuleInfo;
//! use std::path::Path;
//!
//! let module = ModuleInfo::from_file(Path::new("Program.dll"))?;
//! for ty in module.top_level_types() {
//!     println!("{}.{} - {} methods", ty.namespace, ty.name, ty.methods.len());
//! }
//! # Ok::<(), dotpdb::Error>(())
//! ```

use std::path::Path;

use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    file::{CodeViewInfo, DebugDirectoryEntry, File},
    metadata::{
        cor20header::Cor20Header,
        method::MethodBody,
        root::Root,
        streams::{Strings, TablesHeader},
        tables::{MethodDefRaw, ModuleRaw, NestedClassRaw, TableId, TypeDefRaw, TABLE_SLOTS},
        token::Token,
    },
    Result,
};

/// IL body facts of one method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodBodyInfo {
    /// Size of the IL code in bytes, header excluded
    pub code_size: u32,
    /// `StandAloneSig` row of the locals signature, 0 when the method has no locals
    pub local_signature_row: u32,
}

/// One `MethodDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// The `MethodDef` token
    pub token: Token,
    /// Method name
    pub name: String,
    /// The `TypeDef` declaring this method
    pub declaring_type: Token,
    /// The IL body, `None` for abstract, runtime or P/Invoke methods and for bodies that could
    /// not be located
    pub body: Option<MethodBodyInfo>,
}

/// One `TypeDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// The `TypeDef` token
    pub token: Token,
    /// Namespace, empty for the global namespace and for nested types
    pub namespace: String,
    /// Type name, including any generic arity suffix
    pub name: String,
    /// The enclosing type if this type is nested
    pub enclosing: Option<Token>,
    /// Methods declared by this type
    pub methods: Vec<Token>,
}

impl TypeInfo {
    /// True if this type is declared inside another type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// `Namespace.Name`, or just `Name` in the global namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// Owned description of a compiled module
#[derive(Debug, Clone, Default)]
pub struct ModuleInfo {
    name: String,
    methods: Vec<MethodInfo>,
    types: Vec<TypeInfo>,
    row_counts: Vec<u32>,
    entry_point: Token,
    debug_directory: Vec<DebugDirectoryEntry>,
    codeview: Option<CodeViewInfo>,
}

impl ModuleInfo {
    /// Load a module from a PE file on disk
    ///
    /// # Errors
    /// Returns an error if the file is not a .NET PE image or its metadata is malformed.
    pub fn from_file(path: &Path) -> Result<ModuleInfo> {
        let file = File::from_file(path)?;
        Self::from_pe(&file)
    }

    /// Load a module from a PE image held in memory
    ///
    /// # Errors
    /// Returns an error if the data is not a .NET PE image or its metadata is malformed.
    pub fn from_mem(data: Vec<u8>) -> Result<ModuleInfo> {
        let file = File::from_mem(data)?;
        Self::from_pe(&file)
    }

    /// Read everything PDB generation needs out of a loaded PE image
    ///
    /// # Errors
    /// Returns an error if the CLI header, the metadata root, the tables stream or the strings
    /// heap cannot be read.
    pub fn from_pe(file: &File) -> Result<ModuleInfo> {
        let (clr_rva, clr_size) = file.clr()?;
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20_header = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

        let metadata_offset = file.rva_to_offset(cor20_header.meta_data_rva as usize)?;
        let metadata = file.data_slice(metadata_offset, cor20_header.meta_data_size as usize)?;
        let root = Root::read(metadata)?;

        let mut tables = None;
        let mut strings = None;
        for stream in &root.stream_headers {
            let start = stream.offset as usize;
            let Some(end) = start.checked_add(stream.size as usize) else {
                return Err(crate::Error::OutOfBounds);
            };
            if end > metadata.len() {
                return Err(crate::Error::OutOfBounds);
            }

            let stream_data = &metadata[start..end];
            match stream.name.as_str() {
                "#~" | "#-" => tables = Some(TablesHeader::from(stream_data)?),
                "#Strings" => strings = Some(Strings::from(stream_data)?),
                _ => {}
            }
        }

        let Some(tables) = tables else {
            return Err(malformed_error!("Metadata has no tables stream"));
        };
        let Some(strings) = strings else {
            return Err(malformed_error!("Metadata has no #Strings heap"));
        };

        let mut row_counts = vec![0u32; TABLE_SLOTS];
        for table_id in tables.present_tables() {
            row_counts[table_id as usize] = tables.table_row_count(table_id);
        }

        let name = match tables.table::<ModuleRaw>(TableId::Module) {
            Some(table) => match table.get(1) {
                Some(module) => strings.get(module.name as usize)?.to_string(),
                None => String::new(),
            },
            None => String::new(),
        };

        let type_rows: Vec<TypeDefRaw> = match tables.table::<TypeDefRaw>(TableId::TypeDef) {
            Some(table) => table.iter().collect(),
            None => Vec::new(),
        };
        let method_rows: Vec<MethodDefRaw> = match tables.table::<MethodDefRaw>(TableId::MethodDef)
        {
            Some(table) => table.iter().collect(),
            None => Vec::new(),
        };
        let mut enclosing_of = FxHashMap::default();
        if let Some(table) = tables.table::<NestedClassRaw>(TableId::NestedClass) {
            for row in table.iter() {
                enclosing_of.insert(row.nested_class, row.enclosing_class);
            }
        }

        let mut types = Vec::with_capacity(type_rows.len());
        let mut declaring = vec![Token::new(0); method_rows.len()];
        for (index, row) in type_rows.iter().enumerate() {
            // A type owns its method_list up to the next type's method_list
            let method_end = type_rows
                .get(index + 1)
                .map_or(method_rows.len() as u32 + 1, |next| next.method_list)
                .min(method_rows.len() as u32 + 1);
            let methods: Vec<Token> = (row.method_list..method_end)
                .filter(|rid| *rid != 0)
                .map(Token::method_def)
                .collect();
            for method in &methods {
                declaring[method.row() as usize - 1] = row.token;
            }

            types.push(TypeInfo {
                token: row.token,
                namespace: strings.get(row.type_namespace as usize)?.to_string(),
                name: strings.get(row.type_name as usize)?.to_string(),
                enclosing: enclosing_of.get(&row.rid).map(|outer| Token::type_def(*outer)),
                methods,
            });
        }

        let mut methods = Vec::with_capacity(method_rows.len());
        for (row, declaring_type) in method_rows.iter().zip(declaring) {
            let body = if row.rva == 0 {
                None
            } else {
                match Self::read_body(file, row.rva) {
                    Ok(body) => Some(body),
                    Err(error) => {
                        debug!("Method body of {} not readable - {}", row.token, error);
                        None
                    }
                }
            };

            methods.push(MethodInfo {
                token: row.token,
                name: strings.get(row.name as usize)?.to_string(),
                declaring_type,
                body,
            });
        }

        let debug_directory = file.debug_directory()?;
        let codeview = file.codeview()?;

        debug!(
            "Loaded module '{}' - {} types, {} methods, {} debug entries",
            name,
            types.len(),
            methods.len(),
            debug_directory.len()
        );

        Ok(ModuleInfo {
            name,
            methods,
            types,
            row_counts,
            entry_point: cor20_header.entry_point().unwrap_or_default(),
            debug_directory,
            codeview,
        })
    }

    fn read_body(file: &File, rva: u32) -> Result<MethodBodyInfo> {
        let offset = file.rva_to_offset(rva as usize)?;
        let available = file.len().saturating_sub(offset);
        let body = MethodBody::from(file.data_slice(offset, available)?)?;

        let Ok(code_size) = u32::try_from(body.size_code) else {
            return Err(malformed_error!("Method body too large - {}", body.size_code));
        };

        Ok(MethodBodyInfo {
            code_size,
            local_signature_row: body.local_signature_row(),
        })
    }

    /// The module name from the `Module` table
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All `MethodDef` rows in row order
    #[must_use]
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// All `TypeDef` rows in row order
    #[must_use]
    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    /// Types not nested in another type, in row order
    pub fn top_level_types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter().filter(|ty| !ty.is_nested())
    }

    /// Number of `MethodDef` rows
    #[must_use]
    pub fn method_count(&self) -> u32 {
        self.row_count(TableId::MethodDef)
    }

    /// Look up a method by its `MethodDef` token
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodInfo> {
        if !token.is_table(TableId::MethodDef) {
            return None;
        }
        self.methods.get((token.row() as usize).checked_sub(1)?)
    }

    /// Look up a type by its `TypeDef` token
    #[must_use]
    pub fn type_def(&self, token: Token) -> Option<&TypeInfo> {
        if !token.is_table(TableId::TypeDef) {
            return None;
        }
        self.types.get((token.row() as usize).checked_sub(1)?)
    }

    /// Row count of a type-system table
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.row_counts.get(table as usize).copied().unwrap_or(0)
    }

    /// Row counts of all tables, indexed by table id
    #[must_use]
    pub fn row_counts(&self) -> [u32; TABLE_SLOTS] {
        let mut counts = [0u32; TABLE_SLOTS];
        for (slot, count) in self.row_counts.iter().enumerate().take(TABLE_SLOTS) {
            counts[slot] = *count;
        }
        counts
    }

    /// The managed entry point, nil for libraries and native entry points
    #[must_use]
    pub fn entry_point(&self) -> Token {
        self.entry_point
    }

    /// All entries of the debug directory
    #[must_use]
    pub fn debug_directory(&self) -> &[DebugDirectoryEntry] {
        &self.debug_directory
    }

    /// The first CodeView entry with an `RSDS` payload
    #[must_use]
    pub fn codeview(&self) -> Option<&CodeViewInfo> {
        self.codeview.as_ref()
    }
}

/// Builds a [`ModuleInfo`] without a PE image.
///
/// Types receive `TypeDef` rows in the order they are added, starting with the implicit
/// `<Module>` type at row 1. Methods receive `MethodDef` rows in the order they are added.
///
/// ```rust
/// use dotpdb::metadata::module::ModuleInfoBuilder;
///
/// let mut builder = ModuleInfoBuilder::new("App.dll");
/// let program = builder.add_type("App", "Program");
/// let main = builder.add_method(program, "Main", Some((12, 0)));
/// let module = builder.build();
///
/// assert_eq!(module.method(main).unwrap().body.unwrap().code_size, 12);
/// assert_eq!(module.top_level_types().count(), 2);
/// ```
pub struct ModuleInfoBuilder {
    module: ModuleInfo,
}

impl ModuleInfoBuilder {
    /// Create a builder for a module with the given name
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut builder = ModuleInfoBuilder {
            module: ModuleInfo {
                name: name.to_string(),
                row_counts: vec![0; TABLE_SLOTS],
                ..ModuleInfo::default()
            },
        };
        builder.module.row_counts[TableId::Module as usize] = 1;
        builder.push_type("", "<Module>", None);
        builder
    }

    fn push_type(&mut self, namespace: &str, name: &str, enclosing: Option<Token>) -> Token {
        let token = Token::type_def(self.module.types.len() as u32 + 1);
        self.module.types.push(TypeInfo {
            token,
            namespace: namespace.to_string(),
            name: name.to_string(),
            enclosing,
            methods: Vec::new(),
        });
        self.module.row_counts[TableId::TypeDef as usize] = self.module.types.len() as u32;
        token
    }

    /// Add a top-level type, returning its `TypeDef` token
    pub fn add_type(&mut self, namespace: &str, name: &str) -> Token {
        self.push_type(namespace, name, None)
    }

    /// Add a type nested in `enclosing`, returning its `TypeDef` token
    pub fn add_nested_type(&mut self, enclosing: Token, name: &str) -> Token {
        let token = self.push_type("", name, Some(enclosing));
        self.module.row_counts[TableId::NestedClass as usize] += 1;
        token
    }

    /// Add a method to `declaring_type`, returning its `MethodDef` token
    ///
    /// ## Arguments
    /// * 'declaring_type' - A token returned by [`Self::add_type`] or [`Self::add_nested_type`]
    /// * 'name'           - Method name
    /// * 'body'           - `(code_size, local_signature_row)` or `None` for a method without IL
    pub fn add_method(
        &mut self,
        declaring_type: Token,
        name: &str,
        body: Option<(u32, u32)>,
    ) -> Token {
        let token = Token::method_def(self.module.methods.len() as u32 + 1);
        self.module.methods.push(MethodInfo {
            token,
            name: name.to_string(),
            declaring_type,
            body: body.map(|(code_size, local_signature_row)| MethodBodyInfo {
                code_size,
                local_signature_row,
            }),
        });
        if let Some(ty) = self
            .module
            .types
            .get_mut((declaring_type.row() as usize).wrapping_sub(1))
        {
            ty.methods.push(token);
        }
        self.module.row_counts[TableId::MethodDef as usize] = self.module.methods.len() as u32;
        token
    }

    /// Override the row count of a type-system table
    pub fn row_count(&mut self, table: TableId, rows: u32) -> &mut Self {
        self.module.row_counts[table as usize] = rows;
        self
    }

    /// Set the managed entry point
    pub fn entry_point(&mut self, token: Token) -> &mut Self {
        self.module.entry_point = token;
        self
    }

    /// Attach a CodeView entry, which also adds the matching debug directory entry
    pub fn codeview(&mut self, codeview: CodeViewInfo) -> &mut Self {
        self.module.debug_directory.push(DebugDirectoryEntry {
            characteristics: 0,
            time_date_stamp: codeview.time_date_stamp,
            major_version: 0,
            minor_version: 0,
            debug_type: crate::file::IMAGE_DEBUG_TYPE_CODEVIEW,
            size_of_data: 24 + codeview.path.len() as u32 + 1,
            address_of_raw_data: 0,
            pointer_to_raw_data: 0,
        });
        self.module.codeview = Some(codeview);
        self
    }

    /// Finish the module
    #[must_use]
    pub fn build(self) -> ModuleInfo {
        self.module
    }
}
