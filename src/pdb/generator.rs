//! The generation pipeline, from a module and a decompiler to a finished container.
//!
//! [`PdbGenerator::generate`] runs in three phases:
//!
//! 1. **Grouping**: the top-level types of the module that can have source are grouped by the
//!    virtual path of their source file, in first-seen order ([`PdbGenerator::source_files`]).
//! 2. **Per-file work**: every group is decompiled, its syntax tree walked for scopes, its
//!    sequence points encoded and its source hashed and compressed. This phase has no shared
//!    state and runs on the rayon thread pool unless disabled.
//! 3. **Merge and serialization**: the per-file results are merged into a [`PdbBuilder`] in file
//!    order, the tables are sorted and checked, and the container is serialized with its id.
//!
//! Problems that only cost part of the debug information (a method that cannot be found, a
//! failing file, a duplicate submission) are recorded as [`Diagnostic`]s in the
//! [`GenerationReport`] instead of failing the run.

use std::{
    io::Write,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use log::{debug, error, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    decompiler::{Decompiler, SequencePointTable},
    metadata::{
        customdebuginformation::CustomDebugKind,
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
        module::{ModuleInfo, TypeInfo},
        sequencepoints::{encode_sequence_points, SequencePoint},
        tables::{CodedIndex, TableId},
        token::Token,
    },
    pdb::{
        builder::{PdbBuilder, GLOBAL_IMPORT_SCOPE},
        contentid::ContentId,
        document::{virtual_path, SourceDocument},
        scopes::{collect_scopes, FileScopes},
        serializer::{patch_content_id, serialize},
        statemachine::StateMachineRecords,
    },
    Error, Result,
};

/// Attribute types the compiler injects into assemblies; they never have user source
const COMPILER_INJECTED_ATTRIBUTES: [&str; 9] = [
    "System.Runtime.CompilerServices.IsReadOnlyAttribute",
    "System.Runtime.CompilerServices.IsByRefLikeAttribute",
    "System.Runtime.CompilerServices.IsUnmanagedAttribute",
    "System.Runtime.CompilerServices.NullableAttribute",
    "System.Runtime.CompilerServices.NullableContextAttribute",
    "System.Runtime.CompilerServices.NativeIntegerAttribute",
    "System.Runtime.CompilerServices.RefSafetyRulesAttribute",
    "System.Runtime.CompilerServices.ScopedRefAttribute",
    "Microsoft.CodeAnalysis.EmbeddedAttribute",
];

/// Settings of a generation run
///
/// # Examples
///
/// ```rust
/// use dotpdb::pdb::GeneratorOptions;
///
/// let options = GeneratorOptions::default()
///     .with_nested_directories(false)
///     .with_threads(4)
///     .with_banner("Decompiled by dotpdb");
/// assert!(options.parallel);
/// assert_eq!(options.threads, Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// One directory per namespace segment in document paths (default: true)
    pub nested_directories: bool,
    /// Process files on the rayon thread pool (default: true)
    pub parallel: bool,
    /// Size of a dedicated thread pool; `None` uses the global pool
    pub threads: Option<usize>,
    /// Fail with [`Error::MissingCodeView`] instead of minting an id (default: false)
    pub require_codeview: bool,
    /// Use this id instead of the CodeView one or a minted one
    pub content_id: Option<ContentId>,
    /// Comment line prepended to every embedded source
    pub banner: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            nested_directories: true,
            parallel: true,
            threads: None,
            require_codeview: false,
            content_id: None,
            banner: None,
        }
    }
}

impl GeneratorOptions {
    /// Map namespace segments to nested directories
    #[must_use]
    pub fn with_nested_directories(mut self, nested: bool) -> Self {
        self.nested_directories = nested;
        self
    }

    /// Enable or disable parallel processing
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Process files on a dedicated pool of `threads` threads
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Refuse assemblies without a CodeView entry
    #[must_use]
    pub fn with_require_codeview(mut self, require: bool) -> Self {
        self.require_codeview = require;
        self
    }

    /// Force the PDB id
    #[must_use]
    pub fn with_content_id(mut self, id: ContentId) -> Self {
        self.content_id = Some(id);
        self
    }

    /// Prepend `// banner` to every embedded source, one comment line per banner line
    #[must_use]
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }
}

/// Receives progress of a generation run
///
/// Called from worker threads, once per source file, in completion order.
pub trait ProgressObserver: Send + Sync {
    /// A file has been processed
    ///
    /// ## Arguments
    /// * 'completed' - Number of files done so far, this one included
    /// * 'total'     - Number of files of the run
    /// * 'path'      - Virtual path of the file
    fn file_completed(&self, completed: usize, total: usize, path: &str);

    /// Polled before each file; returning true stops the run
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Top-level types sharing one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Virtual path of the file
    pub path: String,
    /// `TypeDef` tokens, in row order
    pub types: Vec<Token>,
}

/// Where the id of a container came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentIdSource {
    /// The assembly's CodeView entry
    CodeView,
    /// [`GeneratorOptions::content_id`]
    Explicit,
    /// Hash of the container
    Minted,
}

/// Summary of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// The PDB id
    pub content_id: ContentId,
    /// Where the id came from
    pub content_id_source: ContentIdSource,
    /// Number of source files considered
    pub source_files: usize,
    /// Number of `Document` rows
    pub documents: usize,
    /// Number of methods with a sequence point blob
    pub methods_with_sequence_points: usize,
    /// Number of `MethodDebugInformation` rows
    pub method_debug_rows: usize,
    /// Number of `LocalScope` rows
    pub local_scopes: usize,
    /// Number of `ImportScope` rows
    pub import_scopes: usize,
    /// Number of `StateMachineMethod` rows
    pub state_machine_methods: usize,
    /// Number of `CustomDebugInformation` rows
    pub custom_debug_information: usize,
    /// Size of the container in bytes
    pub size: usize,
    /// Everything that went wrong along the way
    pub diagnostics: Vec<Diagnostic>,
}

/// A serialized Portable PDB and its report
#[derive(Debug, Clone)]
pub struct GeneratedPdb {
    /// The container
    pub data: Vec<u8>,
    /// What was generated
    pub report: GenerationReport,
}

impl GeneratedPdb {
    /// Write the container to a stream
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the container to `path`
    ///
    /// The data goes to a temporary file next to `path` first, which is renamed over `path`
    /// once complete. A failed write leaves any existing file untouched.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the temporary file cannot be written or renamed.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(directory)?;
        temp.write_all(&self.data)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::FileError(e.error))?;

        debug!("Wrote {} bytes to {}", self.data.len(), path.display());
        Ok(())
    }
}

struct MethodEntry {
    method: Token,
    sequence_points: Option<Vec<u8>>,
    records: StateMachineRecords,
}

struct FileResult {
    document: SourceDocument,
    scopes: FileScopes,
    methods: Vec<MethodEntry>,
}

struct FileOutcome {
    path: String,
    result: Option<FileResult>,
    diagnostics: Vec<Diagnostic>,
}

impl FileOutcome {
    fn new(path: &str) -> Self {
        FileOutcome {
            path: path.to_string(),
            result: None,
            diagnostics: Vec::new(),
        }
    }

    fn report(
        &mut self,
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
        token: Option<Token>,
    ) {
        let mut diagnostic = Diagnostic::new(severity, category, message).with_file(&self.path);
        if let Some(token) = token {
            diagnostic = diagnostic.with_token(token);
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Generates a Portable PDB for a module from decompiled source
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use dotpdb::decompiler::JsonDecompiler;
/// use dotpdb::metadata::module::ModuleInfo;
/// use dotpdb::pdb::{GeneratorOptions, PdbGenerator};
///
/// let module = ModuleInfo::from_file(Path::new("App.dll"))?;
/// let decompiler = JsonDecompiler::from_file(Path::new("App.decompiled.json"))?;
///
/// let pdb = PdbGenerator::new(&module, &decompiler)
///     .with_options(GeneratorOptions::default().with_parallel(false))
///     .generate()?;
/// pdb.write_file(Path::new("App.pdb"))?;
/// println!("{} documents", pdb.report.documents);
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub struct PdbGenerator<'a> {
    module: &'a ModuleInfo,
    decompiler: &'a dyn Decompiler,
    options: GeneratorOptions,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a> PdbGenerator<'a> {
    /// Create a generator with default options
    #[must_use]
    pub fn new(module: &'a ModuleInfo, decompiler: &'a dyn Decompiler) -> Self {
        PdbGenerator {
            module,
            decompiler,
            options: GeneratorOptions::default(),
            observer: None,
        }
    }

    /// Replace the options
    #[must_use]
    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Report progress to `observer`
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The options in use
    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    fn include_type(&self, ty: &TypeInfo) -> bool {
        if ty.is_nested() || ty.name == "<Module>" {
            return false;
        }
        if ty.namespace == "XamlGeneratedNamespace" && ty.name == "GeneratedInternalTypeHelper" {
            return false;
        }
        if COMPILER_INJECTED_ATTRIBUTES.contains(&ty.full_name().as_str()) {
            return false;
        }
        !self.decompiler.is_hidden(self.module, ty.token)
    }

    /// Group the module's top-level types into source files
    ///
    /// Types whose names map to the same virtual path share a file. Files keep the order in
    /// which their first type appears.
    #[must_use]
    pub fn source_files(&self) -> Vec<SourceFile> {
        let mut files: Vec<SourceFile> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for ty in self.module.top_level_types() {
            if !self.include_type(ty) {
                continue;
            }

            let path = virtual_path(&ty.namespace, &ty.name, self.options.nested_directories);
            match index.get(&path) {
                Some(slot) => files[*slot].types.push(ty.token),
                None => {
                    index.insert(path.clone(), files.len());
                    files.push(SourceFile {
                        path,
                        types: vec![ty.token],
                    });
                }
            }
        }

        files
    }

    fn resolve_content_id(&self) -> Result<Option<(ContentId, ContentIdSource)>> {
        if let Some(id) = self.options.content_id {
            return Ok(Some((id, ContentIdSource::Explicit)));
        }
        if let Some(codeview) = self.module.codeview() {
            return Ok(Some((
                ContentId::from_codeview(codeview),
                ContentIdSource::CodeView,
            )));
        }
        if self.options.require_codeview {
            return Err(Error::MissingCodeView(self.module.name().to_string()));
        }
        Ok(None)
    }

    /// Run the whole pipeline
    ///
    /// # Errors
    /// Returns [`Error::MissingCodeView`] when a CodeView entry is required but absent, an error
    /// if the run was cancelled or the dedicated thread pool cannot be created, and a malformed
    /// error if the collected records cannot form a consistent container.
    pub fn generate(&self) -> Result<GeneratedPdb> {
        let content_id = self.resolve_content_id()?;
        let diagnostics = Diagnostics::new();
        if content_id.is_none() {
            warn!(
                "{} has no CodeView debug directory entry, minting a PDB id from the content",
                self.module.name()
            );
            diagnostics.warning(
                DiagnosticCategory::ContentId,
                format!(
                    "{} has no CodeView entry; the PDB id is derived from its content",
                    self.module.name()
                ),
            );
        }

        let files = self.source_files();
        debug!(
            "Generating PDB for {} from {} source files",
            self.module.name(),
            files.len()
        );

        let outcomes = self.process_files(&files)?;

        let mut builder = PdbBuilder::new()?;
        for outcome in outcomes {
            merge_file(&mut builder, outcome, &diagnostics)?;
        }
        let tables = builder.finish(self.module.method_count())?;

        let row_counts = self.module.row_counts();
        let entry_point = self.module.entry_point();
        let (data, id, source) = match content_id {
            Some((id, source)) => (serialize(&tables, id, entry_point, &row_counts)?, id, source),
            None => {
                let mut data =
                    serialize(&tables, ContentId::default(), entry_point, &row_counts)?;
                let id = ContentId::from_content(&data);
                patch_content_id(&mut data, id)?;
                (data, id, ContentIdSource::Minted)
            }
        };

        let report = GenerationReport {
            content_id: id,
            content_id_source: source,
            source_files: files.len(),
            documents: tables.documents.len(),
            methods_with_sequence_points: tables.methods_with_sequence_points(),
            method_debug_rows: tables.method_debug_information.len(),
            local_scopes: tables.local_scopes.len(),
            import_scopes: tables.import_scopes.len(),
            state_machine_methods: tables.state_machine_methods.len(),
            custom_debug_information: tables.custom_debug_information.len(),
            size: data.len(),
            diagnostics: diagnostics.to_vec(),
        };

        info!(
            "Generated PDB {} for {}: {} documents, {} methods with sequence points, {} diagnostics",
            report.content_id,
            self.module.name(),
            report.documents,
            report.methods_with_sequence_points,
            report.diagnostics.len()
        );

        Ok(GeneratedPdb { data, report })
    }

    fn process_files(&self, files: &[SourceFile]) -> Result<Vec<FileOutcome>> {
        let completed = AtomicUsize::new(0);
        let total = files.len();

        let run = |file: &SourceFile| -> Option<FileOutcome> {
            if self.observer.is_some_and(|observer| observer.is_cancelled()) {
                return None;
            }

            let outcome = self.process_file(file);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(observer) = self.observer {
                observer.file_completed(done, total, &file.path);
            }
            Some(outcome)
        };

        let outcomes: Vec<Option<FileOutcome>> = if !self.options.parallel {
            files.iter().map(run).collect()
        } else if let Some(threads) = self.options.threads {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::Error(format!("Failed to create thread pool - {e}")))?;
            pool.install(|| files.par_iter().map(run).collect())
        } else {
            files.par_iter().map(run).collect()
        };

        outcomes
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::Error("Generation cancelled".to_string()))
    }

    fn process_file(&self, file: &SourceFile) -> FileOutcome {
        let mut outcome = FileOutcome::new(&file.path);

        let decompiled = match self.decompiler.decompile_types(self.module, &file.types) {
            Ok(decompiled) => decompiled,
            Err(e) => {
                warn!("Failed to decompile {} - {}", file.path, e);
                outcome.report(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Decompiler,
                    format!("Decompilation failed - {e}"),
                    file.types.first().copied(),
                );
                return outcome;
            }
        };

        if decompiled.is_empty() {
            debug!("{} produced no syntax, no document emitted", file.path);
            return outcome;
        }
        if let SequencePointTable::Omitted(reason) = &decompiled.sequence_points {
            debug!("{} has no sequence points ({}), no document emitted", file.path, reason);
            return outcome;
        }

        let scopes = match collect_scopes(&decompiled, self.module) {
            Ok(scopes) => scopes,
            Err(e) => {
                outcome.report(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::General,
                    format!("Scope collection failed - {e}"),
                    None,
                );
                return outcome;
            }
        };

        let (source, line_shift) = match &self.options.banner {
            Some(banner) => {
                let (header, lines) = banner_header(banner);
                (header + &decompiled.source, lines)
            }
            None => (decompiled.source.clone(), 0),
        };
        let document = match SourceDocument::new(&file.path, &source) {
            Ok(document) => document,
            Err(e) => {
                outcome.report(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::General,
                    format!("Source could not be embedded - {e}"),
                    None,
                );
                return outcome;
            }
        };

        let mut methods = Vec::with_capacity(scopes.functions.len());
        for id in &scopes.functions {
            let Some(function) = decompiled.function(*id) else {
                continue;
            };

            let method = function.body_method();
            let Some(info) = self.module.method(method) else {
                outcome.report(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::MethodBody,
                    "Method is not defined in the module",
                    Some(method),
                );
                continue;
            };
            if self.module.method(function.method).is_none() {
                outcome.report(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::MethodBody,
                    "Kickoff method is not defined in the module",
                    Some(function.method),
                );
                continue;
            }

            let points = decompiled.sequence_points.get(*id).unwrap_or_default();
            let sequence_points = match (points.is_empty(), info.body) {
                (true, _) => None,
                (false, None) => {
                    outcome.report(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::MethodBody,
                        "Sequence points for a method without IL body dropped",
                        Some(method),
                    );
                    None
                }
                (false, Some(body)) => {
                    let (shifted, degenerate) = prepare_points(points, line_shift);
                    if degenerate > 0 {
                        outcome.report(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::SequencePoints,
                            format!("{degenerate} sequence points with an empty span marked hidden"),
                            Some(method),
                        );
                    }
                    match encode_sequence_points(body.local_signature_row, &shifted) {
                        Ok(blob) => blob,
                        Err(e) => {
                            outcome.report(
                                DiagnosticSeverity::Warning,
                                DiagnosticCategory::SequencePoints,
                                format!("Sequence points dropped - {e}"),
                                Some(method),
                            );
                            None
                        }
                    }
                }
            };

            let records = match StateMachineRecords::from_function(function, self.module) {
                Ok(records) => records,
                Err(e) => {
                    outcome.report(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::General,
                        format!("State machine information dropped - {e}"),
                        Some(method),
                    );
                    StateMachineRecords::default()
                }
            };

            methods.push(MethodEntry {
                method,
                sequence_points,
                records,
            });
        }

        debug!(
            "Processed {}: {} functions, {} local scopes",
            file.path,
            methods.len(),
            scopes.local_scopes.len()
        );

        outcome.result = Some(FileResult {
            document,
            scopes,
            methods,
        });
        outcome
    }
}

/// The comment block a banner becomes and the number of lines it takes
fn banner_header(banner: &str) -> (String, u32) {
    let mut header = String::with_capacity(banner.len() + 4);
    let mut lines = 0u32;
    for line in banner.split('\n') {
        header.push_str("// ");
        header.push_str(line.trim_end_matches('\r'));
        header.push('\n');
        lines = lines.saturating_add(1);
    }
    (header, lines)
}

/// Shift visible points below the banner and turn empty or reversed spans into hidden points,
/// which is how such a span reads back. Returns the points and the number of spans changed.
fn prepare_points(points: &[SequencePoint], shift: u32) -> (Vec<SequencePoint>, usize) {
    let mut degenerate = 0;
    let prepared = points
        .iter()
        .map(|point| {
            if point.is_hidden {
                return *point;
            }
            let empty = point.end_line < point.start_line
                || (point.end_line == point.start_line && point.end_column <= point.start_column);
            if empty {
                degenerate += 1;
                return SequencePoint::hidden(point.il_offset);
            }

            let mut point = *point;
            point.start_line = point.start_line.saturating_add(shift);
            point.end_line = point.end_line.saturating_add(shift);
            point
        })
        .collect();
    (prepared, degenerate)
}

fn merge_file(
    builder: &mut PdbBuilder,
    outcome: FileOutcome,
    diagnostics: &Diagnostics,
) -> Result<()> {
    let FileOutcome {
        path,
        result,
        diagnostics: file_diagnostics,
    } = outcome;
    for diagnostic in file_diagnostics {
        diagnostics.push(diagnostic);
    }
    let Some(result) = result else {
        return Ok(());
    };

    let document = builder.add_document(&result.document)?;

    let mut import_rows = Vec::with_capacity(result.scopes.import_scopes.len());
    for node in &result.scopes.import_scopes {
        let row = match node.parent {
            None if node.imports.is_empty() => GLOBAL_IMPORT_SCOPE,
            None => builder.add_import_scope(GLOBAL_IMPORT_SCOPE, &node.imports)?,
            Some(parent) => {
                let parent_row = import_rows
                    .get(parent)
                    .copied()
                    .unwrap_or(GLOBAL_IMPORT_SCOPE);
                builder.add_import_scope(parent_row, &node.imports)?
            }
        };
        import_rows.push(row);
    }

    for scope in &result.scopes.local_scopes {
        let import_scope = import_rows
            .get(scope.import_scope)
            .copied()
            .unwrap_or(GLOBAL_IMPORT_SCOPE);
        if !builder.add_local_scope(
            scope.method,
            import_scope,
            scope.start_offset,
            scope.length,
            &[],
        )? {
            debug!(
                "Repeated local scope of {} at 0x{:x} skipped",
                scope.method, scope.start_offset
            );
        }
    }

    for entry in result.methods {
        if !builder.add_method_debug_information(
            entry.method,
            document,
            entry.sequence_points.as_deref(),
        )? {
            error!(
                "Duplicate sequence point definition detected: {} when processing {}",
                entry.method, path
            );
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::DuplicateMethod,
                    "Duplicate sequence point definition, the first one is kept",
                )
                .with_token(entry.method)
                .with_file(&path),
            );
            continue;
        }

        let records = entry.records;
        if let Some((move_next, kickoff)) = records.state_machine {
            builder.add_state_machine_method(move_next, kickoff)?;
            if let Some(hoisted) = &records.hoisted_scopes {
                builder.add_custom_debug_information(
                    CodedIndex::new(TableId::MethodDef, move_next.row()),
                    CustomDebugKind::StateMachineHoistedLocalScopes,
                    hoisted,
                )?;
            }
        }
        if let Some((method, stepping)) = &records.async_stepping {
            builder.add_custom_debug_information(
                CodedIndex::new(TableId::MethodDef, method.row()),
                CustomDebugKind::AsyncMethodSteppingInformation,
                stepping,
            )?;
        }
    }

    debug!("Merged {} as document {}", path, document);
    Ok(())
}
